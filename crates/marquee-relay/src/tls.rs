//! Server-side TLS configuration loading.

use marquee_config::TlsConfig;
use tokio_rustls::rustls;
use tracing::info;

use crate::error::RelayError;

/// Build the rustls server config for the client-facing listener.
pub fn load_tls_config(cfg: &TlsConfig) -> Result<rustls::ServerConfig, RelayError> {
    let certs = load_certs(&cfg.cert)?;
    let key = load_private_key(&cfg.key)?;

    // Static slices to avoid heap allocation
    let versions: &[&'static rustls::SupportedProtocolVersion] =
        match (cfg.min_version.as_str(), cfg.max_version.as_str()) {
            ("tls13", "tls13") => &[&rustls::version::TLS13],
            ("tls12", "tls12") => &[&rustls::version::TLS12],
            _ => &[&rustls::version::TLS12, &rustls::version::TLS13],
        };

    let mut config = rustls::ServerConfig::builder_with_protocol_versions(versions)
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    if !cfg.alpn.is_empty() {
        config.alpn_protocols = cfg.alpn.iter().map(|s| s.as_bytes().to_vec()).collect();
    }

    info!(
        min_version = %cfg.min_version,
        max_version = %cfg.max_version,
        alpn = ?cfg.alpn,
        "TLS configured"
    );

    Ok(config)
}

/// Load certificates from a PEM file.
pub(crate) fn load_certs(
    path: &str,
) -> Result<Vec<rustls::pki_types::CertificateDer<'static>>, RelayError> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader)
        .filter_map(|c| c.ok().map(|v| v.into_owned()))
        .collect();
    Ok(certs)
}

/// Load a private key from a PEM file.
fn load_private_key(path: &str) -> Result<rustls::pki_types::PrivateKeyDer<'static>, RelayError> {
    let mut reader = std::io::BufReader::new(std::fs::File::open(path)?);
    loop {
        match rustls_pemfile::read_one(&mut reader)? {
            Some(rustls_pemfile::Item::Pkcs8Key(key)) => {
                return Ok(rustls::pki_types::PrivateKeyDer::Pkcs8(key));
            }
            Some(rustls_pemfile::Item::Pkcs1Key(key)) => {
                return Ok(rustls::pki_types::PrivateKeyDer::Pkcs1(key));
            }
            Some(_) => continue,
            None => break,
        }
    }
    Err(RelayError::Config("no private key found".into()))
}
