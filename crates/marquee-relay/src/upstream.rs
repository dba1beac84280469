//! TLS session establishment to the downstream query engine.
//!
//! The relay opens a fresh downstream session per client connection, only
//! after the client's request has been read and decoded. [`Downstream`] is
//! the seam that lets the bridge run against an in-memory transport in
//! tests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use marquee_config::UpstreamConfig;
use marquee_config::defaults::DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::error::RelayError;

/// Something the bridge can open a query-engine session on.
pub trait Downstream {
    type Session: AsyncRead + AsyncWrite + Unpin + Send;

    /// Establish a fresh session to the query engine.
    fn connect(&self) -> impl Future<Output = Result<Self::Session, RelayError>> + Send;
}

/// Production downstream: TCP connect plus TLS handshake, both under
/// deadlines, with its own certificate verification independent of the
/// client-facing listener.
pub struct TlsDownstream {
    addr: String,
    connector: TlsConnector,
    sni: ServerName<'static>,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl TlsDownstream {
    pub fn from_config(cfg: &UpstreamConfig) -> Result<Self, RelayError> {
        let tls_config = build_tls_config(cfg)?;
        Ok(Self {
            addr: cfg.addr(),
            connector: TlsConnector::from(Arc::new(tls_config)),
            sni: resolve_sni(cfg)?,
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            handshake_timeout: Duration::from_secs(DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS),
        })
    }
}

impl Downstream for TlsDownstream {
    type Session = TlsStream<TcpStream>;

    async fn connect(&self) -> Result<Self::Session, RelayError> {
        debug!(upstream = %self.addr, "connecting to query engine");

        let tcp = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| RelayError::Connect {
                addr: self.addr.clone(),
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map_err(|source| RelayError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        tcp.set_nodelay(true)?;

        let tls = tokio::time::timeout(
            self.handshake_timeout,
            self.connector.connect(self.sni.clone(), tcp),
        )
        .await
        .map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::TimedOut, "TLS handshake timed out")
        })??;

        let conn = tls.get_ref().1;
        debug!(
            upstream = %self.addr,
            sni = ?self.sni,
            version = ?conn.protocol_version(),
            "query engine session established"
        );
        Ok(tls)
    }
}

/// Build the TLS client config for downstream sessions.
fn build_tls_config(cfg: &UpstreamConfig) -> Result<rustls::ClientConfig, RelayError> {
    let mut root_store = rustls::RootCertStore::empty();

    if let Some(ca_path) = &cfg.ca {
        let certs = crate::tls::load_certs(ca_path)?;
        if certs.is_empty() {
            return Err(RelayError::Config(format!(
                "no certificates found in {ca_path}"
            )));
        }
        for cert in certs {
            root_store
                .add(cert)
                .map_err(|e| RelayError::Config(format!("failed to add CA cert: {e}")))?;
        }
    } else {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    let config = if cfg.skip_verify {
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth()
    } else {
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    };

    Ok(config)
}

/// SNI hostname: configured override, or the upstream host itself.
fn resolve_sni(cfg: &UpstreamConfig) -> Result<ServerName<'static>, RelayError> {
    let host = cfg.sni.clone().unwrap_or_else(|| cfg.host.clone());
    ServerName::try_from(host)
        .map_err(|e| RelayError::Config(format!("invalid SNI hostname: {e}")))
}

/// Certificate verifier that accepts any certificate (for skip_verify mode).
#[derive(Debug)]
struct NoVerifier;

impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::CryptoProvider::get_default()
            .map(|provider| {
                provider
                    .signature_verification_algorithms
                    .supported_schemes()
            })
            .unwrap_or_default()
    }
}
