//! Configuration validation logic.

use crate::Config;
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.listen.trim().is_empty() {
        return Err(ConfigError::Validation("server.listen is empty".into()));
    }
    if config.upstream.host.trim().is_empty() {
        return Err(ConfigError::Validation("upstream.host is empty".into()));
    }
    if config.upstream.port == 0 {
        return Err(ConfigError::Validation("upstream.port must be > 0".into()));
    }
    if config.tls.cert.trim().is_empty() {
        return Err(ConfigError::Validation("tls.cert is empty".into()));
    }
    if config.tls.key.trim().is_empty() {
        return Err(ConfigError::Validation("tls.key is empty".into()));
    }
    if config.server.read_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "server.read_timeout_secs must be > 0".into(),
        ));
    }
    if config.upstream.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "upstream.connect_timeout_secs must be > 0".into(),
        ));
    }
    if config.server.max_request_bytes == 0 {
        return Err(ConfigError::Validation(
            "server.max_request_bytes must be > 0".into(),
        ));
    }
    if config.server.connection_backlog == 0 {
        return Err(ConfigError::Validation(
            "server.connection_backlog must be > 0".into(),
        ));
    }
    // Validate TLS versions
    let valid_versions = ["tls12", "tls13"];
    if !valid_versions.contains(&config.tls.min_version.as_str()) {
        return Err(ConfigError::Validation(format!(
            "tls.min_version must be one of: {:?}",
            valid_versions
        )));
    }
    if !valid_versions.contains(&config.tls.max_version.as_str()) {
        return Err(ConfigError::Validation(format!(
            "tls.max_version must be one of: {:?}",
            valid_versions
        )));
    }
    // tls13 > tls12
    let min_ord = if config.tls.min_version == "tls13" { 1 } else { 0 };
    let max_ord = if config.tls.max_version == "tls13" { 1 } else { 0 };
    if min_ord > max_ord {
        return Err(ConfigError::Validation(
            "tls.min_version cannot be greater than tls.max_version".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LoggingConfig, ServerConfig, TlsConfig, UpstreamConfig};

    fn valid_config() -> Config {
        Config {
            server: ServerConfig {
                listen: "127.0.0.1:4433".into(),
                read_timeout_secs: 30,
                max_request_bytes: 256,
                max_connections: None,
                connection_backlog: 1024,
            },
            upstream: UpstreamConfig {
                host: "127.0.0.1".into(),
                port: 4433,
                sni: None,
                ca: None,
                skip_verify: false,
                connect_timeout_secs: 10,
            },
            tls: TlsConfig {
                cert: "cert.pem".into(),
                key: "key.pem".into(),
                alpn: vec![],
                min_version: "tls12".into(),
                max_version: "tls13".into(),
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        validate_config(&valid_config()).unwrap();
    }

    #[test]
    fn rejects_empty_upstream_host() {
        let mut cfg = valid_config();
        cfg.upstream.host = " ".into();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_zero_read_timeout() {
        let mut cfg = valid_config();
        cfg.server.read_timeout_secs = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_inverted_tls_versions() {
        let mut cfg = valid_config();
        cfg.tls.min_version = "tls13".into();
        cfg.tls.max_version = "tls12".into();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_unknown_tls_version() {
        let mut cfg = valid_config();
        cfg.tls.min_version = "tls11".into();
        assert!(validate_config(&cfg).is_err());
    }
}
