//! Configuration type definitions for the relay, its upstream, TLS, and logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub tls: TlsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. "0.0.0.0:4433".
    pub listen: String,
    /// Deadline for the client request read and each downstream reply read.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Maximum bytes in one client request message.
    #[serde(default = "default_max_message_bytes")]
    pub max_request_bytes: usize,
    /// Maximum concurrent connections (None = unlimited).
    #[serde(default)]
    pub max_connections: Option<usize>,
    /// TCP listener backlog (pending connections queue size).
    #[serde(default = "default_connection_backlog")]
    pub connection_backlog: u32,
}

/// The downstream query engine this relay bridges to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// TLS SNI override. Defaults to `host`.
    #[serde(default)]
    pub sni: Option<String>,
    /// CA certificate path for verifying the downstream. If unset, the
    /// webpki root store is used.
    #[serde(default)]
    pub ca: Option<String>,
    /// Skip downstream certificate verification. Test setups only.
    #[serde(default)]
    pub skip_verify: bool,
    /// Downstream TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    /// host:port form used for connecting and logging.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Server certificate file path (PEM format).
    pub cert: String,
    /// Server private key file path (PEM format).
    pub key: String,
    /// ALPN protocols to advertise.
    #[serde(default)]
    pub alpn: Vec<String>,
    /// Minimum TLS version (tls12, tls13). Default: tls12
    #[serde(default = "default_min_tls_version")]
    pub min_version: String,
    /// Maximum TLS version (tls12, tls13). Default: tls13
    #[serde(default = "default_max_tls_version")]
    pub max_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"rustls": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[server]
listen = "127.0.0.1:4433"

[upstream]
host = "127.0.0.1"

[tls]
cert = "cert.pem"
key = "key.pem"
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.read_timeout_secs, 30);
        assert_eq!(cfg.server.max_request_bytes, 256);
        assert_eq!(cfg.server.connection_backlog, 1024);
        assert!(cfg.server.max_connections.is_none());
        assert_eq!(cfg.upstream.port, 4433);
        assert_eq!(cfg.upstream.addr(), "127.0.0.1:4433");
        assert!(!cfg.upstream.skip_verify);
        assert_eq!(cfg.tls.min_version, "tls12");
        assert_eq!(cfg.tls.max_version, "tls13");
        assert!(cfg.logging.level.is_none());
    }

    #[test]
    fn full_upstream_section() {
        let cfg: UpstreamConfig = toml::from_str(
            r#"
host = "showtimes.internal"
port = 5533
sni = "showtimes.example.com"
ca = "/etc/marquee/ca.pem"
skip_verify = false
connect_timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.addr(), "showtimes.internal:5533");
        assert_eq!(cfg.sni.as_deref(), Some("showtimes.example.com"));
        assert_eq!(cfg.ca.as_deref(), Some("/etc/marquee/ca.pem"));
        assert_eq!(cfg.connect_timeout_secs, 5);
    }
}
