//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override server listen address, e.g. 0.0.0.0:4433
    #[arg(long)]
    pub listen: Option<String>,
    /// Override upstream host name or IP address
    #[arg(long)]
    pub upstream_host: Option<String>,
    /// Override upstream port
    #[arg(long)]
    pub upstream_port: Option<u16>,
    /// Override upstream TLS SNI
    #[arg(long)]
    pub upstream_sni: Option<String>,
    /// Override upstream CA certificate path
    #[arg(long)]
    pub upstream_ca: Option<String>,
    /// Skip upstream certificate verification (test setups only)
    #[arg(long)]
    pub upstream_skip_verify: Option<bool>,
    /// Override TLS cert path
    #[arg(long)]
    pub tls_cert: Option<String>,
    /// Override TLS key path
    #[arg(long)]
    pub tls_key: Option<String>,
    /// Override ALPN list (repeatable or comma-separated)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub alpn: Option<Vec<String>>,
    /// Minimum TLS version (tls12, tls13)
    #[arg(long)]
    pub tls_min_version: Option<String>,
    /// Maximum TLS version (tls12, tls13)
    #[arg(long)]
    pub tls_max_version: Option<String>,
    /// Override read deadline (seconds)
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,
    /// Override upstream connect timeout (seconds)
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,
    /// Override maximum request bytes
    #[arg(long)]
    pub max_request_bytes: Option<usize>,
    /// Override maximum concurrent connections (0 = unlimited)
    #[arg(long)]
    pub max_connections: Option<usize>,
    /// TCP listener backlog size
    #[arg(long)]
    pub connection_backlog: Option<u32>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.listen {
        config.server.listen = v.clone();
    }
    if let Some(v) = &overrides.upstream_host {
        config.upstream.host = v.clone();
    }
    if let Some(v) = overrides.upstream_port {
        config.upstream.port = v;
    }
    if let Some(v) = &overrides.upstream_sni {
        config.upstream.sni = Some(v.clone());
    }
    if let Some(v) = &overrides.upstream_ca {
        config.upstream.ca = Some(v.clone());
    }
    if let Some(v) = overrides.upstream_skip_verify {
        config.upstream.skip_verify = v;
    }
    if let Some(v) = &overrides.tls_cert {
        config.tls.cert = v.clone();
    }
    if let Some(v) = &overrides.tls_key {
        config.tls.key = v.clone();
    }
    if let Some(v) = &overrides.alpn {
        config.tls.alpn = v.clone();
    }
    if let Some(v) = &overrides.tls_min_version {
        config.tls.min_version = v.clone();
    }
    if let Some(v) = &overrides.tls_max_version {
        config.tls.max_version = v.clone();
    }
    if let Some(v) = overrides.read_timeout_secs {
        config.server.read_timeout_secs = v;
    }
    if let Some(v) = overrides.connect_timeout_secs {
        config.upstream.connect_timeout_secs = v;
    }
    if let Some(v) = overrides.max_request_bytes {
        config.server.max_request_bytes = v;
    }
    if let Some(v) = overrides.max_connections {
        config.server.max_connections = if v == 0 { None } else { Some(v) };
    }
    if let Some(v) = overrides.connection_backlog {
        config.server.connection_backlog = v;
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}
