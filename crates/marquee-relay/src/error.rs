//! Relay error types.

use marquee_protocol::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    #[error("bad request: {0}")]
    Request(#[from] ParseError),

    #[error("upstream connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl RelayError {
    /// Stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Io(_) => "io",
            RelayError::Tls(_) => "tls",
            RelayError::Request(_) => "request",
            RelayError::Connect { .. } => "connect",
            RelayError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        let err = RelayError::Config("x".into());
        assert_eq!(err.kind(), "config");

        let err: RelayError = std::io::Error::new(std::io::ErrorKind::TimedOut, "t").into();
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn connect_error_carries_addr() {
        let err = RelayError::Connect {
            addr: "db:4433".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.to_string().contains("db:4433"));
    }
}
