//! Default configuration values.

/// Default listen/upstream port.
pub const DEFAULT_PORT: u16 = 4433;

/// Maximum bytes in one protocol message (request or response row).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 256;

/// Read deadline for the client request and each downstream reply, seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Downstream TCP connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// TLS handshake timeout in seconds (either role).
pub const DEFAULT_TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Default TCP listener backlog.
pub const DEFAULT_CONNECTION_BACKLOG: u32 = 1024;

/// Default graceful shutdown drain timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default minimum TLS version.
pub const DEFAULT_TLS_MIN_VERSION: &str = "tls12";
/// Default maximum TLS version.
pub const DEFAULT_TLS_MAX_VERSION: &str = "tls13";

// ============================================================================
// Serde default functions
// ============================================================================

/// Generate default value functions forwarding to the constants above.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                $const_name
            }
        )*
    };
}

/// Generate default value functions returning String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                $const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_port                 => DEFAULT_PORT: u16,
    default_max_message_bytes    => DEFAULT_MAX_MESSAGE_BYTES: usize,
    default_read_timeout_secs    => DEFAULT_READ_TIMEOUT_SECS: u64,
    default_connect_timeout_secs => DEFAULT_CONNECT_TIMEOUT_SECS: u64,
    default_connection_backlog   => DEFAULT_CONNECTION_BACKLOG: u32,
}

default_string_fns! {
    default_min_tls_version => DEFAULT_TLS_MIN_VERSION,
    default_max_tls_version => DEFAULT_TLS_MAX_VERSION,
}
