//! Front-tier TLS relay for movie showtime lookups.
//!
//! Terminates TLS from clients, decodes one showtime search request per
//! connection, opens an independent TLS session to the downstream query
//! engine, forwards the translated query, and relays result rows back
//! until the engine's sentinel.

pub mod cli;

mod bridge;
mod error;
mod server;
mod tls;
mod upstream;

pub use bridge::{BridgeLimits, BridgeOutcome, run_bridge};
pub use cli::RelayArgs;
pub use error::RelayError;
pub use server::{DEFAULT_SHUTDOWN_TIMEOUT, run, run_with_shutdown};
pub use tokio_util::sync::CancellationToken;
pub use upstream::{Downstream, TlsDownstream};
