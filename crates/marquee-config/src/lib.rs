//! Configuration for the marquee relay.
//!
//! Supports TOML, YAML, and JSON(C) config files selected by extension,
//! a validation pass, and CLI overrides applied on top of the file.

mod cli;
pub mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::{Config, LoggingConfig, ServerConfig, TlsConfig, UpstreamConfig};
pub use validate::validate_config;
