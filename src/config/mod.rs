//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks, all errors collected)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the relay and the HTTP server
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; request handlers never touch the environment
//! - All fields have defaults to allow minimal configs
//! - A missing upstream URL is not fatal at startup; the relay reports it per request

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiKey, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig,
    UpstreamConfig,
};
pub use validation::ValidationError;
