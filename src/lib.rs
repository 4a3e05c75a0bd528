//! HTTP request relay.
//!
//! Forwards browser calls on `/api/*` to a single configured upstream
//! origin, injecting a server-side credential header, and relays the
//! upstream status, content type and body back unchanged.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownSignal};
pub use relay::Relay;
