//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http + relay
//!     → logging.rs (tracing subscriber, pretty or JSON)
//!     → metrics.rs (counters, histograms, Prometheus exporter)
//! ```
//!
//! Request IDs flow through spans (see `http::request`).

pub mod logging;
pub mod metrics;
