//! Request relay subsystem.
//!
//! # Data Flow
//! ```text
//! Browser request on /api/<path>?<query>
//!     → inbound.rs (capture method, path+query, request ID; read body
//!                   unless GET/HEAD)
//!     → forward.rs (base URL + path + query, fixed header set, credential
//!                   injection, same-origin redirects, explicit timeout)
//!     → RelayedResponse (upstream status, content type, raw body)
//!     → http::response (Cache-Control: no-store)
//!
//! Failure:
//!     no base URL            → 500 {"error": "BACKEND_URL not configured"}
//!     `.` / `..` segment     → 400 {"error": "Invalid path"}
//!     transport / timeout    → 502 {"error": "Backend unavailable"}
//!     upstream 4xx/5xx       → passed through unchanged
//! ```
//!
//! # Design Decisions
//! - One outbound call per inbound request; no cache, no retry
//! - Upstream body is relayed as raw bytes, never re-serialized
//! - Outbound headers are a fixed set; client headers are never copied
//! - Redirects are followed only within the upstream origin

pub mod error;
pub mod forward;
pub mod inbound;

pub use error::{
    BuildError, RelayError, INVALID_PATH_MESSAGE, NOT_CONFIGURED_MESSAGE, UNAVAILABLE_MESSAGE,
};
pub use forward::{Relay, RelayedResponse};
pub use inbound::InboundRequest;
