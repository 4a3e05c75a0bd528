//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! signals.rs: SIGTERM / Ctrl+C
//!     → Shutdown::trigger()
//!     → ShutdownSignal resolves inside HttpServer::run
//!     → stop accepting, drain in-flight requests, exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::wait_for_termination;
