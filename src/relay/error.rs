//! Relay error taxonomy.
//!
//! Only configuration and transport failures become relay errors. An
//! upstream that answers with 4xx/5xx is a successful relay and its
//! response is passed through untouched.

use axum::http::StatusCode;
use thiserror::Error;

/// Body returned when the upstream cannot be reached.
pub const UNAVAILABLE_MESSAGE: &str = "Backend unavailable";

/// Body returned when no upstream origin is configured.
pub const NOT_CONFIGURED_MESSAGE: &str = "BACKEND_URL not configured";

/// Body returned for a path with `.` or `..` segments.
pub const INVALID_PATH_MESSAGE: &str = "Invalid path";

/// Per-request failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No upstream base URL. Deployment error; retrying will not help.
    #[error("upstream base URL is not configured")]
    NotConfigured,

    /// The inbound path contains a dot segment, which URL parsing would
    /// resolve to a location outside the relayed prefix.
    #[error("path '{path}' contains a dot segment")]
    DotSegment { path: String },

    /// The upstream URL could not be formed from base + path.
    #[error("cannot build upstream URL '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// Connection refused, DNS failure, timeout, redirect loop or a
    /// broken upstream body.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl RelayError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::DotSegment { .. } => StatusCode::BAD_REQUEST,
            RelayError::InvalidTarget { .. } | RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message placed in the `error` field of the JSON body. Deliberately
    /// generic: transport details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::NotConfigured => NOT_CONFIGURED_MESSAGE,
            RelayError::DotSegment { .. } => INVALID_PATH_MESSAGE,
            RelayError::InvalidTarget { .. } | RelayError::Upstream(_) => UNAVAILABLE_MESSAGE,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::NotConfigured => "not_configured",
            RelayError::DotSegment { .. } => "dot_segment",
            RelayError::InvalidTarget { .. } => "invalid_target",
            RelayError::Upstream(e) if e.is_timeout() => "timeout",
            RelayError::Upstream(e) if e.is_connect() => "connect",
            RelayError::Upstream(e) if e.is_redirect() => "redirect",
            RelayError::Upstream(e) if e.is_body() || e.is_decode() => "body",
            RelayError::Upstream(_) => "request",
        }
    }
}

/// Failure to construct a [`Relay`](crate::relay::Relay) at startup.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid credential header: {0}")]
    CredentialHeader(String),

    #[error("invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}
