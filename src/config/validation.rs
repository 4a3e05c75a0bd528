//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that must make sense
//! together before the relay starts serving. Every problem is reported,
//! not just the first one.
//!
//! A missing upstream base URL is deliberately accepted here: the relay
//! still starts and answers each request with a configuration error.

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url '{url}' is invalid: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("upstream.api_key_header '{0}' is not a valid header name")]
    ApiKeyHeader(String),

    #[error("upstream.api_key contains characters not allowed in a header value")]
    ApiKeyValue,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.log_level '{0}' is not a known level")]
    LogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream = &config.upstream;
    if let Some(base) = upstream.normalized_base_url() {
        if let Err(reason) = check_base_url(base) {
            errors.push(ValidationError::BaseUrl {
                url: base.to_string(),
                reason,
            });
        }
    }

    if HeaderName::from_str(&upstream.api_key_header).is_err() {
        errors.push(ValidationError::ApiKeyHeader(upstream.api_key_header.clone()));
    }
    if let Some(key) = &upstream.api_key {
        if HeaderValue::from_str(key.expose()).is_err() {
            errors.push(ValidationError::ApiKeyValue);
        }
    }

    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_secs"));
    }
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    let observability = &config.observability;
    if tracing::Level::from_str(&observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(base: &str) -> Result<(), String> {
    let url = Url::parse(base).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}
