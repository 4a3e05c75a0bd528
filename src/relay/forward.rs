//! Upstream forwarding.

use std::str::FromStr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderName, HeaderValue, Request, StatusCode};
use reqwest::redirect::Policy;
use url::{Origin, Url};

use crate::config::{RelayConfig, UpstreamConfig};
use crate::http::request::X_REQUEST_ID;
use crate::relay::error::{BuildError, RelayError};
use crate::relay::inbound::InboundRequest;

/// Upstream answer as handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedResponse {
    pub status: StatusCode,
    /// Upstream content type, or `application/json` when it sent none.
    pub content_type: HeaderValue,
    /// Raw upstream body, never re-parsed.
    pub body: Bytes,
}

#[derive(Debug, Clone)]
struct Credential {
    name: HeaderName,
    value: HeaderValue,
}

/// Stateless request translator.
///
/// Built once at startup and shared by every request. Holds no per-request
/// state: the same inbound request always produces the same outbound call.
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    base_url: Option<String>,
    credential: Option<Credential>,
    max_body_bytes: usize,
}

impl Relay {
    /// Build the relay and its pooled upstream client.
    pub fn from_config(config: &RelayConfig) -> Result<Self, BuildError> {
        let upstream = &config.upstream;
        let base_url = upstream.normalized_base_url().map(str::to_string);
        let origin = match &base_url {
            Some(url) => Some(Url::parse(url)?.origin()),
            None => None,
        };

        let mut builder = reqwest::Client::builder()
            .redirect(redirect_policy(origin, upstream.max_redirects))
            .timeout(Duration::from_secs(upstream.timeout_secs))
            .connect_timeout(Duration::from_secs(upstream.connect_timeout_secs));
        if !upstream.use_env_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            credential: credential(upstream)?,
            max_body_bytes: config.limits.max_body_bytes,
        })
    }

    /// Whether an upstream origin is configured.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Relay one inbound request and return the upstream answer.
    ///
    /// A missing base URL fails before the body is read and before any
    /// outbound call is made.
    pub async fn relay(&self, request: Request<Body>) -> Result<RelayedResponse, RelayError> {
        let base_url = self.base_url.as_deref().ok_or(RelayError::NotConfigured)?;
        let inbound = InboundRequest::read(request, self.max_body_bytes).await;
        self.forward(base_url, inbound).await
    }

    /// Upstream URL for an inbound path and query: plain prefix concatenation.
    pub fn target_url(&self, path_and_query: &str) -> Result<Url, RelayError> {
        let base_url = self.base_url.as_deref().ok_or(RelayError::NotConfigured)?;
        join_target(base_url, path_and_query)
    }

    async fn forward(
        &self,
        base_url: &str,
        inbound: InboundRequest,
    ) -> Result<RelayedResponse, RelayError> {
        let target = join_target(base_url, &inbound.path_and_query)?;

        tracing::debug!(
            method = %inbound.method,
            target = %target,
            has_body = inbound.body.is_some(),
            "Forwarding to upstream"
        );

        let mut outbound = self
            .client
            .request(inbound.method, target)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(credential) = &self.credential {
            outbound = outbound.header(credential.name.clone(), credential.value.clone());
        }
        if let Some(request_id) = inbound.request_id {
            outbound = outbound.header(X_REQUEST_ID, request_id);
        }
        if let Some(body) = inbound.body {
            outbound = outbound.body(body);
        }

        let response = outbound.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        let body = response.bytes().await?;

        Ok(RelayedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Follow at most `max_redirects` hops, and only while the redirect stays on
/// the upstream origin. The credential header is not stripped on a
/// cross-origin hop, so such a redirect fails the call instead.
fn redirect_policy(origin: Option<Origin>, max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if origin.as_ref() == Some(&attempt.url().origin()) {
            attempt.follow()
        } else {
            attempt.error("redirect leaves the upstream origin")
        }
    })
}

fn join_target(base_url: &str, path_and_query: &str) -> Result<Url, RelayError> {
    if has_dot_segment(path_and_query) {
        return Err(RelayError::DotSegment {
            path: path_and_query.to_string(),
        });
    }
    let target = format!("{}{}", base_url, path_and_query);
    Url::parse(&target).map_err(|source| RelayError::InvalidTarget { target, source })
}

/// Whether the path holds a segment URL parsing treats as `.` or `..`,
/// including the percent-encoded `%2e` forms and backslash separators.
fn has_dot_segment(path_and_query: &str) -> bool {
    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);
    path.split(['/', '\\']).any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

fn credential(upstream: &UpstreamConfig) -> Result<Option<Credential>, BuildError> {
    let Some(key) = &upstream.api_key else {
        return Ok(None);
    };

    let name = HeaderName::from_str(&upstream.api_key_header)
        .map_err(|e| BuildError::CredentialHeader(e.to_string()))?;
    let mut value = HeaderValue::from_str(key.expose())
        .map_err(|e| BuildError::CredentialHeader(e.to_string()))?;
    value.set_sensitive(true);

    Ok(Some(Credential { name, value }))
}
