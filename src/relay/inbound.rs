//! Inbound request capture.

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, Method, Request};

use crate::http::request::X_REQUEST_ID;

/// The parts of a browser request that are relayed upstream.
///
/// Client headers are intentionally not kept: the outbound header set is
/// fixed, so nothing the browser sends can reach or override the
/// credential header.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path plus query string, exactly as received (e.g. `/api/v1/bar?x=2`).
    pub path_and_query: String,
    pub body: Option<Bytes>,
    pub request_id: Option<HeaderValue>,
}

impl InboundRequest {
    /// Capture an axum request, reading the body for methods that carry one.
    pub async fn read(request: Request<Body>, max_body_bytes: usize) -> Self {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let request_id = parts.headers.get(X_REQUEST_ID).cloned();
        let body = read_body(&parts.method, body, max_body_bytes).await;

        Self {
            method: parts.method,
            path_and_query,
            body,
            request_id,
        }
    }
}

/// Read the inbound body for forwarding.
///
/// GET and HEAD never touch the body. For other methods an unreadable
/// body (client abort, over the size limit) is forwarded as no body at
/// all rather than failing the request.
pub async fn read_body(method: &Method, body: Body, limit: usize) -> Option<Bytes> {
    if method == Method::GET || method == Method::HEAD {
        return None;
    }

    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(
                method = %method,
                limit,
                error = %e,
                "Inbound body unreadable, forwarding without body"
            );
            None
        }
    }
}
