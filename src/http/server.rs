//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay and liveness handlers
//! - Wire up middleware (request ID, tracing)
//! - Dispatch `/api/*` requests to the relay
//! - Record request metrics
//! - Serve until the shutdown signal fires, draining in-flight requests

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::http::request::{self, make_span};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::relay::{BuildError, Relay, RelayError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, BuildError> {
        let relay = Arc::new(Relay::from_config(&config)?);
        let router = Self::build_router(AppState { relay });
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/{*path}", relay_methods())
            .route("/healthz", get(health_handler))
            .with_state(state)
            .layer(request::propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(request::set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// GET (and HEAD), POST, PUT and DELETE are relayed; anything else is 405.
fn relay_methods() -> MethodRouter<AppState> {
    get(relay_handler)
        .post(relay_handler)
        .put(relay_handler)
        .delete(relay_handler)
}

/// Relay handler: forwards the request and maps the outcome to a response.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request::request_id(request.headers()).to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Relaying request"
    );

    match state.relay.relay(request).await {
        Ok(relayed) => {
            tracing::debug!(
                request_id = %request_id,
                status = %relayed.status,
                bytes = relayed.body.len(),
                "Upstream responded"
            );
            metrics::record_request(method.as_str(), relayed.status.as_u16(), start_time);
            relayed.into_response()
        }
        Err(err) => {
            match &err {
                RelayError::NotConfigured => {
                    tracing::error!(request_id = %request_id, path = %path, "Upstream base URL not configured");
                }
                RelayError::DotSegment { .. } => {
                    tracing::warn!(request_id = %request_id, path = %path, "Rejected path with dot segment");
                }
                _ => {
                    tracing::warn!(
                        request_id = %request_id,
                        path = %path,
                        kind = err.kind(),
                        error = %err,
                        "Upstream unavailable"
                    );
                }
            }
            metrics::record_relay_error(err.kind());
            metrics::record_request(method.as_str(), err.status().as_u16(), start_time);
            err.into_response()
        }
    }
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub upstream_configured: bool,
}

/// Local liveness probe; never contacts the upstream.
async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream_configured: state.relay.is_configured(),
    })
}
