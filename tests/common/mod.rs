//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use api_relay::config::{ApiKey, RelayConfig};
use api_relay::{HttpServer, Shutdown};
use axum::body::Body;
use axum::http::Request;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Serve `router` as a mock upstream on an ephemeral port.
pub async fn start_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// What the echo upstream observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seen {
    pub method: String,
    pub path_and_query: String,
    pub body: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
}

pub async fn echo(request: Request<Body>) -> Json<Seen> {
    let (parts, body) = request.into_parts();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let seen = Seen {
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        api_key: header("x-api-key"),
        content_type: header("content-type"),
        request_id: header("x-request-id"),
        body: String::from_utf8_lossy(&axum::body::to_bytes(body, usize::MAX).await.unwrap())
            .into_owned(),
    };
    Json(seen)
}

/// Upstream that answers every request with what it received.
pub fn echo_router() -> Router {
    Router::new().fallback(echo)
}

/// Relay config pointing at `upstream`, with proxies disabled.
pub fn relay_config(upstream: Option<SocketAddr>, api_key: Option<&str>) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = upstream.map(|addr| format!("http://{}", addr));
    config.upstream.api_key = api_key.map(ApiKey::new);
    config.upstream.use_env_proxy = false;
    config.upstream.timeout_secs = 5;
    config
}

/// A relay serving on an ephemeral port. Shuts down when dropped.
pub struct RunningRelay {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });
    RunningRelay { addr, shutdown }
}

/// Test client: no proxies, and redirects are never followed client-side.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
