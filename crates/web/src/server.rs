//! Web server implementation

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{WebError, WebResult};
use crate::page::{self, PageDescriptor};

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const ADDR_ENV: &str = "HANDSON_WEB_ADDR";

/// Server configuration
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,

    /// Page served at `/`
    pub page: PageDescriptor,
}

impl WebServerConfig {
    /// Read `HANDSON_WEB_ADDR`, falling back to `127.0.0.1:3000`
    pub fn from_env() -> WebResult<Self> {
        let raw = std::env::var(ADDR_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let addr = raw
            .parse()
            .map_err(|_| WebError::InvalidAddr(raw.clone()))?;

        Ok(Self {
            addr,
            page: PageDescriptor::home(),
        })
    }
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            page: PageDescriptor::home(),
        }
    }
}

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<WebServerState>,
}

struct WebServerState {
    /// Page rendered once at startup; every request gets the same bytes
    html: String,
    cfg: WebServerConfig,
}

pub async fn serve(cfg: WebServerConfig) -> anyhow::Result<()> {
    let addr = cfg.addr;
    let server = WebServer::new(cfg)?;
    server.serve(addr).await
}

impl WebServer {
    /// Create a new web server, rendering the page up front
    pub fn new(cfg: WebServerConfig) -> WebResult<Self> {
        let html = page::render(&cfg.page)?;
        debug!("Rendered page '{}' ({} bytes)", cfg.page.title, html.len());

        Ok(Self {
            state: Arc::new(WebServerState { html, cfg }),
        })
    }

    /// The configuration this server was built from
    pub fn config(&self) -> &WebServerConfig {
        &self.state.cfg
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(page_handler))
            .route("/health", get(health_handler))
            .fallback(not_found_handler)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until Ctrl-C or SIGTERM
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| WebError::Bind { addr, source })?;
        self.serve_listener(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve_listener(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        info!("Hands-on page serving on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Web server stopped");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn page_handler(State(state): State<Arc<WebServerState>>) -> impl IntoResponse {
    Html(state.html.clone())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "handson-web"
    }))
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_path(router: Router, path: &str) -> (StatusCode, Option<String>, String) {
        let resp = router
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_serves_page() {
        let server = WebServer::new(WebServerConfig::default()).unwrap();
        let (status, content_type, body) = get_path(server.router(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("<title>最初のページ</title>"));
        assert!(body.contains("Playwrightハンズオン"));
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let server = WebServer::new(WebServerConfig::default()).unwrap();
        let (_, _, first) = get_path(server.router(), "/").await;
        let (_, _, second) = get_path(server.router(), "/").await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_health() {
        let server = WebServer::new(WebServerConfig::default()).unwrap();
        let (status, _, body) = get_path(server.router(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "handson-web");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let server = WebServer::new(WebServerConfig::default()).unwrap();
        let (status, _, _) = get_path(server.router(), "/about").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_default_addr_parses() {
        let addr: SocketAddr = DEFAULT_ADDR.parse().unwrap();
        assert_eq!(addr, WebServerConfig::default().addr);
    }
}
