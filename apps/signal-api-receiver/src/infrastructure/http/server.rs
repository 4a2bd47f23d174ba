//! Receive HTTP Server
//!
//! HTTP endpoint exposing the buffered messages to polling consumers.
//!
//! # Endpoints
//!
//! - `GET /receive/pop` - Oldest message as JSON (200), or 204 when empty
//! - `GET /receive/flush` - All messages as a JSON array (200), possibly empty
//! - `GET /healthz` - Liveness probe (204)
//! - `GET /metrics` - Prometheus metrics in text format
//!
//! Any other method is answered with 403, any other path with 404 and a
//! plain-text usage message.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{Method, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::MessageSource;
use crate::infrastructure::metrics::{self, get_metrics_handle};

/// Usage text appended to 404 responses.
pub const USAGE: &str = "
GET /receive/pop   => Return the oldest message
GET /receive/flush => Return all messages
";

/// Message source shared with the handlers.
pub type SharedMessageSource = Arc<dyn MessageSource>;

// =============================================================================
// Router
// =============================================================================

/// Build the receive router over a message source.
pub fn router(source: SharedMessageSource) -> Router {
    Router::new()
        .route("/receive/pop", get(pop_handler))
        .route("/receive/flush", get(flush_handler))
        .route("/healthz", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(usage_handler)
        .layer(middleware::from_fn(require_get))
        .with_state(source)
}

// =============================================================================
// Receive Server
// =============================================================================

/// HTTP server for the pop/flush routes.
pub struct ReceiveServer {
    addr: SocketAddr,
    source: SharedMessageSource,
    cancel: CancellationToken,
}

impl ReceiveServer {
    /// Create a new receive server.
    #[must_use]
    pub fn new(addr: SocketAddr, source: SharedMessageSource, cancel: CancellationToken) -> Self {
        Self {
            addr,
            source,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(self.addr, e.to_string()))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError::ServerFailed` if the server stops with an
    /// error.
    pub async fn serve(self, listener: TcpListener) -> Result<(), HttpServerError> {
        let addr = listener.local_addr().unwrap_or(self.addr);
        tracing::info!(addr = %addr, "Starting HTTP server");

        axum::serve(listener, router(self.source))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn require_get(request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        tracing::debug!(method = %request.method(), path = request.uri().path(), "Rejecting non-GET request");
        return (StatusCode::FORBIDDEN, "GET is the only allowed verb").into_response();
    }
    next.run(request).await
}

async fn pop_handler(State(source): State<SharedMessageSource>) -> Response {
    match source.pop() {
        Some(message) => {
            metrics::record_http_request("pop", StatusCode::OK.as_u16());
            Json(message).into_response()
        }
        None => {
            metrics::record_http_request("pop", StatusCode::NO_CONTENT.as_u16());
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

async fn flush_handler(State(source): State<SharedMessageSource>) -> Response {
    let messages = source.flush();
    metrics::record_http_request("flush", StatusCode::OK.as_u16());
    tracing::debug!(count = messages.len(), "Flushing messages");
    Json(messages).into_response()
}

async fn liveness_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn metrics_handler() -> Response {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::CONTENT_TYPE, "text/plain")],
                "Metrics not initialized".to_string(),
            )
                .into_response()
        },
        |handle| {
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
                .into_response()
        },
    )
}

async fn usage_handler(uri: Uri) -> Response {
    metrics::record_http_request("unknown", StatusCode::NOT_FOUND.as_u16());
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        format!(
            "ERROR! GET {} is not supported. The supported paths are below:{USAGE}",
            uri.path()
        ),
    )
        .into_response()
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
