//! HTTP server implementation using Axum
//!
//! This module provides an HTTP server built on Axum, implementing the
//! [`Server`](crate::Server) trait for consistent lifecycle management.
//! Every router it serves is wrapped with request tracing, request metrics
//! and, when configured, a request timeout.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use observability::ServerMetrics;
use parking_lot::RwLock;
use scale::Scale;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::control::{control_routes, STATE_PATH};
use crate::error::{Result, ServerError};
use crate::traits::Server;

/// HTTP server implementation using Axum
///
/// This server wraps an Axum router and provides graceful shutdown support
/// through the [`Server`] trait.
///
/// # Example
///
/// ```ignore
/// use server::{HttpServer, Server, ServerConfig, ShutdownController};
///
/// let config = ServerConfig::http_only("127.0.0.1", 8081);
/// let server = HttpServer::control(config, scale);
///
/// server.run(ShutdownController::with_ctrl_c().token()).await?;
/// ```
#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    /// Create a new HTTP server with a custom router
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let router = with_layers(router, &config);
        Self {
            config,
            router,
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    /// Create the control server for a shared scale
    ///
    /// Serves `GET /state` and `POST /state`; see [`crate::control`].
    pub fn control(config: ServerConfig, scale: Arc<Scale>) -> Self {
        Self::new(config, control_routes(scale))
    }

    fn bind_addr(&self) -> Result<SocketAddr> {
        self.config
            .http_addr()
            .ok_or(ServerError::NotConfigured("HTTP control"))?
    }
}

fn with_layers(router: Router, config: &ServerConfig) -> Router {
    let router = router.layer(middleware::from_fn_with_state(
        ServerMetrics::new("http"),
        track_request,
    ));

    let router = match config.request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn track_request(
    State(metrics): State<ServerMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;
    metrics.record_request(started.elapsed(), response.status().as_str());
    response
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &'static str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.bind_addr()?;

        debug!(%addr, "Binding HTTP control listener");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind("HTTP", addr, e))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::bind("HTTP", addr, e))?;
        *self.bound_addr.write() = Some(local_addr);

        info!("Control API available at http://{}{}", local_addr, STATE_PATH);

        // Waits for in-flight requests once the token is cancelled
        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("HTTP control server received shutdown signal");
            })
            .await;

        *self.bound_addr.write() = None;

        match result {
            Ok(()) => {
                info!("HTTP control server shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!(%e, "HTTP control server error");
                Err(ServerError::ControlPlane(e))
            }
        }
    }
}
