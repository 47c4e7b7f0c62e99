//! Network front-ends for the MT-SICS balance simulator
//!
//! Two servers share one [`Scale`]:
//!
//! - [`SicsServer`] speaks MT-SICS over plain TCP, one task per connection
//! - [`HttpServer`] serves the JSON control plane at `/state`
//!
//! [`SimulatorServer`] runs both with unified startup and shutdown.
//!
//! # Architecture
//!
//! Every front-end implements the [`Server`] trait. [`SimulatorServer`] starts
//! each one as a [`ServerHandle`] under a child of its shutdown token, so
//! cancelling the root stops all of them, and a failing front-end stops the
//! rest.
//!
//! # Quick Start
//!
//! ```ignore
//! use server::{Server, ServerConfig, ShutdownController, SimulatorServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scale = Arc::new(Scale::new(0.0, true));
//!     let server = SimulatorServer::new(ServerConfig::default(), scale);
//!
//!     server.run(ShutdownController::with_ctrl_c().token()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Bind configuration and default ports
//! - [`traits`] - `Server` trait and `ServerHandle`
//! - [`sics`] - MT-SICS TCP server
//! - [`http`] - HTTP server using Axum
//! - [`control`] - `/state` routes
//! - [`shutdown`] - Ctrl+C driven shutdown

use scale::Scale;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub mod config;
pub mod control;
pub mod error;
pub mod http;
pub mod port_validator;
pub mod shutdown;
pub mod sics;
pub mod traits;

pub use config::{ports, ServerConfig};
pub use control::{control_routes, ControlError, ErrorResponse, StateUpdate};
pub use error::{Result, ServerError};
pub use http::HttpServer;
pub use port_validator::{validate_config_ports, validate_ports_available};
pub use shutdown::ShutdownController;
pub use sics::SicsServer;
pub use traits::{Server, ServerHandle};

/// Runs the MT-SICS and HTTP front-ends against one scale
///
/// If either server fails (typically a bind error) the other is stopped and
/// the failure is returned from [`Server::run`].
///
/// # Example
///
/// ```ignore
/// let server = SimulatorServer::new(config, scale);
///
/// let handle = ServerHandle::spawn(server, CancellationToken::new());
/// // ... later ...
/// handle.stop().await?;
/// ```
pub struct SimulatorServer {
    config: ServerConfig,
    sics_server: Option<SicsServer>,
    http_server: Option<HttpServer>,
}

impl SimulatorServer {
    /// Create servers for every configured port
    pub fn new(config: ServerConfig, scale: Arc<Scale>) -> Self {
        let sics_server = config
            .tcp_port
            .map(|_| SicsServer::new(config.clone(), Arc::clone(&scale)));
        let http_server = config
            .http_port
            .map(|_| HttpServer::control(config.clone(), Arc::clone(&scale)));

        Self {
            config,
            sics_server,
            http_server,
        }
    }

    /// Bound MT-SICS address, once listening
    pub fn tcp_address(&self) -> Option<SocketAddr> {
        self.sics_server.as_ref().and_then(|s| s.address())
    }

    /// Bound HTTP address, once listening
    pub fn http_address(&self) -> Option<SocketAddr> {
        self.http_server.as_ref().and_then(|s| s.address())
    }

    /// Validate that all configured ports are available
    pub async fn validate_ports(&self) -> Result<()> {
        validate_ports_available(&self.config).await
    }
}

#[async_trait::async_trait]
impl Server for SimulatorServer {
    fn name(&self) -> &'static str {
        "mtsim"
    }

    fn address(&self) -> Option<SocketAddr> {
        self.tcp_address().or_else(|| self.http_address())
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        if !self.config.has_servers() {
            warn!("No servers configured to start");
            return Ok(());
        }

        info!("Starting simulator servers...");

        let mut handles = Vec::new();
        if let Some(ref sics) = self.sics_server {
            handles.push(ServerHandle::spawn(sics.clone(), shutdown_token.child_token()));
        }
        if let Some(ref http) = self.http_server {
            handles.push(ServerHandle::spawn(http.clone(), shutdown_token.child_token()));
        }

        let exited = tokio::select! {
            _ = shutdown_token.cancelled() => {
                info!("Shutdown signal received");
                None
            }
            exit = first_exit(&mut handles) => Some(exit),
        };

        let mut failure = None;
        if let Some((index, result)) = exited {
            let server = handles.swap_remove(index).name;
            match result {
                Ok(()) => warn!(server, "Server exited before shutdown was requested"),
                Err(e) => {
                    error!(server, %e, "Server failed, stopping the simulator");
                    failure = Some(e);
                }
            }
        }

        // Each server bounds its own drain by the grace period; this is a backstop
        info!("Waiting for all servers to shut down...");
        let backstop = self.config.shutdown_grace * 2;
        let stops = futures::future::join_all(handles.into_iter().map(ServerHandle::stop));

        match tokio::time::timeout(backstop, stops).await {
            Ok(results) => {
                for e in results.into_iter().filter_map(|r| r.err()) {
                    warn!(%e, "Server reported an error while stopping");
                }
            }
            Err(_) => warn!("Timed out waiting for servers to shut down"),
        }

        info!("Simulator shutdown complete");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Index and result of the first server task to finish
async fn first_exit(handles: &mut [ServerHandle]) -> (usize, Result<()>) {
    let (joined, index, remaining) =
        futures::future::select_all(handles.iter_mut().map(|h| &mut h.task)).await;
    drop(remaining);

    (index, traits::task_result(handles[index].name, joined))
}
