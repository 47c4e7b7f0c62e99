//! Lifecycle shared by the simulator front-ends
//!
//! [`SicsServer`](crate::SicsServer), [`HttpServer`](crate::HttpServer) and
//! the [`SimulatorServer`](crate::SimulatorServer) that runs both implement
//! [`Server`]. [`ServerHandle`] runs one of them on its own task.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ServerError};

#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Short name used in logs and task errors
    fn name(&self) -> &'static str;

    /// Bound listener address; `None` before bind and after shutdown.
    fn address(&self) -> Option<SocketAddr>;

    /// Bind, serve until `shutdown` is cancelled, then drain open work.
    ///
    /// Bind failures are returned immediately.
    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// A server running on its own tokio task
pub struct ServerHandle {
    pub(crate) name: &'static str,
    token: CancellationToken,
    pub(crate) task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Start `server` on a new task; cancelling `token` stops it.
    pub fn spawn<S: Server>(server: S, token: CancellationToken) -> Self {
        let name = server.name();
        let run_token = token.clone();
        let task = tokio::spawn(async move { server.run(run_token).await });
        Self { name, token, task }
    }

    /// Wait for the server to exit on its own.
    pub async fn join(self) -> Result<()> {
        let name = self.name;
        task_result(name, self.task.await)
    }

    /// Cancel the server and wait for its drain to finish.
    pub async fn stop(self) -> Result<()> {
        self.token.cancel();
        self.join().await
    }
}

/// Fold a panicked or aborted task into the server's own result.
pub(crate) fn task_result(
    name: &'static str,
    joined: std::result::Result<Result<()>, JoinError>,
) -> Result<()> {
    joined.unwrap_or_else(|e| {
        Err(ServerError::TaskAborted {
            server: name,
            reason: e.to_string(),
        })
    })
}
