//! MT-SICS protocol server over plain TCP
//!
//! One task per accepted connection. Each session reads newline-terminated
//! commands, decodes them as ASCII (non-ASCII bytes are dropped), runs them
//! against the shared [`Scale`] and writes the raw response back before
//! reading the next line. Sessions keep no protocol state of their own.

use async_trait::async_trait;
use observability::ServerMetrics;
use parking_lot::RwLock as SyncRwLock;
use scale::Scale;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::traits::Server;

/// A unique identifier for each TCP session
pub type ConnectionId = u64;

#[derive(Debug, Clone, Copy)]
struct ConnectionInfo {
    peer_addr: SocketAddr,
    connected_at: Instant,
}

/// Decode a raw line: keep ASCII bytes only, drop trailing whitespace.
pub fn decode_line(raw: &[u8]) -> String {
    let decoded: String = raw
        .iter()
        .filter(|byte| byte.is_ascii())
        .map(|&byte| char::from(byte))
        .collect();
    decoded.trim_end().to_string()
}

/// `ES` and `EL` count as errors, everything else as handled.
fn outcome_of(response: &str) -> &'static str {
    match response.trim_end() {
        "ES" | "EL" => "error",
        _ => "ok",
    }
}

/// MT-SICS TCP server with session tracking
///
/// # Example
///
/// ```ignore
/// use server::{Server, ServerConfig, ShutdownController, SicsServer};
///
/// let scale = Arc::new(Scale::new(0.0, true));
/// let server = SicsServer::new(ServerConfig::tcp_only("127.0.0.1", 4305), scale);
///
/// server.run(ShutdownController::with_ctrl_c().token()).await?;
/// ```
#[derive(Clone)]
pub struct SicsServer {
    config: ServerConfig,
    bound_addr: Arc<SyncRwLock<Option<SocketAddr>>>,
    next_conn_id: Arc<AtomicU64>,
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionInfo>>>,
    scale: Arc<Scale>,
    metrics: ServerMetrics,
}

impl SicsServer {
    pub fn new(config: ServerConfig, scale: Arc<Scale>) -> Self {
        Self {
            config,
            bound_addr: Arc::new(SyncRwLock::new(None)),
            next_conn_id: Arc::new(AtomicU64::new(1)),
            connections: Arc::new(RwLock::new(HashMap::new())),
            scale,
            metrics: ServerMetrics::new("sics"),
        }
    }

    fn bind_addr(&self) -> Result<SocketAddr> {
        self.config
            .tcp_addr()
            .ok_or(ServerError::NotConfigured("MT-SICS TCP"))?
    }

    /// Get the number of open sessions
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    fn next_connection_id(&self) -> ConnectionId {
        self.next_conn_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn register_connection(&self, id: ConnectionId, peer_addr: SocketAddr) {
        let info = ConnectionInfo {
            peer_addr,
            connected_at: Instant::now(),
        };
        self.connections.write().await.insert(id, info);
        self.metrics.connection_opened();
    }

    async fn unregister_connection(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        let info = self.connections.write().await.remove(&id);
        self.metrics.connection_closed();
        info
    }

    /// Handle a single client connection from accept to close
    async fn handle_connection(
        &self,
        conn_id: ConnectionId,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<()> {
        info!(conn_id, %peer_addr, "TCP client connected");
        self.register_connection(conn_id, peer_addr).await;

        let result = self
            .serve_session(conn_id, stream)
            .await
            .map_err(ServerError::session(conn_id));

        if let Some(info) = self.unregister_connection(conn_id).await {
            info!(
                conn_id,
                peer_addr = %info.peer_addr,
                duration = ?info.connected_at.elapsed(),
                "TCP client disconnected"
            );
        }
        result
    }

    /// Strict request/response loop until EOF, idle timeout or I/O error
    async fn serve_session(&self, conn_id: ConnectionId, stream: TcpStream) -> io::Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        if let Some(ref greeting) = self.config.greeting {
            writer.write_all(format!("{}\r\n", greeting).as_bytes()).await?;
            writer.flush().await?;
        }

        let mut raw = Vec::new();
        loop {
            raw.clear();

            let read = match self.config.idle_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, reader.read_until(b'\n', &mut raw)).await {
                        Ok(read) => read?,
                        Err(_) => {
                            info!(conn_id, ?limit, "Closing idle TCP session");
                            break;
                        }
                    }
                }
                None => reader.read_until(b'\n', &mut raw).await?,
            };

            if read == 0 {
                debug!(conn_id, "TCP stream ended");
                break;
            }

            let line = decode_line(&raw);
            debug!(conn_id, command = %line, "Received command");

            let started = Instant::now();
            let response = self.scale.handle_command(&line);
            self.metrics
                .record_request(started.elapsed(), outcome_of(&response));

            writer.write_all(response.as_bytes()).await?;
            writer.flush().await?;
            debug!(conn_id, response = response.trim_end(), "Sent response");
        }

        Ok(())
    }
}

#[async_trait]
impl Server for SicsServer {
    fn name(&self) -> &'static str {
        "sics"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.bind_addr()?;

        debug!(%addr, "Binding MT-SICS listener");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind("MT-SICS", addr, e))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::bind("MT-SICS", addr, e))?;
        *self.bound_addr.write() = Some(local_addr);

        info!("MT-SICS TCP server listening on {}", local_addr);

        let mut connection_handles: Vec<tokio::task::JoinHandle<()>> = Vec::new();

        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    info!("MT-SICS server received shutdown signal");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let conn_id = self.next_connection_id();
                            let server = self.clone();

                            let handle = tokio::spawn(async move {
                                if let Err(e) = server
                                    .handle_connection(conn_id, stream, peer_addr)
                                    .await
                                {
                                    warn!(%e, "TCP session ended with error");
                                }
                            });

                            connection_handles.push(handle);
                            connection_handles.retain(|h| !h.is_finished());
                        }
                        Err(e) => {
                            error!(%e, "Failed to accept TCP connection");
                        }
                    }
                }
            }
        }

        // Stop listening before draining so no new client sneaks in
        drop(listener);

        connection_handles.retain(|h| !h.is_finished());
        if !connection_handles.is_empty() {
            let open_sessions = self.connection_count().await;
            let grace = self.config.shutdown_grace;
            info!(open_sessions, ?grace, "Waiting for open TCP sessions to finish...");

            match tokio::time::timeout(grace, futures::future::join_all(connection_handles)).await
            {
                Ok(_) => info!("All TCP sessions finished"),
                Err(_) => warn!("Grace period elapsed with TCP sessions still open"),
            }
        }

        *self.bound_addr.write() = None;

        info!("MT-SICS server shutdown complete");

        Ok(())
    }
}
