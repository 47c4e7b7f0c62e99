//! Server configuration
//!
//! This module provides the bind configuration for the two simulator
//! front-ends (MT-SICS over TCP and the HTTP control plane) and their
//! default ports.

use crate::error::{Result, ServerError};
use std::net::SocketAddr;
use std::time::Duration;

/// Default port assignments
pub mod ports {
    /// MT-SICS protocol port
    pub const SICS_TCP: u16 = 4305;
    /// HTTP control API port
    pub const CONTROL_HTTP: u16 = 8081;
}

/// Default grace period granted to open sessions on shutdown
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Server configuration for both front-ends
///
/// Each port is optional so tests can run only the protocol they need.
/// Timeouts default to `None`, which means a silent client keeps its session
/// (or request) open indefinitely.
///
/// # Example
///
/// ```
/// use server::config::ServerConfig;
/// use std::time::Duration;
///
/// // Both front-ends
/// let config = ServerConfig::new("0.0.0.0", 4305, 8081);
///
/// // MT-SICS only, closing sessions idle for a minute
/// let config = ServerConfig::tcp_only("127.0.0.1", 4305)
///     .with_idle_timeout(Some(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Optional MT-SICS TCP port
    pub tcp_port: Option<u16>,
    /// Optional HTTP control port
    pub http_port: Option<u16>,
    /// Banner line sent to each client on connect
    pub greeting: Option<String>,
    /// Close TCP sessions that send nothing for this long
    pub idle_timeout: Option<Duration>,
    /// Abort HTTP requests that take longer than this
    pub request_timeout: Option<Duration>,
    /// How long open sessions may keep running after shutdown is requested
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    /// Create a new server config with both ports
    pub fn new(host: impl Into<String>, tcp: u16, http: u16) -> Self {
        Self {
            host: host.into(),
            tcp_port: Some(tcp),
            http_port: Some(http),
            ..Self::default()
        }
    }

    /// Create a server config for the MT-SICS port only
    pub fn tcp_only(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            tcp_port: Some(port),
            http_port: None,
            ..Self::default()
        }
    }

    /// Create a server config for the HTTP control port only
    pub fn http_only(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            tcp_port: None,
            http_port: Some(port),
            ..Self::default()
        }
    }

    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Get MT-SICS socket address
    pub fn tcp_addr(&self) -> Option<Result<SocketAddr>> {
        self.tcp_port.map(|p| self.parse_addr(p))
    }

    /// Get HTTP socket address
    pub fn http_addr(&self) -> Option<Result<SocketAddr>> {
        self.http_port.map(|p| self.parse_addr(p))
    }

    /// Check if any servers are configured
    pub fn has_servers(&self) -> bool {
        self.tcp_port.is_some() || self.http_port.is_some()
    }

    /// Parse an address from host and port
    fn parse_addr(&self, port: u16) -> Result<SocketAddr> {
        format!("{}:{}", self.host, port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            tcp_port: Some(ports::SICS_TCP),
            http_port: Some(ports::CONTROL_HTTP),
            greeting: None,
            idle_timeout: None,
            request_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_new() {
        let config = ServerConfig::new("127.0.0.1", 4000, 4001);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.tcp_port, Some(4000));
        assert_eq!(config.http_port, Some(4001));
        assert!(config.idle_timeout.is_none());
        assert!(config.request_timeout.is_none());
        assert!(config.has_servers());
    }

    #[test]
    fn test_server_config_single_protocol() {
        let config = ServerConfig::tcp_only("127.0.0.1", 4305);
        assert_eq!(config.tcp_port, Some(4305));
        assert_eq!(config.http_port, None);

        let config = ServerConfig::http_only("127.0.0.1", 8081);
        assert_eq!(config.tcp_port, None);
        assert_eq!(config.http_port, Some(8081));
    }

    #[test]
    fn test_default_ports() {
        let config = ServerConfig::default();
        assert_eq!(config.tcp_port, Some(4305));
        assert_eq!(config.http_port, Some(8081));
        assert_eq!(config.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
    }

    #[test]
    fn test_addresses() {
        let config = ServerConfig::new("127.0.0.1", 4305, 8081);
        let tcp = config.tcp_addr().unwrap().unwrap();
        assert_eq!(tcp.port(), 4305);

        let config = ServerConfig::http_only("not a host", 8081);
        assert!(config.tcp_addr().is_none());
        assert!(matches!(
            config.http_addr(),
            Some(Err(ServerError::InvalidAddress(_)))
        ));
    }
}
