//! Port validation utilities
//!
//! Note: Port validation before binding has an inherent TOCTOU (time-of-check-time-of-use)
//! race condition. Between checking and actually binding, another process could take the port.
//! These utilities are useful for early feedback but should not be relied upon for correctness.
//! The actual bind operation is the source of truth.

use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

fn configured_ports(config: &ServerConfig) -> Vec<(&'static str, u16)> {
    let mut ports = Vec::new();
    if let Some(port) = config.tcp_port {
        ports.push(("MT-SICS", port));
    }
    if let Some(port) = config.http_port {
        ports.push(("HTTP", port));
    }
    ports
}

/// Validate that all configured ports are available
///
/// Port 0 is skipped since the OS picks a free port at bind time.
pub async fn validate_ports_available(config: &ServerConfig) -> Result<()> {
    info!("Validating simulator ports...");

    let ports_to_check = configured_ports(config);
    if ports_to_check.is_empty() {
        warn!("No ports configured for simulator");
        return Ok(());
    }

    for (protocol, port) in ports_to_check.into_iter().filter(|(_, port)| *port != 0) {
        validate_single_port(&config.host, port, protocol).await?;
    }

    info!("All simulator ports validated successfully");
    Ok(())
}

async fn validate_single_port(host: &str, port: u16, protocol: &'static str) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    debug!("Checking {} port {}", protocol, port);

    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            let local_addr = listener
                .local_addr()
                .map_err(|e| ServerError::bind(protocol, &addr, e))?;

            // Release the port for the real bind
            drop(listener);

            debug!("{} port {} is available ({})", protocol, port, local_addr);
            Ok(())
        }
        Err(e) => {
            error!("{} port {} is NOT available: {}", protocol, port, e);
            Err(ServerError::PortUnavailable {
                front_end: protocol,
                port,
                reason: e.to_string(),
            })
        }
    }
}

/// Validate port range
///
/// - Port 0 is rejected (ephemeral port assignment)
/// - Ports below 1024 generate a warning (privileged ports)
pub fn validate_port_range(port: u16) -> Result<()> {
    if port == 0 {
        Err(ServerError::PortSetup(
            "Port cannot be 0 (ephemeral port assignment not supported for explicit binding)"
                .to_string(),
        ))
    } else if port < 1024 {
        warn!(
            "Port {} is a privileged port (requires root/admin privileges)",
            port
        );
        Ok(())
    } else {
        Ok(())
    }
}

/// Validate all ports in a configuration
///
/// Both front-ends bind the same host, so they cannot share a port.
pub fn validate_config_ports(config: &ServerConfig) -> Result<()> {
    for (_, port) in configured_ports(config) {
        validate_port_range(port)?;
    }

    if let (Some(tcp), Some(http)) = (config.tcp_port, config.http_port) {
        if tcp == http {
            return Err(ServerError::PortSetup(format!(
                "MT-SICS and HTTP ports must differ (both are {})",
                tcp
            )));
        }
    }
    Ok(())
}
