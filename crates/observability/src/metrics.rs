//! Prometheus metrics infrastructure
//!
//! Metrics go through the `metrics` facade. Without [`init_metrics`] no
//! recorder is installed and every call below is a no-op, which is the
//! default for the simulator.

use metrics::{counter, gauge, histogram, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter.
///
/// Starts an HTTP listener on `host:port` exposing `/metrics`.
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics("0.0.0.0", 9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Per-front-end metrics
///
/// # Metrics
///
/// * `simulator_requests_total` - Commands / requests processed, by outcome
/// * `simulator_request_duration_seconds` - Processing time histogram
/// * `simulator_active_connections` - Open TCP sessions or HTTP connections
///
/// # Example
///
/// ```ignore
/// let metrics = ServerMetrics::new("sics");
///
/// metrics.connection_opened();
/// metrics.record_request(Duration::from_micros(40), "ok");
/// metrics.connection_closed();
/// ```
#[derive(Clone)]
pub struct ServerMetrics {
    request_duration: Histogram,
    active_connections: Gauge,
    server_name: String,
}

impl ServerMetrics {
    /// Create metrics for a specific front-end (e.g. "sics", "http")
    pub fn new(server_name: &str) -> Self {
        let name = server_name.to_string();

        Self {
            request_duration: histogram!("simulator_request_duration_seconds", "server" => name.clone()),
            active_connections: gauge!("simulator_active_connections", "server" => name.clone()),
            server_name: name,
        }
    }

    /// Record a processed command or request
    ///
    /// `outcome` is a short label such as `ok`, `error` or an HTTP status code.
    pub fn record_request(&self, duration: Duration, outcome: &str) {
        counter!(
            "simulator_requests_total",
            "server" => self.server_name.clone(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
        self.request_duration.record(duration.as_secs_f64());
    }

    /// Increment active connections (call when a connection is opened)
    pub fn connection_opened(&self) {
        self.active_connections.increment(1.0);
    }

    /// Decrement active connections (call when a connection is closed)
    pub fn connection_closed(&self) {
        self.active_connections.decrement(1.0);
    }

    /// Get the server name
    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_metrics_without_recorder() {
        // No exporter installed: recording must be a silent no-op
        let metrics = ServerMetrics::new("sics");
        metrics.connection_opened();
        metrics.record_request(Duration::from_millis(1), "ok");
        metrics.connection_closed();
        assert_eq!(metrics.server_name(), "sics");
    }

    #[test]
    fn test_init_metrics_rejects_bad_address() {
        assert!(init_metrics("not a host", 9090).is_err());
    }
}
