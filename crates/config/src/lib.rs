//! Configuration for the MT-SICS balance simulator
//!
//! The YAML file has four sections (`server`, `scale`, `logging`, `metrics`).
//! Every key has a default, so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub server: NetworkConfig,
    #[serde(default)]
    pub scale: ScaleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Listener settings shared by the MT-SICS and HTTP front-ends
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Line sent to every TCP client right after it connects
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl NetworkConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            tcp_port: default_tcp_port(),
            http_port: default_http_port(),
            greeting: None,
            idle_timeout_secs: None,
            request_timeout_secs: None,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

/// Initial instrument state, applied before either server accepts
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScaleConfig {
    #[serde(default = "default_initial_weight")]
    pub initial_weight: f64,
    #[serde(default = "default_stable")]
    pub stable: bool,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            initial_weight: default_initial_weight(),
            stable: default_stable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub port: Option<u16>,
}
