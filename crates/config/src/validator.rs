use crate::*;
use thiserror::Error;

/// Levels accepted by the logging setup, including the aliases it maps
const LOG_LEVELS: [&str; 7] = ["trace", "debug", "info", "warn", "warning", "error", "critical"];

const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} cannot be 0")]
    ZeroPort { field: String },

    #[error("{first} and {second} must differ (both are {port})")]
    DuplicatePort {
        first: String,
        second: String,
        port: u16,
    },

    #[error("server.host must not be empty")]
    MissingHost,

    #[error("scale.initial_weight must be a finite number, got: {0}")]
    InvalidInitialWeight(f64),

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Environment variable placeholder left unresolved in {field}")]
    UnresolvedEnvVar { field: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

pub fn validate_config(config: &SimulatorConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_network(&config.server, &config.metrics, &mut report);
    validate_scale(&config.scale, &mut report);
    validate_logging(&config.logging, &mut report);

    report
}

fn validate_network(server: &NetworkConfig, metrics: &MetricsConfig, report: &mut ValidationReport) {
    if server.host.trim().is_empty() {
        report.add_error(ValidationError::MissingHost);
    } else if has_unresolved_env_vars(&server.host) {
        report.add_error(ValidationError::UnresolvedEnvVar {
            field: "server.host".to_string(),
        });
    }

    if let Some(ref greeting) = server.greeting {
        if has_unresolved_env_vars(greeting) {
            report.add_error(ValidationError::UnresolvedEnvVar {
                field: "server.greeting".to_string(),
            });
        }
    }

    let mut ports = vec![
        ("server.tcp_port", server.tcp_port),
        ("server.http_port", server.http_port),
    ];
    if let Some(port) = metrics.port {
        ports.push(("metrics.port", port));
    }

    for &(field, port) in &ports {
        validate_port(field, port, report);
    }

    for (i, &(first, port)) in ports.iter().enumerate() {
        for &(second, other) in &ports[i + 1..] {
            if port != 0 && port == other {
                report.add_error(ValidationError::DuplicatePort {
                    first: first.to_string(),
                    second: second.to_string(),
                    port,
                });
            }
        }
    }

    validate_positive("server.idle_timeout_secs", server.idle_timeout_secs, report);
    validate_positive("server.request_timeout_secs", server.request_timeout_secs, report);
    validate_positive("server.shutdown_grace_secs", Some(server.shutdown_grace_secs), report);
}

fn validate_port(field: &str, port: u16, report: &mut ValidationReport) {
    if port == 0 {
        report.add_error(ValidationError::ZeroPort {
            field: field.to_string(),
        });
    } else if port < 1024 {
        report.add_warning(
            field,
            &format!("Port {} is privileged and needs elevated permissions", port),
        );
    }
}

fn validate_positive(field: &str, value: Option<u64>, report: &mut ValidationReport) {
    if value == Some(0) {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: field.to_string(),
        });
    }
}

fn validate_scale(scale: &ScaleConfig, report: &mut ValidationReport) {
    if !scale.initial_weight.is_finite() {
        report.add_error(ValidationError::InvalidInitialWeight(scale.initial_weight));
    } else if scale.initial_weight < 0.0 {
        report.add_warning(
            "scale.initial_weight",
            "Negative initial weight; the balance will report a negative load",
        );
    }
}

fn validate_logging(logging: &LoggingConfig, report: &mut ValidationReport) {
    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogLevel(logging.level.clone()));
    }

    if !LOG_FORMATS.contains(&logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(logging.format.clone()));
    }
}
