//! MT-SICS balance simulator binary
//!
//! Entry point for running the simulator and for initializing and
//! validating its configuration file.

use anyhow::{Context, Result};
use cli::{Cli, Commands, LogFormatArg, LogLevel};
use config::{
    generate_default_config, load_config, save_config, validate_config, SimulatorConfig,
};
use observability::{init_logging, init_metrics, LogFormat};
use scale::Scale;
use server::{
    validate_config_ports, Server, ServerConfig, ShutdownController, SimulatorServer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Default)]
struct StartOverrides {
    host: Option<String>,
    port: Option<u16>,
    http_port: Option<u16>,
    weight: Option<f64>,
    unstable: bool,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormatArg>,
    idle_timeout: Option<u64>,
    metrics_port: Option<u16>,
}

impl StartOverrides {
    fn apply(self, config: &mut SimulatorConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.tcp_port = port;
        }
        if let Some(port) = self.http_port {
            config.server.http_port = port;
        }
        if let Some(weight) = self.weight {
            config.scale.initial_weight = weight;
        }
        if self.unstable {
            config.scale.stable = false;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level.as_str().to_string();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format.as_str().to_string();
        }
        if let Some(secs) = self.idle_timeout {
            config.server.idle_timeout_secs = Some(secs);
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = Some(port);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start {
            config,
            host,
            port,
            http_port,
            weight,
            unstable,
            log_level,
            log_format,
            idle_timeout,
            metrics_port,
        } => {
            let overrides = StartOverrides {
                host,
                port,
                http_port,
                weight,
                unstable,
                log_level,
                log_format,
                idle_timeout,
                metrics_port,
            };
            start_simulator(config, overrides).await
        }
        Commands::Validate { config } => {
            init_logging("mtsim", LogFormat::Compact, "warn")?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging("mtsim", LogFormat::Compact, "warn")?;
            init_command(output)
        }
    }
}

async fn start_simulator(config_path: Option<PathBuf>, overrides: StartOverrides) -> Result<()> {
    let mut config = match config_path {
        Some(ref path) => load_config(path)?,
        None => generate_default_config(),
    };
    overrides.apply(&mut config);

    let format = LogFormat::parse(&config.logging.format)
        .with_context(|| format!("Unknown log format: {}", config.logging.format))?;
    init_logging("mtsim", format, &config.logging.level)?;

    info!("MT-SICS simulator starting...");
    debug!(?config, "Effective configuration");

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start simulator due to configuration errors");
    }

    if let Some(port) = config.metrics.port {
        init_metrics(&config.server.host, port).context("Failed to start metrics exporter")?;
    }

    let server_config = server_config(&config);
    validate_config_ports(&server_config)?;

    let scale = Arc::new(Scale::new(config.scale.initial_weight, config.scale.stable));
    let server = SimulatorServer::new(server_config, scale);
    server.validate_ports().await?;

    let shutdown = ShutdownController::with_ctrl_c();
    server.run(shutdown.token()).await?;

    info!("Simulator stopped");
    Ok(())
}

fn server_config(config: &SimulatorConfig) -> ServerConfig {
    let network = &config.server;
    ServerConfig::new(network.host.clone(), network.tcp_port, network.http_port)
        .with_greeting(network.greeting.clone())
        .with_idle_timeout(network.idle_timeout())
        .with_request_timeout(network.request_timeout())
        .with_shutdown_grace(network.shutdown_grace())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = load_config(&config_path)?;
    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("MT-SICS: {}:{}", config.server.host, config.server.tcp_port);
    println!("Control: http://{}:{}/state", config.server.host, config.server.http_port);
    println!(
        "Initial weight: {:.2} g ({})",
        config.scale.initial_weight,
        if config.scale.stable { "stable" } else { "unstable" }
    );

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&generate_default_config(), output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!(
        "  1. Run 'mtsim validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  2. Run 'mtsim start --config {:?}' to start the simulator",
        output_path
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = generate_default_config();
        StartOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(5000),
            weight: Some(12.5),
            unstable: true,
            log_level: Some(LogLevel::Warning),
            idle_timeout: Some(60),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.tcp_port, 5000);
        assert_eq!(config.server.http_port, 8081);
        assert_eq!(config.scale.initial_weight, 12.5);
        assert!(!config.scale.stable);
        assert_eq!(config.logging.level, "warning");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.server.idle_timeout_secs, Some(60));
        assert!(validate_config(&config).is_valid());
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let mut config = generate_default_config();
        config.scale.stable = false;
        StartOverrides::default().apply(&mut config);
        assert!(!config.scale.stable);
    }

    #[test]
    fn test_server_config_mapping() {
        let mut config = generate_default_config();
        config.server.greeting = Some("READY".to_string());
        config.server.request_timeout_secs = Some(5);

        let server = server_config(&config);
        assert_eq!(server.tcp_port, Some(4305));
        assert_eq!(server.http_port, Some(8081));
        assert_eq!(server.greeting.as_deref(), Some("READY"));
        assert_eq!(server.request_timeout, Some(Duration::from_secs(5)));
        assert!(server.idle_timeout.is_none());
        assert_eq!(server.shutdown_grace, Duration::from_secs(10));
    }
}
