use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mtsim")]
#[command(about = "Headless MT-SICS balance simulator with an HTTP control plane")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the simulator
    ///
    /// Flags override values from the configuration file.
    Start {
        /// Path to the configuration file (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// TCP port for MT-SICS commands
        #[arg(short, long)]
        port: Option<u16>,

        /// HTTP control port for adjusting simulator state
        #[arg(long)]
        http_port: Option<u16>,

        /// Initial weight value reported by the simulator
        #[arg(short, long, allow_negative_numbers = true)]
        weight: Option<f64>,

        /// Start in an unstable state (S answers with S D)
        #[arg(long)]
        unstable: bool,

        /// Logging verbosity
        #[arg(long, value_enum, ignore_case = true)]
        log_level: Option<LogLevel>,

        /// Log output format
        #[arg(long, value_enum, ignore_case = true)]
        log_format: Option<LogFormatArg>,

        /// Close TCP sessions idle for this many seconds
        #[arg(long, value_name = "SECS")]
        idle_timeout: Option<u64>,

        /// Expose Prometheus metrics on this port
        #[arg(long)]
        metrics_port: Option<u16>,
    },

    /// Validate configuration without starting the simulator
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "config/mtsim.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "mtsim.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Critical => "critical",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per event
    Json,
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
