//! Logging initialization and configuration
//!
//! Installs the `tracing-subscriber` registry used by the simulator binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    #[default]
    Pretty,
    /// JSON format for structured logging
    Json,
    /// Compact format (less verbose than pretty)
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown log format: {}", s))
    }
}

/// Log levels accepted for the `level` setting
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Normalize a log level name.
///
/// Accepts the tracing names case-insensitively plus the `warning` and
/// `critical` spellings some test harnesses pass through.
pub fn parse_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "critical" | "error" => Some("error"),
        "warning" | "warn" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}

/// Initialize the logging system
///
/// `level` is the default filter; `RUST_LOG` takes precedence when set.
///
/// # Example
///
/// ```ignore
/// use observability::{init_logging, LogFormat};
///
/// init_logging("mtsim", LogFormat::Pretty, "debug")?;
/// tracing::info!("Simulator started");
/// ```
///
/// # Environment Variables
///
/// * `RUST_LOG` - Overrides the level (e.g., `info`, `server=debug,info`)
pub fn init_logging(service_name: &str, format: LogFormat, level: &str) -> anyhow::Result<()> {
    let default_level = parse_level(level)
        .ok_or_else(|| anyhow::anyhow!("unknown log level: {}", level))?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_ansi(true),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .try_init()?;
        }
    }

    tracing::info!(
        service = service_name,
        format = ?format,
        level = default_level,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("PRETTY"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("invalid"), None);

        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("invalid".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.as_str(), "json");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Some("info"));
        assert_eq!(parse_level("WARNING"), Some("warn"));
        assert_eq!(parse_level("critical"), Some("error"));
        assert_eq!(parse_level("Debug"), Some("debug"));
        assert_eq!(parse_level("verbose"), None);
        for level in LOG_LEVELS {
            assert_eq!(parse_level(level), Some(level));
        }
    }

    #[test]
    fn test_init_logging_rejects_unknown_level() {
        assert!(init_logging("test", LogFormat::Compact, "loud").is_err());
    }
}
