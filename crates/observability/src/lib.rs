//! Observability infrastructure for the MT-SICS simulator
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Optional Prometheus metrics
//! - Per-front-end metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("mtsim", LogFormat::Pretty, "info")?;
//!
//! // Optional
//! observability::init_metrics("0.0.0.0", 9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, parse_level, LogFormat, LOG_LEVELS};
pub use metrics::{init_metrics, ServerMetrics};
