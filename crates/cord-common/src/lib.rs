//! # cord-common
//!
//! Shared utilities: client configuration loaded from the environment and
//! tracing subscriber setup.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ClientConfig, ConfigError, Environment};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
