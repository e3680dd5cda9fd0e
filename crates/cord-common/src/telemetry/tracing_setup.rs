//! Tracing and logging setup
//!
//! `RUST_LOG` wins when set. Otherwise the filter is built from
//! [`TracingConfig::level`], with the gateway and REST crates raised to
//! `debug` when [`TracingConfig::verbose_client`] is on so heartbeats,
//! reconnects and rate-limit waits show up.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::Environment;

/// Crates whose internals [`TracingConfig::verbose_client`] turns up
const CLIENT_TARGETS: [&str; 3] = ["cord_gateway", "cord_rest", "cord_cache"];

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    /// One JSON object per line
    pub json: bool,
    pub span_events: bool,
    pub file_line: bool,
    pub thread_names: bool,
    /// Log the gateway, REST and cache crates at `debug`
    pub verbose_client: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            span_events: false,
            file_line: true,
            thread_names: false,
            verbose_client: false,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            span_events: true,
            file_line: true,
            thread_names: true,
            verbose_client: true,
        }
    }

    /// JSON lines without source locations
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json: true,
            span_events: false,
            file_line: false,
            thread_names: false,
            verbose_client: false,
        }
    }

    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Staging => Self::default(),
            Environment::Production => Self::production(),
        }
    }

    /// Pick a configuration from `CORD_ENV`
    #[must_use]
    pub fn from_env() -> Self {
        let env = std::env::var("CORD_ENV")
            .ok()
            .and_then(|value| match value.to_lowercase().as_str() {
                "production" => Some(Environment::Production),
                "staging" => Some(Environment::Staging),
                "development" => Some(Environment::Development),
                _ => None,
            })
            .unwrap_or_default();
        Self::for_environment(env)
    }

    /// Filter directives used when `RUST_LOG` is unset
    pub fn directives(&self) -> String {
        let mut directives = vec![self.level.to_string().to_lowercase()];
        if self.verbose_client {
            directives.extend(CLIENT_TARGETS.iter().map(|target| format!("{target}=debug")));
        }
        directives.join(",")
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = fmt::layer()
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_thread_names(self.thread_names)
            .with_span_events(span_events);
        if self.json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    }
}

/// Install a subscriber with the default configuration
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

/// Install a subscriber; fails if one is already set
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}

impl TracingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "TRACING_ALREADY_INITIALIZED",
        }
    }
}
