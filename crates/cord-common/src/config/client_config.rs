//! Client configuration
//!
//! Loads the bot token and connection settings from environment variables
//! (and a `.env` file when present).

use std::env;
use std::fmt;

use cord_core::Intents;
use serde::Deserialize;

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Settings needed to log in and run a client
#[derive(Clone)]
pub struct ClientConfig {
    pub token: String,
    pub api_version: u8,
    pub intents: Intents,
    pub shard: u32,
    pub total_shards: u32,
    /// Hold back READY until every server of the initial READY was received
    pub wait_for_servers: bool,
    pub message_cache_capacity: usize,
    pub message_cache_storage_secs: u64,
    pub rest_max_retries: u32,
    pub rest_base_url: String,
    /// Overrides the URL returned by the gateway endpoint
    pub gateway_url: Option<String>,
    pub env: Environment,
}

// Default value functions
fn default_api_version() -> u8 {
    10
}

fn default_total_shards() -> u32 {
    1
}

fn default_message_cache_capacity() -> usize {
    50
}

fn default_message_cache_storage_secs() -> u64 {
    43_200 // 12 hours
}

fn default_rest_max_retries() -> u32 {
    5
}

fn default_rest_base_url() -> String {
    "https://discord.com/api".to_string()
}

impl ClientConfig {
    /// Configuration with defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_version: default_api_version(),
            intents: Intents::non_privileged(),
            shard: 0,
            total_shards: default_total_shards(),
            wait_for_servers: true,
            message_cache_capacity: default_message_cache_capacity(),
            message_cache_storage_secs: default_message_cache_storage_secs(),
            rest_max_retries: default_rest_max_retries(),
            rest_base_url: default_rest_base_url(),
            gateway_url: None,
            env: Environment::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `DISCORD_TOKEN` is missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidValue(name, raw))
                })
                .transpose()
        };
        let narrowed = |name: &'static str, value: u64| -> Result<u32, ConfigError> {
            u32::try_from(value).map_err(|_| ConfigError::InvalidValue(name, value.to_string()))
        };

        let token = lookup("DISCORD_TOKEN").ok_or(ConfigError::MissingVar("DISCORD_TOKEN"))?;

        let mut config = Self::new(token.trim());
        if let Some(version) = parsed("DISCORD_API_VERSION")? {
            config.api_version = u8::try_from(version)
                .map_err(|_| ConfigError::InvalidValue("DISCORD_API_VERSION", version.to_string()))?;
        }
        if let Some(bits) = parsed("DISCORD_INTENTS")? {
            config.intents = Intents::from_bits_truncate(narrowed("DISCORD_INTENTS", bits)?);
        }
        if let Some(shard) = parsed("DISCORD_SHARD")? {
            config.shard = narrowed("DISCORD_SHARD", shard)?;
        }
        if let Some(total) = parsed("DISCORD_TOTAL_SHARDS")? {
            config.total_shards = narrowed("DISCORD_TOTAL_SHARDS", total)?;
        }
        if let Some(raw) = lookup("DISCORD_WAIT_FOR_SERVERS") {
            config.wait_for_servers = match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(ConfigError::InvalidValue("DISCORD_WAIT_FOR_SERVERS", raw)),
            };
        }
        if let Some(capacity) = parsed("DISCORD_MESSAGE_CACHE_CAPACITY")? {
            config.message_cache_capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        }
        if let Some(secs) = parsed("DISCORD_MESSAGE_CACHE_STORAGE_SECS")? {
            config.message_cache_storage_secs = secs;
        }
        if let Some(retries) = parsed("DISCORD_REST_MAX_RETRIES")? {
            config.rest_max_retries = narrowed("DISCORD_REST_MAX_RETRIES", retries)?;
        }
        if let Some(url) = lookup("DISCORD_REST_BASE_URL") {
            config.rest_base_url = url.trim_end_matches('/').to_string();
        }
        config.gateway_url = lookup("DISCORD_GATEWAY_URL").filter(|url| !url.is_empty());
        config.env = lookup("CORD_ENV")
            .as_deref()
            .and_then(Environment::parse)
            .unwrap_or_default();

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make login fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::InvalidValue("DISCORD_TOKEN", "empty".to_string()));
        }
        if self.api_version < 6 {
            return Err(ConfigError::InvalidValue(
                "DISCORD_API_VERSION",
                self.api_version.to_string(),
            ));
        }
        if self.total_shards == 0 || self.shard >= self.total_shards {
            return Err(ConfigError::InvalidValue(
                "DISCORD_SHARD",
                format!("{} of {}", self.shard, self.total_shards),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("intents", &self.intents)
            .field("shard", &self.shard)
            .field("total_shards", &self.total_shards)
            .field("wait_for_servers", &self.wait_for_servers)
            .field("message_cache_capacity", &self.message_cache_capacity)
            .field("message_cache_storage_secs", &self.message_cache_storage_secs)
            .field("rest_max_retries", &self.rest_max_retries)
            .field("rest_base_url", &self.rest_base_url)
            .field("gateway_url", &self.gateway_url)
            .field("env", &self.env)
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingVar(_) => "MISSING_ENV",
            Self::InvalidValue(..) => "INVALID_CONFIG_VALUE",
        }
    }
}
