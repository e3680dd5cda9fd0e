//! Login builder

use std::sync::Arc;

use cord_cache::Cache;
use cord_common::ClientConfig;
use cord_core::{Intents, ListenerScope};
use cord_gateway::{
    EventDispatcher, EventDispatcherConfig, EventListener, GatewayClient, GatewayConfig, HandlerContext,
    ListenerManager,
};
use cord_rest::RestClient;

use crate::api::DiscordApi;
use crate::error::{Error, Result};

const DEFAULT_REST_BASE_URL: &str = "https://discord.com/api";

/// Fluent configuration of a client, finished with [`login`](Self::login)
#[derive(Clone)]
pub struct DiscordApiBuilder {
    token: Option<String>,
    intents: Intents,
    shard: u32,
    total_shards: u32,
    wait_for_servers: bool,
    api_version: u8,
    message_cache_capacity: usize,
    message_cache_storage_secs: u64,
    rest_base_url: String,
    gateway_url: Option<String>,
    max_retries: u32,
    listeners: Vec<(ListenerScope, Arc<dyn EventListener>)>,
}

impl Default for DiscordApiBuilder {
    fn default() -> Self {
        Self {
            token: None,
            intents: Intents::non_privileged(),
            shard: 0,
            total_shards: 1,
            wait_for_servers: true,
            api_version: 10,
            message_cache_capacity: 50,
            message_cache_storage_secs: 43_200,
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            gateway_url: None,
            max_retries: 5,
            listeners: Vec::new(),
        }
    }
}

impl DiscordApiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from a [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            token: Some(config.token.clone()),
            intents: config.intents,
            shard: config.shard,
            total_shards: config.total_shards,
            wait_for_servers: config.wait_for_servers,
            api_version: config.api_version,
            message_cache_capacity: config.message_cache_capacity,
            message_cache_storage_secs: config.message_cache_storage_secs,
            rest_base_url: config.rest_base_url.clone(),
            gateway_url: config.gateway_url.clone(),
            max_retries: config.rest_max_retries,
            listeners: Vec::new(),
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }

    pub fn all_intents(self) -> Self {
        self.intents(Intents::all())
    }

    pub fn all_non_privileged_intents(self) -> Self {
        self.intents(Intents::non_privileged())
    }

    pub fn shard(mut self, current: u32, total: u32) -> Self {
        self.shard = current;
        self.total_shards = total;
        self
    }

    /// Whether READY waits for every server to be loaded
    pub fn wait_for_servers(mut self, wait: bool) -> Self {
        self.wait_for_servers = wait;
        self
    }

    pub fn api_version(mut self, version: u8) -> Self {
        self.api_version = version;
        self
    }

    /// Messages kept per channel and for how long
    pub fn message_cache(mut self, capacity: usize, storage_secs: u64) -> Self {
        self.message_cache_capacity = capacity;
        self.message_cache_storage_secs = storage_secs;
        self
    }

    pub fn rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    /// Connect here instead of asking Discord for the gateway url
    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Register a listener before connecting, so it sees the startup events
    pub fn add_listener(mut self, scope: ListenerScope, listener: Arc<dyn EventListener>) -> Self {
        self.listeners.push((scope, listener));
        self
    }

    fn validate(&self) -> Result<String> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingToken)?;
        if self.shard >= self.total_shards {
            return Err(cord_common::ConfigError::InvalidValue(
                "DISCORD_SHARD",
                format!("shard {} is out of range for {} shards", self.shard, self.total_shards),
            )
            .into());
        }
        Ok(token.to_string())
    }

    /// Connect to Discord and wait until the first READY is dispatched
    pub async fn login(self) -> Result<DiscordApi> {
        let token = self.validate()?;
        tracing::info!(
            shard = self.shard,
            total_shards = self.total_shards,
            intents = self.intents.bits(),
            "Logging in"
        );

        let rest = RestClient::new(token.clone(), self.rest_base_url.clone(), self.api_version)?
            .max_retries(self.max_retries);
        let cache = Cache::new_shared(self.message_cache_capacity, self.message_cache_storage_secs);

        let listeners = ListenerManager::new_shared();
        for (scope, listener) in self.listeners {
            listeners.add(scope, listener);
        }
        let dispatcher = Arc::new(EventDispatcher::new(
            Arc::clone(&listeners),
            EventDispatcherConfig::default(),
        ));
        let context = Arc::new(HandlerContext::new(
            Arc::clone(&cache),
            Arc::clone(&dispatcher),
            self.wait_for_servers,
        ));

        let mut config = GatewayConfig::new(token);
        config.intents = self.intents;
        config.shard = self.shard;
        config.total_shards = self.total_shards;
        config.api_version = self.api_version;
        config.gateway_url = self.gateway_url;
        config.wait_for_servers = self.wait_for_servers;

        let gateway = Arc::new(GatewayClient::new(config, rest.clone(), context)).start();
        if let Err(e) = gateway.wait_until_ready().await {
            gateway.disconnect();
            return Err(e.into());
        }

        Ok(DiscordApi::new(cache, rest, dispatcher, gateway))
    }
}

impl std::fmt::Debug for DiscordApiBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordApiBuilder")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("intents", &self.intents)
            .field("shard", &self.shard)
            .field("total_shards", &self.total_shards)
            .field("wait_for_servers", &self.wait_for_servers)
            .field("api_version", &self.api_version)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
