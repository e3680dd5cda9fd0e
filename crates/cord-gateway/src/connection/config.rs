//! Gateway connection settings

use std::time::Duration;

use cord_core::Intents;

use crate::protocol::PresenceUpdatePayload;

/// Settings for a single gateway connection
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: String,
    pub intents: Intents,
    pub shard: u32,
    pub total_shards: u32,
    pub api_version: u8,
    /// Skips the GATEWAY_BOT lookup when set
    pub gateway_url: Option<String>,
    /// Hold back READY until every unavailable server arrived
    pub wait_for_servers: bool,
    /// Give up waiting for servers after this long without progress
    pub startup_timeout: Duration,
    /// Minimum spacing between two IDENTIFY packets
    pub identify_interval: Duration,
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
    /// Presence sent with IDENTIFY
    pub presence: Option<PresenceUpdatePayload>,
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: Intents::non_privileged(),
            shard: 0,
            total_shards: 1,
            api_version: 10,
            gateway_url: None,
            wait_for_servers: true,
            startup_timeout: Duration::from_secs(60),
            identify_interval: Duration::from_millis(5100),
            reconnect_base_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(60),
            presence: None,
        }
    }

    /// Delay before reconnect attempt `attempt` (zero based)
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        self.reconnect_base_delay
            .saturating_mul(factor)
            .min(self.reconnect_max_delay)
    }

    /// Websocket url with the query Discord expects
    pub fn connect_url(&self, base: &str) -> String {
        format!(
            "{}/?encoding=json&v={}",
            base.trim_end_matches('/'),
            self.api_version
        )
    }
}
