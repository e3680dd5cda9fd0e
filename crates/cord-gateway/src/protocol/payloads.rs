//! Gateway payload types
//!
//! Data carried in the `d` field of gateway messages.

use cord_core::entities::{Activity, UserStatus};
use cord_core::{Intents, Snowflake};
use serde::{Deserialize, Serialize};

/// Servers that share a single REQUEST_GUILD_MEMBERS packet
pub const MEMBER_REQUEST_BATCH: usize = 50;

// =============================================================================
// Receive Payloads
// =============================================================================

/// Hello payload (op=10)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// READY dispatch
///
/// Only the parts the connection needs itself; the cache handler parses
/// the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

// =============================================================================
// Send Payloads
// =============================================================================

/// Identify properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "cord".to_string(),
            device: "cord".to_string(),
        }
    }
}

/// Initial presence sent with IDENTIFY and on presence updates (op=3)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// Unix ms since the client went idle
    pub since: Option<u64>,
    pub activities: Vec<Activity>,
    pub status: UserStatus,
    pub afk: bool,
}

impl PresenceUpdatePayload {
    #[must_use]
    pub fn new(status: UserStatus, activity: Option<Activity>) -> Self {
        Self {
            since: None,
            activities: activity.into_iter().collect(),
            status,
            afk: false,
        }
    }
}

impl Default for PresenceUpdatePayload {
    fn default() -> Self {
        Self::new(UserStatus::Online, None)
    }
}

/// Identify payload (op=2)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub properties: IdentifyProperties,
    pub large_threshold: u32,
    pub compress: bool,
    /// Bitmask of [`Intents`]
    pub intents: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceUpdatePayload>,
}

impl IdentifyPayload {
    /// Shard info is only sent when there is more than one shard
    #[must_use]
    pub fn new(token: impl Into<String>, intents: Intents, shard: u32, total_shards: u32) -> Self {
        Self {
            token: token.into(),
            properties: IdentifyProperties::default(),
            large_threshold: 250,
            compress: false,
            intents: intents.bits(),
            shard: (total_shards > 1).then_some([shard, total_shards]),
            presence: None,
        }
    }

    #[must_use]
    pub fn with_presence(mut self, presence: PresenceUpdatePayload) -> Self {
        self.presence = Some(presence);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: IdentifyProperties) -> Self {
        self.properties = properties;
        self
    }
}

/// Resume payload (op=6)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    pub token: String,
    pub session_id: String,
    /// Last sequence number received
    pub seq: u64,
}

/// Request guild members payload (op=8)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestGuildMembersPayload {
    pub guild_id: Vec<Snowflake>,
    /// Empty string requests every member
    pub query: String,
    /// 0 means no limit
    pub limit: u32,
    pub presences: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl RequestGuildMembersPayload {
    /// Split a request for many servers into packets of at most 50 servers
    #[must_use]
    pub fn batched(server_ids: &[Snowflake], presences: bool) -> Vec<Self> {
        server_ids
            .chunks(MEMBER_REQUEST_BATCH)
            .map(|chunk| Self {
                guild_id: chunk.to_vec(),
                query: String::new(),
                limit: 0,
                presences,
                nonce: None,
            })
            .collect()
    }
}
