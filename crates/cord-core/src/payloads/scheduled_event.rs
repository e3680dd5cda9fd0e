//! Scheduled event payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RawUser;
use crate::entities::{
    ScheduledEvent, ScheduledEventEntityType, ScheduledEventPrivacyLevel, ScheduledEventStatus,
};
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntityMetadata {
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScheduledEvent {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    #[serde(default)]
    pub creator_id: Option<Snowflake>,
    #[serde(default)]
    pub creator: Option<RawUser>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scheduled_start_time: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub privacy_level: ScheduledEventPrivacyLevel,
    pub status: ScheduledEventStatus,
    pub entity_type: ScheduledEventEntityType,
    #[serde(default)]
    pub entity_id: Option<Snowflake>,
    #[serde(default)]
    pub entity_metadata: Option<RawEntityMetadata>,
    #[serde(default)]
    pub user_count: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl RawScheduledEvent {
    pub fn to_event(&self) -> ScheduledEvent {
        ScheduledEvent {
            id: self.id,
            server_id: self.guild_id,
            channel_id: self.channel_id,
            creator_id: self.creator_id.or(self.creator.as_ref().map(|u| u.id)),
            name: self.name.clone(),
            description: self.description.clone(),
            start_time: self.scheduled_start_time,
            end_time: self.scheduled_end_time,
            privacy_level: self.privacy_level,
            status: self.status,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            location: self
                .entity_metadata
                .as_ref()
                .and_then(|m| m.location.clone()),
            user_count: self.user_count,
            image_hash: self.image.clone(),
        }
    }
}
