//! Scheduled event entity - a server event planned for a stage, voice channel, or external location

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

id_enum! {
    pub enum ScheduledEventStatus {
        Scheduled = 1,
        Active = 2,
        Completed = 3,
        Canceled = 4,
    }
}

id_enum! {
    pub enum ScheduledEventEntityType {
        StageInstance = 1,
        Voice = 2,
        /// Requires an end time and a location
        External = 3,
    }
}

id_enum! {
    pub enum ScheduledEventPrivacyLevel {
        ServerOnly = 2,
    }
}

impl ScheduledEventEntityType {
    /// Stage and voice events are bound to a channel
    #[inline]
    pub fn requires_channel(self) -> bool {
        matches!(self, Self::StageInstance | Self::Voice)
    }
}

impl ScheduledEventStatus {
    /// Completed and canceled events can no longer change status
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

/// Scheduled event entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub id: Snowflake,
    pub server_id: Snowflake,
    pub channel_id: Option<Snowflake>,
    pub creator_id: Option<Snowflake>,
    pub name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub privacy_level: ScheduledEventPrivacyLevel,
    pub status: ScheduledEventStatus,
    pub entity_type: ScheduledEventEntityType,
    pub entity_id: Option<Snowflake>,
    /// Set for external events
    pub location: Option<String>,
    pub user_count: Option<u32>,
    pub image_hash: Option<String>,
}

impl ScheduledEvent {
    /// Whether the event is running at `now` according to its schedule and status
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduledEventStatus::Active
            && self.start_time <= now
            && self.end_time.is_none_or(|end| end > now)
    }
}
