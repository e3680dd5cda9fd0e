//! Presence - a user's online status and activities

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Online status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Idle,
    #[serde(rename = "dnd")]
    DoNotDisturb,
    Invisible,
    #[default]
    Offline,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
            Self::Offline => "offline",
        }
    }

    /// Unknown values count as offline
    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "online" => Self::Online,
            "idle" => Self::Idle,
            "dnd" => Self::DoNotDisturb,
            "invisible" => Self::Invisible,
            _ => Self::Offline,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status per client platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientStatus {
    pub desktop: UserStatus,
    pub mobile: UserStatus,
    pub web: UserStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ActivityType {
    #[default]
    Playing,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
    Unknown(u8),
}

impl From<u8> for ActivityType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Playing,
            1 => Self::Streaming,
            2 => Self::Listening,
            3 => Self::Watching,
            4 => Self::Custom,
            5 => Self::Competing,
            other => Self::Unknown(other),
        }
    }
}

impl From<ActivityType> for u8 {
    fn from(value: ActivityType) -> Self {
        match value {
            ActivityType::Playing => 0,
            ActivityType::Streaming => 1,
            ActivityType::Listening => 2,
            ActivityType::Watching => 3,
            ActivityType::Custom => 4,
            ActivityType::Competing => 5,
            ActivityType::Unknown(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub kind: ActivityType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Activity {
    pub fn new(kind: ActivityType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            url: None,
            details: None,
            state: None,
        }
    }
}

/// Last known presence of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: Snowflake,
    pub status: UserStatus,
    pub client_status: ClientStatus,
    pub activities: Vec<Activity>,
}

impl Presence {
    pub fn offline(user_id: Snowflake) -> Self {
        Self {
            user_id,
            status: UserStatus::Offline,
            client_status: ClientStatus::default(),
            activities: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(UserStatus::from_str_lossy("dnd"), UserStatus::DoNotDisturb);
        assert_eq!(UserStatus::from_str_lossy("garbage"), UserStatus::Offline);
        assert_eq!(UserStatus::DoNotDisturb.to_string(), "dnd");
        assert_eq!(serde_json::to_string(&UserStatus::Idle).unwrap(), "\"idle\"");
        let parsed: UserStatus = serde_json::from_str("\"dnd\"").unwrap();
        assert_eq!(parsed, UserStatus::DoNotDisturb);
    }

    #[test]
    fn test_activity_json() {
        let activity: Activity =
            serde_json::from_str(r#"{"type": 2, "name": "Spotify", "state": "Artist"}"#).unwrap();
        assert_eq!(activity.kind, ActivityType::Listening);
        assert_eq!(activity.state.as_deref(), Some("Artist"));

        let json = serde_json::to_value(Activity::new(ActivityType::Watching, "you")).unwrap();
        assert_eq!(json, serde_json::json!({"type": 3, "name": "you"}));
    }
}
