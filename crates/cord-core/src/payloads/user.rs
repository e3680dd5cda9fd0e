//! User, member and presence payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Activity, ClientStatus, Member, Presence, User, UserStatus};
use crate::value_objects::Snowflake;

/// User object; partial in presence and member updates, where only `id` is guaranteed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUser {
    pub id: Snowflake,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl RawUser {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            name: self.username.clone().unwrap_or_default(),
            discriminator: self.discriminator.clone().unwrap_or_else(|| "0".to_string()),
            global_name: self.global_name.clone(),
            avatar_hash: self.avatar.clone(),
            bot: self.bot,
        }
    }

    /// Whether the object carries user data beyond the id
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.username.is_none()
    }

    /// Overlay the fields present in this (possibly partial) object onto `user`.
    ///
    /// A partial object never clears the avatar.
    pub fn merge_into(&self, user: &User) -> User {
        if self.is_partial() {
            return user.clone();
        }
        User {
            id: user.id,
            name: self.username.clone().unwrap_or_else(|| user.name.clone()),
            discriminator: self
                .discriminator
                .clone()
                .unwrap_or_else(|| user.discriminator.clone()),
            global_name: self.global_name.clone(),
            avatar_hash: self.avatar.clone(),
            bot: user.bot,
        }
    }
}

/// Server member object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMember {
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub premium_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub communication_disabled_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub deaf: bool,
}

impl RawMember {
    #[inline]
    pub fn user_id(&self) -> Option<Snowflake> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Convert into a member; `None` when the object lacks its user
    pub fn to_member(&self, server_id: Snowflake) -> Option<Member> {
        let user_id = self.user_id()?;
        Some(self.to_member_of(server_id, user_id))
    }

    /// Convert for payloads that carry the user id outside the member object
    pub fn to_member_of(&self, server_id: Snowflake, user_id: Snowflake) -> Member {
        Member {
            server_id,
            user_id,
            nickname: self.nick.clone(),
            role_ids: self
                .roles
                .iter()
                .copied()
                .filter(|id| *id != server_id)
                .collect(),
            joined_at: self.joined_at,
            premium_since: self.premium_since,
            timeout_until: self.communication_disabled_until,
            server_avatar_hash: self.avatar.clone(),
            pending: self.pending,
            muted: self.mute,
            deafened: self.deaf,
            self_muted: false,
            self_deafened: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawClientStatus {
    #[serde(default)]
    pub desktop: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub web: Option<String>,
}

/// Activity object, kept separate so unknown activity shapes never fail a presence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawActivity(pub serde_json::Value);

impl RawActivity {
    pub fn to_activity(&self) -> Option<Activity> {
        serde_json::from_value(self.0.clone()).ok()
    }
}

/// Presence update object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPresence {
    pub user: RawUser,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub activities: Vec<RawActivity>,
    #[serde(default)]
    pub client_status: RawClientStatus,
}

impl RawPresence {
    pub fn to_presence(&self) -> Presence {
        let status = |value: &Option<String>| {
            value
                .as_deref()
                .map_or(UserStatus::Offline, UserStatus::from_str_lossy)
        };
        Presence {
            user_id: self.user.id,
            status: status(&self.status),
            client_status: ClientStatus {
                desktop: status(&self.client_status.desktop),
                mobile: status(&self.client_status.mobile),
                web: status(&self.client_status.web),
            },
            activities: self
                .activities
                .iter()
                .filter_map(RawActivity::to_activity)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ActivityType;

    #[test]
    fn test_user_conversion() {
        let raw: RawUser = serde_json::from_str(
            r#"{"id": "80351110224678912", "username": "Nelly", "discriminator": "1337",
                "avatar": "8342729096ea3675442027381ff50dfe", "bot": true}"#,
        )
        .unwrap();
        let user = raw.to_user();
        assert_eq!(user.id, Snowflake::new(80_351_110_224_678_912));
        assert_eq!(user.discriminated_name(), "Nelly#1337");
        assert!(user.bot);
    }

    #[test]
    fn test_partial_user_merge_keeps_existing() {
        let existing = User::new(Snowflake::new(1), "old");
        let partial: RawUser = serde_json::from_str(r#"{"id": "1"}"#).unwrap();
        assert!(partial.is_partial());
        assert_eq!(partial.merge_into(&existing), existing);

        let full: RawUser =
            serde_json::from_str(r#"{"id": "1", "username": "new", "avatar": "h"}"#).unwrap();
        let merged = full.merge_into(&existing);
        assert_eq!(merged.name, "new");
        assert_eq!(merged.avatar_hash.as_deref(), Some("h"));
        assert_eq!(merged.discriminator, "0");
    }

    #[test]
    fn test_member_conversion_strips_everyone() {
        let raw: RawMember = serde_json::from_str(
            r#"{"user": {"id": "2", "username": "u"}, "nick": "n",
                "roles": ["10", "11", "1"], "joined_at": "2024-01-01T00:00:00+00:00",
                "pending": true, "mute": true}"#,
        )
        .unwrap();
        let member = raw.to_member(Snowflake::new(1)).unwrap();
        assert_eq!(member.user_id, Snowflake::new(2));
        assert_eq!(member.nickname.as_deref(), Some("n"));
        assert_eq!(member.role_ids, vec![Snowflake::new(10), Snowflake::new(11)]);
        assert!(member.pending);
        assert!(member.muted);
        assert!(member.joined_at.is_some());
    }

    #[test]
    fn test_member_without_user() {
        let raw = RawMember::default();
        assert!(raw.to_member(Snowflake::new(1)).is_none());
        let member = raw.to_member_of(Snowflake::new(1), Snowflake::new(3));
        assert_eq!(member.user_id, Snowflake::new(3));
    }

    #[test]
    fn test_presence_conversion() {
        let raw: RawPresence = serde_json::from_str(
            r#"{"user": {"id": "5"}, "status": "dnd",
                "activities": [{"type": 0, "name": "Chess"}, {"broken": true}],
                "client_status": {"desktop": "dnd"}}"#,
        )
        .unwrap();
        let presence = raw.to_presence();
        assert_eq!(presence.status, UserStatus::DoNotDisturb);
        assert_eq!(presence.client_status.desktop, UserStatus::DoNotDisturb);
        assert_eq!(presence.client_status.mobile, UserStatus::Offline);
        assert_eq!(presence.activities.len(), 1);
        assert_eq!(presence.activities[0].kind, ActivityType::Playing);
    }
}
