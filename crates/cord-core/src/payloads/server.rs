//! Server, role and emoji payloads

use serde::{Deserialize, Serialize};

use super::{nullable, RawChannel, RawMember, RawPresence, RawScheduledEvent};
use crate::entities::{
    BoostLevel, CustomEmoji, DefaultMessageNotificationLevel, Emoji, ExplicitContentFilterLevel,
    KnownCustomEmoji, MultiFactorAuthenticationLevel, NsfwLevel, Role, Server, VerificationLevel,
};
use crate::value_objects::{Permissions, Snowflake};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRole {
    pub id: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl RawRole {
    pub fn to_role(&self, server_id: Snowflake) -> Role {
        Role {
            id: self.id,
            server_id,
            name: self.name.clone(),
            color: self.color,
            hoist: self.hoist,
            mentionable: self.mentionable,
            managed: self.managed,
            permissions: self.permissions,
            raw_position: self.position,
        }
    }
}

/// Emoji object, as found in reactions, messages and server emoji lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEmoji {
    #[serde(default)]
    pub id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub roles: Option<Vec<Snowflake>>,
    #[serde(default = "default_true")]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

impl RawEmoji {
    pub fn to_emoji(&self) -> Emoji {
        Emoji::from_parts(self.id, self.name.clone(), self.animated)
    }

    /// Server-owned emoji; `None` for unicode emojis
    pub fn to_known(&self, server_id: Snowflake) -> Option<KnownCustomEmoji> {
        let id = self.id?;
        Some(KnownCustomEmoji {
            emoji: CustomEmoji {
                id,
                name: self.name.clone().unwrap_or_default(),
                animated: self.animated,
            },
            server_id,
            whitelisted_role_ids: self.roles.clone().filter(|roles| !roles.is_empty()),
            require_colons: self.require_colons,
            managed: self.managed,
            available: self.available,
        })
    }
}

/// Server (guild) object from GUILD_CREATE, GUILD_UPDATE and REST
///
/// Channel-reference fields use [`nullable`] so an update can tell "unset"
/// from "not sent".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawServer {
    pub id: Snowflake,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    #[serde(default)]
    pub discovery_splash: Option<String>,
    #[serde(default)]
    pub owner_id: Snowflake,
    #[serde(default)]
    pub application_id: Option<Snowflake>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub verification_level: u8,
    #[serde(default)]
    pub default_message_notifications: u8,
    #[serde(default)]
    pub explicit_content_filter: u8,
    #[serde(default)]
    pub mfa_level: u8,
    #[serde(default)]
    pub premium_tier: u8,
    #[serde(default)]
    pub nsfw_level: u8,
    #[serde(default)]
    pub preferred_locale: Option<String>,
    #[serde(default)]
    pub premium_subscription_count: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub system_channel_id: Option<Option<Snowflake>>,
    #[serde(default, deserialize_with = "nullable")]
    pub afk_channel_id: Option<Option<Snowflake>>,
    #[serde(default)]
    pub afk_timeout: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub rules_channel_id: Option<Option<Snowflake>>,
    #[serde(default, deserialize_with = "nullable")]
    pub public_updates_channel_id: Option<Option<Snowflake>>,
    #[serde(default)]
    pub member_count: Option<u32>,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub roles: Vec<RawRole>,
    #[serde(default)]
    pub channels: Vec<RawChannel>,
    #[serde(default)]
    pub threads: Vec<RawChannel>,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub emojis: Vec<RawEmoji>,
    #[serde(default)]
    pub presences: Vec<RawPresence>,
    #[serde(default)]
    pub guild_scheduled_events: Vec<RawScheduledEvent>,
}

impl RawServer {
    pub fn to_server(&self) -> Server {
        Server {
            id: self.id,
            name: self.name.clone(),
            icon_hash: self.icon.clone(),
            splash_hash: self.splash.clone(),
            discovery_splash_hash: self.discovery_splash.clone(),
            owner_id: self.owner_id,
            application_id: self.application_id,
            region: self.region.clone(),
            verification_level: VerificationLevel::from_id(self.verification_level),
            default_message_notification_level: DefaultMessageNotificationLevel::from_id(
                self.default_message_notifications,
            ),
            explicit_content_filter_level: ExplicitContentFilterLevel::from_id(
                self.explicit_content_filter,
            ),
            mfa_level: MultiFactorAuthenticationLevel::from_id(self.mfa_level),
            boost_level: BoostLevel::from_id(self.premium_tier),
            nsfw_level: NsfwLevel::from_id(self.nsfw_level),
            preferred_locale: self
                .preferred_locale
                .clone()
                .unwrap_or_else(|| "en-US".to_string()),
            boost_count: self.premium_subscription_count.unwrap_or(0),
            description: self.description.clone(),
            system_channel_id: self.system_channel_id.flatten(),
            afk_channel_id: self.afk_channel_id.flatten(),
            afk_timeout_secs: self.afk_timeout,
            rules_channel_id: self.rules_channel_id.flatten(),
            moderators_only_channel_id: self.public_updates_channel_id.flatten(),
            member_count: self
                .member_count
                .unwrap_or_else(|| u32::try_from(self.members.len()).unwrap_or(u32::MAX)),
            large: self.large,
        }
    }
}
