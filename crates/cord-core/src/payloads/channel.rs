//! Channel payloads

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::RawUser;
use crate::entities::{Channel, ChannelType, PrivateChannel, ServerChannel};
use crate::value_objects::{OverwriteKind, PermissionOverwrite, Permissions, Snowflake};

/// Permission overwrite object; `type` 0 targets a role, 1 a member
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOverwrite {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

impl RawOverwrite {
    #[inline]
    pub fn overwrite(&self) -> PermissionOverwrite {
        PermissionOverwrite::new(self.allow, self.deny)
    }

    #[inline]
    pub fn target(&self) -> Option<OverwriteKind> {
        OverwriteKind::from_u8(self.kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChannel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub rate_limit_per_user: u32,
    #[serde(default)]
    pub bitrate: u32,
    #[serde(default)]
    pub user_limit: u32,
    #[serde(default)]
    pub permission_overwrites: Vec<RawOverwrite>,
    #[serde(default)]
    pub recipients: Vec<RawUser>,
    #[serde(default)]
    pub last_message_id: Option<Snowflake>,
}

impl RawChannel {
    /// Split the overwrite list into role and member maps
    pub fn overwrites(
        &self,
    ) -> (
        HashMap<Snowflake, PermissionOverwrite>,
        HashMap<Snowflake, PermissionOverwrite>,
    ) {
        let mut roles = HashMap::new();
        let mut members = HashMap::new();
        for raw in &self.permission_overwrites {
            match raw.target() {
                Some(OverwriteKind::Role) => {
                    roles.insert(raw.id, raw.overwrite());
                }
                Some(OverwriteKind::Member) => {
                    members.insert(raw.id, raw.overwrite());
                }
                None => {}
            }
        }
        (roles, members)
    }

    /// Build a server channel; `guild_id` in the payload wins over `server_id`
    pub fn to_server_channel(&self, server_id: Snowflake) -> ServerChannel {
        let (role_overwrites, member_overwrites) = self.overwrites();
        ServerChannel {
            id: self.id,
            server_id: self.guild_id.unwrap_or(server_id),
            kind: self.kind,
            name: self.name.clone().unwrap_or_default(),
            raw_position: self.position,
            parent_id: self.parent_id,
            nsfw: self.nsfw,
            topic: self.topic.clone().unwrap_or_default(),
            slowmode_secs: self.rate_limit_per_user,
            bitrate: self.bitrate,
            user_limit: self.user_limit,
            role_overwrites,
            member_overwrites,
        }
    }

    /// Convert into a cacheable channel.
    ///
    /// Group channels are not supported for bot accounts and yield `None`,
    /// as do private channels without a recipient.
    pub fn to_channel(&self, server_id: Option<Snowflake>) -> Option<Channel> {
        match self.kind {
            ChannelType::Private => self.recipients.first().map(|recipient| {
                Channel::Private(PrivateChannel {
                    id: self.id,
                    recipient_id: recipient.id,
                })
            }),
            ChannelType::Group => None,
            _ => {
                let server_id = self.guild_id.or(server_id)?;
                Some(Channel::Server(self.to_server_channel(server_id)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_channel_conversion() {
        let raw: RawChannel = serde_json::from_str(
            r#"{"id": "10", "type": 0, "guild_id": "1", "name": "general", "position": 3,
                "topic": null, "rate_limit_per_user": 5, "nsfw": true,
                "permission_overwrites": [
                    {"id": "1", "type": 0, "allow": "0", "deny": "1024"},
                    {"id": "7", "type": 1, "allow": "2048", "deny": "0"},
                    {"id": "8", "type": 9, "allow": "2048", "deny": "0"}
                ]}"#,
        )
        .unwrap();
        let channel = raw.to_channel(None).unwrap();
        let channel = channel.as_server().unwrap();
        assert_eq!(channel.server_id, Snowflake::new(1));
        assert_eq!(channel.kind, ChannelType::ServerText);
        assert_eq!(channel.raw_position, 3);
        assert_eq!(channel.topic, "");
        assert_eq!(channel.slowmode_secs, 5);
        assert!(channel.nsfw);
        assert_eq!(channel.role_overwrite(Snowflake::new(1)).denied, Permissions::VIEW_CHANNEL);
        assert_eq!(channel.member_overwrite(Snowflake::new(7)).allowed, Permissions::SEND_MESSAGES);
        assert_eq!(channel.role_overwrites.len() + channel.member_overwrites.len(), 2);
    }

    #[test]
    fn test_private_channel_conversion() {
        let raw: RawChannel = serde_json::from_str(
            r#"{"id": "20", "type": 1, "recipients": [{"id": "5", "username": "friend"}]}"#,
        )
        .unwrap();
        let channel = raw.to_channel(None).unwrap();
        assert_eq!(channel.as_private().unwrap().recipient_id, Snowflake::new(5));
    }

    #[test]
    fn test_unsupported_channels() {
        let group: RawChannel = serde_json::from_str(r#"{"id": "30", "type": 3}"#).unwrap();
        assert!(group.to_channel(None).is_none());

        let orphan: RawChannel = serde_json::from_str(r#"{"id": "31", "type": 2}"#).unwrap();
        assert!(orphan.to_channel(None).is_none());
        assert!(orphan.to_channel(Some(Snowflake::new(1))).is_some());
    }
}
