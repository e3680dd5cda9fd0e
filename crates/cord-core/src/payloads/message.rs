//! Message and reaction payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RawEmoji, RawMember, RawUser};
use crate::entities::{Attachment, Embed, Message, MessageAuthor, Reaction};
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RawCountDetails {
    #[serde(default)]
    pub burst: u32,
    #[serde(default)]
    pub normal: u32,
}

/// Reaction summary attached to a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReaction {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub count_details: Option<RawCountDetails>,
    #[serde(default)]
    pub me: bool,
    #[serde(default)]
    pub me_burst: bool,
    pub emoji: RawEmoji,
    #[serde(default)]
    pub burst_colors: Vec<String>,
}

impl RawReaction {
    pub fn to_reaction(&self) -> Reaction {
        let details = self.count_details.unwrap_or(RawCountDetails {
            burst: 0,
            normal: self.count,
        });
        Reaction {
            emoji: self.emoji.to_emoji(),
            count: self.count,
            normal_count: details.normal,
            burst_count: details.burst,
            me: self.me,
            me_burst: self.me_burst,
            burst_colors: self.burst_colors.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessageReference {
    #[serde(default)]
    pub message_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
}

/// Message object from MESSAGE_CREATE and REST.
///
/// MESSAGE_UPDATE sends a partial object, so everything but the ids may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub author: Option<RawUser>,
    #[serde(default)]
    pub member: Option<RawMember>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tts: bool,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub mentions: Vec<RawUser>,
    #[serde(default)]
    pub mention_roles: Vec<Snowflake>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Option<Vec<Embed>>,
    #[serde(default)]
    pub reactions: Vec<RawReaction>,
    /// String or integer, depending on the sender
    #[serde(default)]
    pub nonce: Option<Value>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub webhook_id: Option<Snowflake>,
    #[serde(default)]
    pub message_reference: Option<RawMessageReference>,
}

impl RawMessage {
    pub fn nonce_string(&self) -> Option<String> {
        match self.nonce.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Convert a full message object; `None` when the author is missing
    pub fn to_message(&self) -> Option<Message> {
        let author = self.author.as_ref()?;
        Some(Message {
            id: self.id,
            channel_id: self.channel_id,
            server_id: self.guild_id,
            author: MessageAuthor {
                id: author.id,
                name: author.username.clone().unwrap_or_default(),
                discriminator: author
                    .discriminator
                    .clone()
                    .unwrap_or_else(|| "0".to_string()),
                avatar_hash: author.avatar.clone(),
                bot: author.bot,
                webhook_id: self.webhook_id,
            },
            content: self.content.clone().unwrap_or_default(),
            created_at: self.timestamp.unwrap_or_else(|| self.id.created_at()),
            edited_at: self.edited_timestamp,
            tts: self.tts,
            mention_everyone: self.mention_everyone,
            mentioned_user_ids: self.mentions.iter().map(|u| u.id).collect(),
            mentioned_role_ids: self.mention_roles.clone(),
            attachments: self.attachments.clone(),
            embeds: self.embeds.clone().unwrap_or_default(),
            reactions: self.reactions.iter().map(RawReaction::to_reaction).collect(),
            pinned: self.pinned,
            kind: self.kind,
            nonce: self.nonce_string(),
            referenced_message_id: self
                .message_reference
                .as_ref()
                .and_then(|r| r.message_id),
            cached_forever: false,
        })
    }

    /// Apply the fields of a partial update to a cached message
    pub fn merge_into(&self, message: &Message) -> Message {
        let mut next = message.clone();
        if let Some(content) = &self.content {
            next.content.clone_from(content);
        }
        if self.edited_timestamp.is_some() {
            next.edited_at = self.edited_timestamp;
        }
        if let Some(embeds) = &self.embeds {
            next.embeds.clone_from(embeds);
        }
        if self.author.is_some() {
            next.pinned = self.pinned;
            next.mention_everyone = self.mention_everyone;
            next.mentioned_user_ids = self.mentions.iter().map(|u| u.id).collect();
            next.mentioned_role_ids.clone_from(&self.mention_roles);
            next.attachments.clone_from(&self.attachments);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Emoji;

    const MESSAGE: &str = r#"{
        "id": "175928847299117063",
        "channel_id": "20",
        "guild_id": "1",
        "author": {"id": "5", "username": "ferris", "discriminator": "0001"},
        "content": "hi <@6>",
        "timestamp": "2016-04-30T11:18:25.796000+00:00",
        "mentions": [{"id": "6", "username": "other"}],
        "mention_roles": ["9"],
        "embeds": [{"title": "t"}],
        "reactions": [{"count": 3, "count_details": {"burst": 1, "normal": 2}, "me": true,
                       "emoji": {"id": null, "name": "🔥"}}],
        "nonce": 1234,
        "message_reference": {"message_id": "99"}
    }"#;

    #[test]
    fn test_message_conversion() {
        let raw: RawMessage = serde_json::from_str(MESSAGE).unwrap();
        let message = raw.to_message().unwrap();
        assert_eq!(message.server_id, Some(Snowflake::new(1)));
        assert_eq!(message.author.name, "ferris");
        assert_eq!(message.mentioned_user_ids, vec![Snowflake::new(6)]);
        assert_eq!(message.mentioned_role_ids, vec![Snowflake::new(9)]);
        assert_eq!(message.embeds.len(), 1);
        assert_eq!(message.nonce.as_deref(), Some("1234"));
        assert_eq!(message.referenced_message_id, Some(Snowflake::new(99)));
        assert_eq!(message.created_at, message.id.created_at());

        let fire = message.reaction(&Emoji::from("🔥")).unwrap();
        assert_eq!(fire.count, 3);
        assert_eq!(fire.burst_count, 1);
        assert_eq!(fire.normal_count, 2);
        assert!(fire.me);
    }

    #[test]
    fn test_partial_update_merge() {
        let raw: RawMessage = serde_json::from_str(MESSAGE).unwrap();
        let message = raw.to_message().unwrap();

        let update: RawMessage = serde_json::from_str(
            r#"{"id": "175928847299117063", "channel_id": "20", "content": "edited",
                "edited_timestamp": "2016-05-01T00:00:00+00:00"}"#,
        )
        .unwrap();
        assert!(update.to_message().is_none());

        let merged = update.merge_into(&message);
        assert_eq!(merged.content, "edited");
        assert!(merged.edited_at.is_some());
        assert_eq!(merged.embeds, message.embeds);
        assert_eq!(merged.mentioned_user_ids, message.mentioned_user_ids);
    }
}
