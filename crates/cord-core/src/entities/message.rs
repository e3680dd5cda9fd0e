//! Message entity - a message sent in a server or private channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Embed, Emoji, Reaction};
use crate::value_objects::Snowflake;

/// Author of a message: a user or a webhook posing as one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAuthor {
    pub id: Snowflake,
    pub name: String,
    pub discriminator: String,
    pub avatar_hash: Option<String>,
    pub bot: bool,
    pub webhook_id: Option<Snowflake>,
}

impl MessageAuthor {
    #[inline]
    pub fn is_webhook(&self) -> bool {
        self.webhook_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub author: MessageAuthor,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub tts: bool,
    pub mention_everyone: bool,
    pub mentioned_user_ids: Vec<Snowflake>,
    pub mentioned_role_ids: Vec<Snowflake>,
    pub attachments: Vec<Attachment>,
    pub embeds: Vec<Embed>,
    pub reactions: Vec<Reaction>,
    pub pinned: bool,
    /// Raw message type
    pub kind: u8,
    pub nonce: Option<String>,
    pub referenced_message_id: Option<Snowflake>,
    /// Exempt from message cache trimming
    pub cached_forever: bool,
}

impl Message {
    pub fn reaction(&self, emoji: &Emoji) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.emoji.same_as(emoji))
    }

    /// Copy with one more reaction of `emoji`
    #[must_use]
    pub fn with_reaction_added(
        &self,
        emoji: &Emoji,
        by_me: bool,
        burst: bool,
        burst_colors: &[String],
    ) -> Self {
        let mut next = self.clone();
        match next.reactions.iter_mut().find(|r| r.emoji.same_as(emoji)) {
            Some(reaction) => *reaction = reaction.incremented(by_me, burst),
            None => next.reactions.push(Reaction::first(
                emoji.clone(),
                by_me,
                burst,
                burst_colors.to_vec(),
            )),
        }
        next
    }

    /// Copy with one reaction of `emoji` removed; empty reactions disappear
    #[must_use]
    pub fn with_reaction_removed(&self, emoji: &Emoji, by_me: bool, burst: bool) -> Self {
        let mut next = self.clone();
        if let Some(reaction) = next.reactions.iter_mut().find(|r| r.emoji.same_as(emoji)) {
            *reaction = reaction.decremented(by_me, burst);
        }
        next.reactions.retain(|r| r.count > 0);
        next
    }

    /// Copy without any reaction of `emoji`
    #[must_use]
    pub fn with_emoji_reactions_cleared(&self, emoji: &Emoji) -> Self {
        let mut next = self.clone();
        next.reactions.retain(|r| !r.emoji.same_as(emoji));
        next
    }

    #[must_use]
    pub fn with_all_reactions_cleared(&self) -> Self {
        let mut next = self.clone();
        next.reactions.clear();
        next
    }

    pub fn link(&self) -> String {
        let server = self
            .server_id
            .map_or_else(|| "@me".to_string(), |id| id.to_string());
        format!("https://discord.com/channels/{server}/{}/{}", self.channel_id, self.id)
    }
}
