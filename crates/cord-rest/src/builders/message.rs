//! Message builder and updater

use cord_core::{DomainError, Snowflake};
use serde_json::{json, Value};
use uuid::Uuid;

use super::embed::MAX_TOTAL as MAX_EMBED_TOTAL;
use super::{Body, EmbedBuilder};
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

pub const MAX_CONTENT: usize = 2000;
pub const MAX_EMBEDS: usize = 10;

/// Mention kinds that are parsed out of the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentionType {
    Users,
    Roles,
    Everyone,
}

impl MentionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Everyone => "everyone",
        }
    }
}

/// Which mentions in a message actually notify
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMentions {
    parse: Vec<MentionType>,
    users: Vec<Snowflake>,
    roles: Vec<Snowflake>,
    replied_user: bool,
}

impl AllowedMentions {
    /// Nobody is pinged
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            parse: vec![MentionType::Users, MentionType::Roles, MentionType::Everyone],
            replied_user: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn parse(mut self, kind: MentionType) -> Self {
        if !self.parse.contains(&kind) {
            self.parse.push(kind);
        }
        self
    }

    #[must_use]
    pub fn user(mut self, user_id: Snowflake) -> Self {
        self.users.push(user_id);
        self
    }

    #[must_use]
    pub fn role(mut self, role_id: Snowflake) -> Self {
        self.roles.push(role_id);
        self
    }

    #[must_use]
    pub fn replied_user(mut self, mention: bool) -> Self {
        self.replied_user = mention;
        self
    }

    /// Explicit ids and the matching parse kind are mutually exclusive
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.users.is_empty() && self.parse.contains(&MentionType::Users) {
            return Err(DomainError::invalid(
                "allowed_mentions",
                "user ids cannot be combined with parsing users",
            ));
        }
        if !self.roles.is_empty() && self.parse.contains(&MentionType::Roles) {
            return Err(DomainError::invalid(
                "allowed_mentions",
                "role ids cannot be combined with parsing roles",
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        let ids = |ids: &[Snowflake]| ids.iter().map(ToString::to_string).collect::<Vec<_>>();
        json!({
            "parse": self.parse.iter().map(|kind| kind.as_str()).collect::<Vec<_>>(),
            "users": ids(&self.users),
            "roles": ids(&self.roles),
            "replied_user": self.replied_user,
        })
    }
}

/// The 6000 character limit applies to all embeds of a message combined
fn check_embeds(embeds: &[EmbedBuilder]) -> Result<(), DomainError> {
    if embeds.len() > MAX_EMBEDS {
        return Err(DomainError::TooManyItems {
            field: "embeds",
            max: MAX_EMBEDS,
        });
    }
    let total: usize = embeds.iter().map(EmbedBuilder::total_length).sum();
    if total > MAX_EMBED_TOTAL {
        return Err(DomainError::FieldTooLong {
            field: "embeds",
            max: MAX_EMBED_TOTAL,
        });
    }
    Ok(())
}

fn embeds_json(embeds: &[EmbedBuilder]) -> Result<Value, DomainError> {
    check_embeds(embeds)?;
    embeds
        .iter()
        .map(EmbedBuilder::to_body)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Sends a message
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    content: Option<String>,
    tts: bool,
    embeds: Vec<EmbedBuilder>,
    nonce: Option<String>,
    reply_to: Option<Snowflake>,
    allowed_mentions: Option<AllowedMentions>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a plain text message
    pub fn text(content: impl Into<String>) -> Self {
        Self::new().content(content)
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn append(mut self, text: impl AsRef<str>) -> Self {
        self.content
            .get_or_insert_with(String::new)
            .push_str(text.as_ref());
        self
    }

    #[must_use]
    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }

    #[must_use]
    pub fn embed(mut self, embed: EmbedBuilder) -> Self {
        self.embeds.push(embed);
        self
    }

    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: Snowflake) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    #[must_use]
    pub fn allowed_mentions(mut self, allowed_mentions: AllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let content = self.content.as_deref().unwrap_or_default();
        if content.is_empty() && self.embeds.is_empty() {
            return Err(DomainError::MissingField { field: "content" });
        }
        DomainError::check_max_len("content", content, MAX_CONTENT)?;
        check_embeds(&self.embeds)?;
        if let Some(allowed_mentions) = &self.allowed_mentions {
            allowed_mentions.validate()?;
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.opt("content", self.content.clone().filter(|c| !c.is_empty()));
        body.set("tts", self.tts);
        if !self.embeds.is_empty() {
            body.set("embeds", embeds_json(&self.embeds)?);
        }
        body.set(
            "nonce",
            self.nonce
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
        );
        body.opt(
            "message_reference",
            self.reply_to
                .map(|id| json!({ "message_id": id.to_string() })),
        );
        body.opt(
            "allowed_mentions",
            self.allowed_mentions.as_ref().map(AllowedMentions::to_json),
        );
        Ok(body.into_value())
    }

    /// `POST /channels/{channel}/messages`
    pub fn to_request(&self, channel_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::post(RestEndpoint::Message)
            .url_param(channel_id)
            .body(self.to_body()?))
    }
}

/// Edits a message the connected account sent
#[derive(Debug, Clone, Default)]
pub struct MessageUpdater {
    content: Option<Option<String>>,
    embeds: Option<Vec<EmbedBuilder>>,
    allowed_mentions: Option<AllowedMentions>,
}

impl MessageUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(Some(content.into()));
        self
    }

    #[must_use]
    pub fn remove_content(mut self) -> Self {
        self.content = Some(None);
        self
    }

    /// Replace all embeds; an empty list removes them
    #[must_use]
    pub fn embeds(mut self, embeds: Vec<EmbedBuilder>) -> Self {
        self.embeds = Some(embeds);
        self
    }

    #[must_use]
    pub fn embed(mut self, embed: EmbedBuilder) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }

    #[must_use]
    pub fn allowed_mentions(mut self, allowed_mentions: AllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(Some(content)) = &self.content {
            DomainError::check_max_len("content", content, MAX_CONTENT)?;
        }
        if let Some(embeds) = &self.embeds {
            check_embeds(embeds)?;
        }
        if let Some(allowed_mentions) = &self.allowed_mentions {
            allowed_mentions.validate()?;
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.nullable("content", self.content.clone());
        if let Some(embeds) = &self.embeds {
            body.set("embeds", embeds_json(embeds)?);
        }
        body.opt(
            "allowed_mentions",
            self.allowed_mentions.as_ref().map(AllowedMentions::to_json),
        );
        Ok(body.into_value())
    }

    /// `PATCH /channels/{channel}/messages/{message}`
    pub fn to_request(&self, channel_id: Snowflake, message_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::Message)
            .url_params([channel_id, message_id])
            .body(self.to_body()?))
    }
}
