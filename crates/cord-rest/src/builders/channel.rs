//! Server channel builder and updater

use cord_core::{ChannelType, DomainError, OverwriteKind, PermissionOverwrite, Snowflake};
use serde_json::{json, Value};
use validator::Validate;

use super::{validate_fields, Body};
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

/// One permission overwrite of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverwriteEntry {
    pub id: Snowflake,
    pub kind: OverwriteKind,
    pub overwrite: PermissionOverwrite,
}

impl OverwriteEntry {
    pub fn role(id: Snowflake, overwrite: PermissionOverwrite) -> Self {
        Self {
            id,
            kind: OverwriteKind::Role,
            overwrite,
        }
    }

    pub fn member(id: Snowflake, overwrite: PermissionOverwrite) -> Self {
        Self {
            id,
            kind: OverwriteKind::Member,
            overwrite,
        }
    }

    fn to_json(self) -> Value {
        json!({
            "id": self.id.to_string(),
            "type": self.kind.as_u8(),
            "allow": self.overwrite.allowed.to_string(),
            "deny": self.overwrite.denied.to_string(),
        })
    }
}

/// Replace an existing entry for the same target or append
fn upsert(overwrites: &mut Vec<OverwriteEntry>, entry: OverwriteEntry) {
    match overwrites
        .iter_mut()
        .find(|e| e.id == entry.id && e.kind == entry.kind)
    {
        Some(existing) => *existing = entry,
        None => overwrites.push(entry),
    }
}

/// Checks shared by the builder and the updater
fn check_kind_specific(kind: Option<ChannelType>, bitrate: Option<u32>, user_limit: Option<u32>) -> Result<(), DomainError> {
    if let Some(kind) = kind {
        if !kind.is_server_channel() {
            return Err(DomainError::invalid("type", "not a server channel type"));
        }
        if (bitrate.is_some() || user_limit.is_some()) && !kind.is_voice() {
            return Err(DomainError::invalid(
                "bitrate",
                "bitrate and user limit only apply to voice channels",
            ));
        }
    }
    Ok(())
}

/// Creates a server channel
#[derive(Debug, Clone, Validate)]
pub struct ServerChannelBuilder {
    #[validate(length(min = 1, max = 100, message = "Channel name must be 1-100 characters"))]
    name: String,
    kind: ChannelType,
    #[validate(length(max = 1024, message = "Topic must be at most 1024 characters"))]
    topic: Option<String>,
    nsfw: Option<bool>,
    #[validate(range(max = 21600, message = "Slowmode must be 0-21600 seconds"))]
    slowmode_secs: Option<u32>,
    #[validate(range(min = 8000, message = "Bitrate must be at least 8000"))]
    bitrate: Option<u32>,
    #[validate(range(max = 99, message = "User limit must be 0-99"))]
    user_limit: Option<u32>,
    parent_id: Option<Snowflake>,
    position: Option<i32>,
    overwrites: Vec<OverwriteEntry>,
    audit_log_reason: Option<String>,
}

impl ServerChannelBuilder {
    pub fn new(name: impl Into<String>, kind: ChannelType) -> Self {
        Self {
            name: name.into(),
            kind,
            topic: None,
            nsfw: None,
            slowmode_secs: None,
            bitrate: None,
            user_limit: None,
            parent_id: None,
            position: None,
            overwrites: Vec::new(),
            audit_log_reason: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ChannelType::ServerText)
    }

    pub fn voice(name: impl Into<String>) -> Self {
        Self::new(name, ChannelType::ServerVoice)
    }

    pub fn category(name: impl Into<String>) -> Self {
        Self::new(name, ChannelType::Category)
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = Some(nsfw);
        self
    }

    #[must_use]
    pub fn slowmode(mut self, secs: u32) -> Self {
        self.slowmode_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    #[must_use]
    pub fn user_limit(mut self, limit: u32) -> Self {
        self.user_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn parent(mut self, category_id: Snowflake) -> Self {
        self.parent_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn overwrite(mut self, entry: OverwriteEntry) -> Self {
        upsert(&mut self.overwrites, entry);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        check_kind_specific(Some(self.kind), self.bitrate, self.user_limit)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.set("name", self.name.clone());
        body.set("type", self.kind.as_u8());
        body.opt("topic", self.topic.clone());
        body.opt("nsfw", self.nsfw);
        body.opt("rate_limit_per_user", self.slowmode_secs);
        body.opt("bitrate", self.bitrate);
        body.opt("user_limit", self.user_limit);
        body.opt("parent_id", self.parent_id.map(|id| id.to_string()));
        body.opt("position", self.position);
        if !self.overwrites.is_empty() {
            body.set(
                "permission_overwrites",
                self.overwrites.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            );
        }
        Ok(body.into_value())
    }

    /// `POST /guilds/{server}/channels`
    pub fn to_request(&self, server_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::post(RestEndpoint::ServerChannel)
            .url_param(server_id)
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}

/// Changes a server channel
#[derive(Debug, Clone, Default, Validate)]
pub struct ServerChannelUpdater {
    #[validate(length(min = 1, max = 100, message = "Channel name must be 1-100 characters"))]
    name: Option<String>,
    /// Only used to check kind-specific fields, never sent
    kind: Option<ChannelType>,
    #[validate(length(max = 1024, message = "Topic must be at most 1024 characters"))]
    topic: Option<String>,
    nsfw: Option<bool>,
    #[validate(range(max = 21600, message = "Slowmode must be 0-21600 seconds"))]
    slowmode_secs: Option<u32>,
    #[validate(range(min = 8000, message = "Bitrate must be at least 8000"))]
    bitrate: Option<u32>,
    #[validate(range(max = 99, message = "User limit must be 0-99"))]
    user_limit: Option<u32>,
    parent_id: Option<Option<Snowflake>>,
    position: Option<i32>,
    overwrites: Option<Vec<OverwriteEntry>>,
    audit_log_reason: Option<String>,
}

impl ServerChannelUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updater that checks fields against the channel's type
    pub fn for_kind(kind: ChannelType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = Some(nsfw);
        self
    }

    #[must_use]
    pub fn slowmode(mut self, secs: u32) -> Self {
        self.slowmode_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    #[must_use]
    pub fn user_limit(mut self, limit: u32) -> Self {
        self.user_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn parent(mut self, category_id: Snowflake) -> Self {
        self.parent_id = Some(Some(category_id));
        self
    }

    #[must_use]
    pub fn remove_parent(mut self) -> Self {
        self.parent_id = Some(None);
        self
    }

    #[must_use]
    pub fn position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    /// Set an overwrite; the channel's overwrites are replaced by the collected list
    #[must_use]
    pub fn overwrite(mut self, entry: OverwriteEntry) -> Self {
        upsert(self.overwrites.get_or_insert_with(Vec::new), entry);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        check_kind_specific(self.kind, self.bitrate, self.user_limit)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.opt("name", self.name.clone());
        body.opt("topic", self.topic.clone());
        body.opt("nsfw", self.nsfw);
        body.opt("rate_limit_per_user", self.slowmode_secs);
        body.opt("bitrate", self.bitrate);
        body.opt("user_limit", self.user_limit);
        body.nullable("parent_id", self.parent_id.map(|id| id.map(|id| id.to_string())));
        body.opt("position", self.position);
        if let Some(overwrites) = &self.overwrites {
            body.set(
                "permission_overwrites",
                overwrites.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            );
        }
        Ok(body.into_value())
    }

    /// `PATCH /channels/{channel}`
    pub fn to_request(&self, channel_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::Channel)
            .url_param(channel_id)
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}
