//! Member updater

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use cord_core::{DomainError, Snowflake};
use serde_json::Value;

use super::Body;
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

/// Longest timeout Discord allows
pub const MAX_TIMEOUT_DAYS: i64 = 28;

/// Changes a server member
#[derive(Debug, Clone, Default)]
pub struct MemberUpdater {
    nickname: Option<Option<String>>,
    role_ids: Option<Vec<Snowflake>>,
    muted: Option<bool>,
    deafened: Option<bool>,
    voice_channel_id: Option<Option<Snowflake>>,
    timeout_until: Option<Option<DateTime<Utc>>>,
    audit_log_reason: Option<String>,
}

impl MemberUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(Some(nickname.into()));
        self
    }

    #[must_use]
    pub fn reset_nickname(mut self) -> Self {
        self.nickname = Some(None);
        self
    }

    /// Replace the member's roles
    #[must_use]
    pub fn roles(mut self, role_ids: Vec<Snowflake>) -> Self {
        self.role_ids = Some(role_ids);
        self
    }

    #[must_use]
    pub fn mute(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }

    #[must_use]
    pub fn deafen(mut self, deafened: bool) -> Self {
        self.deafened = Some(deafened);
        self
    }

    #[must_use]
    pub fn move_to(mut self, voice_channel_id: Snowflake) -> Self {
        self.voice_channel_id = Some(Some(voice_channel_id));
        self
    }

    #[must_use]
    pub fn disconnect_from_voice(mut self) -> Self {
        self.voice_channel_id = Some(None);
        self
    }

    #[must_use]
    pub fn timeout_until(mut self, until: DateTime<Utc>) -> Self {
        self.timeout_until = Some(Some(until));
        self
    }

    #[must_use]
    pub fn remove_timeout(mut self) -> Self {
        self.timeout_until = Some(None);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    /// Whether only the nickname changes
    pub fn is_nickname_only(&self) -> bool {
        self.nickname.is_some()
            && self.role_ids.is_none()
            && self.muted.is_none()
            && self.deafened.is_none()
            && self.voice_channel_id.is_none()
            && self.timeout_until.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.validate_at(Utc::now())
    }

    /// Validate with the timeout limit measured from `now`
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(Some(nickname)) = &self.nickname {
            DomainError::check_len("nickname", nickname, 1, 32)?;
        }
        if let Some(Some(until)) = self.timeout_until {
            if until > now + Duration::days(MAX_TIMEOUT_DAYS) {
                return Err(DomainError::invalid(
                    "communication_disabled_until",
                    format!("timeouts are limited to {MAX_TIMEOUT_DAYS} days"),
                ));
            }
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.nullable("nick", self.nickname.clone());
        body.opt(
            "roles",
            self.role_ids
                .as_ref()
                .map(|ids| ids.iter().map(ToString::to_string).collect::<Vec<_>>()),
        );
        body.opt("mute", self.muted);
        body.opt("deaf", self.deafened);
        body.nullable(
            "channel_id",
            self.voice_channel_id.map(|id| id.map(|id| id.to_string())),
        );
        body.nullable(
            "communication_disabled_until",
            self.timeout_until
                .map(|until| until.map(|until| until.to_rfc3339_opts(SecondsFormat::Millis, true))),
        );
        Ok(body.into_value())
    }

    /// `PATCH /guilds/{server}/members/{user}`
    pub fn to_request(&self, server_id: Snowflake, user_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::ServerMember)
            .url_params([server_id, user_id])
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }

    /// `PATCH /guilds/{server}/members/@me/nick`, for the connected account's own nickname
    pub fn to_own_nickname_request(&self, server_id: Snowflake) -> Result<RestRequest, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.set("nick", self.nickname.clone().flatten().map_or(Value::Null, Value::from));
        Ok(RestRequest::patch(RestEndpoint::OwnNickname)
            .url_param(server_id)
            .body(body.into_value())
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}
