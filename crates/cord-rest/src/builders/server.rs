//! Server updater

use cord_core::entities::{
    DefaultMessageNotificationLevel, ExplicitContentFilterLevel, VerificationLevel,
};
use cord_core::{DomainError, Snowflake};
use serde_json::Value;
use validator::Validate;

use super::{validate_fields, Body, ImageData};
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

/// AFK timeouts Discord accepts, in seconds
const AFK_TIMEOUTS: [u32; 5] = [60, 300, 900, 1800, 3600];

/// Changes server settings
#[derive(Debug, Clone, Default, Validate)]
pub struct ServerUpdater {
    #[validate(length(min = 2, max = 100, message = "Server name must be 2-100 characters"))]
    name: Option<String>,
    verification_level: Option<VerificationLevel>,
    default_message_notifications: Option<DefaultMessageNotificationLevel>,
    explicit_content_filter: Option<ExplicitContentFilterLevel>,
    afk_channel_id: Option<Option<Snowflake>>,
    afk_timeout: Option<u32>,
    icon: Option<Option<ImageData>>,
    owner_id: Option<Snowflake>,
    splash: Option<Option<ImageData>>,
    system_channel_id: Option<Option<Snowflake>>,
    rules_channel_id: Option<Option<Snowflake>>,
    moderators_only_channel_id: Option<Option<Snowflake>>,
    preferred_locale: Option<String>,
    #[validate(length(max = 120, message = "Description must be at most 120 characters"))]
    description: Option<String>,
    remove_description: bool,
    audit_log_reason: Option<String>,
}

macro_rules! nullable_setters {
    ($($field:ident: $ty:ty => $set:ident, $remove:ident;)+) => {
        $(
            #[must_use]
            pub fn $set(mut self, value: $ty) -> Self {
                self.$field = Some(Some(value));
                self
            }

            #[must_use]
            pub fn $remove(mut self) -> Self {
                self.$field = Some(None);
                self
            }
        )+
    };
}

impl ServerUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn verification_level(mut self, level: VerificationLevel) -> Self {
        self.verification_level = Some(level);
        self
    }

    #[must_use]
    pub fn default_message_notifications(mut self, level: DefaultMessageNotificationLevel) -> Self {
        self.default_message_notifications = Some(level);
        self
    }

    #[must_use]
    pub fn explicit_content_filter(mut self, level: ExplicitContentFilterLevel) -> Self {
        self.explicit_content_filter = Some(level);
        self
    }

    #[must_use]
    pub fn afk_timeout(mut self, secs: u32) -> Self {
        self.afk_timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn owner(mut self, user_id: Snowflake) -> Self {
        self.owner_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn preferred_locale(mut self, locale: impl Into<String>) -> Self {
        self.preferred_locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self.remove_description = false;
        self
    }

    #[must_use]
    pub fn remove_description(mut self) -> Self {
        self.description = None;
        self.remove_description = true;
        self
    }

    nullable_setters! {
        afk_channel_id: Snowflake => afk_channel, remove_afk_channel;
        icon: ImageData => icon, remove_icon;
        splash: ImageData => splash, remove_splash;
        system_channel_id: Snowflake => system_channel, remove_system_channel;
        rules_channel_id: Snowflake => rules_channel, remove_rules_channel;
        moderators_only_channel_id: Snowflake => moderators_only_channel, remove_moderators_only_channel;
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        if let Some(timeout) = self.afk_timeout {
            if !AFK_TIMEOUTS.contains(&timeout) {
                return Err(DomainError::invalid(
                    "afk_timeout",
                    format!("must be one of {AFK_TIMEOUTS:?}"),
                ));
            }
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let id = |id: Option<Option<Snowflake>>| id.map(|id| id.map(|id| id.to_string()));
        let image = |image: &Option<Option<ImageData>>| {
            image.as_ref().map(|image| image.as_ref().map(ImageData::to_data_uri))
        };

        let mut body = Body::new();
        body.opt("name", self.name.clone());
        body.opt("verification_level", self.verification_level.map(|l| l.id()));
        body.opt(
            "default_message_notifications",
            self.default_message_notifications.map(|l| l.id()),
        );
        body.opt("explicit_content_filter", self.explicit_content_filter.map(|l| l.id()));
        body.nullable("afk_channel_id", id(self.afk_channel_id));
        body.opt("afk_timeout", self.afk_timeout);
        body.nullable("icon", image(&self.icon));
        body.opt("owner_id", self.owner_id.map(|id| id.to_string()));
        body.nullable("splash", image(&self.splash));
        body.nullable("system_channel_id", id(self.system_channel_id));
        body.nullable("rules_channel_id", id(self.rules_channel_id));
        body.nullable("public_updates_channel_id", id(self.moderators_only_channel_id));
        body.opt("preferred_locale", self.preferred_locale.clone());
        if self.remove_description {
            body.set("description", Value::Null);
        } else {
            body.opt("description", self.description.clone());
        }
        Ok(body.into_value())
    }

    /// `PATCH /guilds/{server}`
    pub fn to_request(&self, server_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::Server)
            .url_param(server_id)
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}
