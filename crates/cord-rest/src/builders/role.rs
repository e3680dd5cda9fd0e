//! Role builder and updater

use cord_core::{DomainError, Permissions, Snowflake};
use serde_json::{json, Value};
use validator::Validate;

use super::{validate_fields, Body};
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

/// Creates a role
#[derive(Debug, Clone, Default, Validate)]
pub struct RoleBuilder {
    #[validate(length(max = 100, message = "Role name must be at most 100 characters"))]
    name: Option<String>,
    permissions: Option<Permissions>,
    color: Option<u32>,
    hoist: Option<bool>,
    mentionable: Option<bool>,
    audit_log_reason: Option<String>,
}

impl RoleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// RGB color, the alpha byte is ignored
    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color & 0x00FF_FFFF);
        self
    }

    #[must_use]
    pub fn hoist(mut self, hoist: bool) -> Self {
        self.hoist = Some(hoist);
        self
    }

    #[must_use]
    pub fn mentionable(mut self, mentionable: bool) -> Self {
        self.mentionable = Some(mentionable);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.opt("name", self.name.clone());
        body.opt("permissions", self.permissions.map(|p| p.to_string()));
        body.opt("color", self.color);
        body.opt("hoist", self.hoist);
        body.opt("mentionable", self.mentionable);
        Ok(body.into_value())
    }

    /// `POST /guilds/{server}/roles`
    pub fn to_request(&self, server_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::post(RestEndpoint::Role)
            .url_param(server_id)
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}

/// Changes an existing role
#[derive(Debug, Clone, Default, Validate)]
pub struct RoleUpdater {
    #[validate(length(max = 100, message = "Role name must be at most 100 characters"))]
    name: Option<String>,
    permissions: Option<Permissions>,
    color: Option<u32>,
    hoist: Option<bool>,
    mentionable: Option<bool>,
    /// Sent separately through the role list endpoint
    position: Option<i32>,
    audit_log_reason: Option<String>,
}

impl RoleUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color & 0x00FF_FFFF);
        self
    }

    #[must_use]
    pub fn hoist(mut self, hoist: bool) -> Self {
        self.hoist = Some(hoist);
        self
    }

    #[must_use]
    pub fn mentionable(mut self, mentionable: bool) -> Self {
        self.mentionable = Some(mentionable);
        self
    }

    #[must_use]
    pub fn position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        if self.position.is_some_and(|position| position < 0) {
            return Err(DomainError::invalid("position", "must not be negative"));
        }
        Ok(())
    }

    /// Whether anything besides the position changes
    pub fn has_field_changes(&self) -> bool {
        self.name.is_some()
            || self.permissions.is_some()
            || self.color.is_some()
            || self.hoist.is_some()
            || self.mentionable.is_some()
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.opt("name", self.name.clone());
        body.opt("permissions", self.permissions.map(|p| p.to_string()));
        body.opt("color", self.color);
        body.opt("hoist", self.hoist);
        body.opt("mentionable", self.mentionable);
        Ok(body.into_value())
    }

    /// `PATCH /guilds/{server}/roles/{role}`
    pub fn to_request(&self, server_id: Snowflake, role_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::Role)
            .url_params([server_id, role_id])
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }

    /// `PATCH /guilds/{server}/roles` with the new position, if one was set
    pub fn position_request(&self, server_id: Snowflake, role_id: Snowflake) -> Option<RestRequest> {
        self.position.map(|position| {
            RestRequest::patch(RestEndpoint::Role)
                .url_param(server_id)
                .body(json!([{"id": role_id.to_string(), "position": position}]))
                .audit_log_reason(self.audit_log_reason.clone())
        })
    }
}
