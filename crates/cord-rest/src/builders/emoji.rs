//! Custom emoji builder and updater

use cord_core::{DomainError, Snowflake};
use serde_json::Value;
use validator::Validate;

use super::{validate_fields, Body, ImageData};
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

fn check_emoji_name(name: &str) -> Result<(), DomainError> {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DomainError::invalid(
            "name",
            "only letters, digits and underscores are allowed",
        ))
    }
}

/// Creates a custom emoji
#[derive(Debug, Clone, Validate)]
pub struct CustomEmojiBuilder {
    #[validate(length(min = 2, max = 32, message = "Emoji name must be 2-32 characters"))]
    name: String,
    image: Option<ImageData>,
    whitelisted_roles: Vec<Snowflake>,
    audit_log_reason: Option<String>,
}

impl CustomEmojiBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
            whitelisted_roles: Vec::new(),
            audit_log_reason: None,
        }
    }

    #[must_use]
    pub fn image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }

    /// Restrict the emoji to members with this role
    #[must_use]
    pub fn whitelist_role(mut self, role_id: Snowflake) -> Self {
        if !self.whitelisted_roles.contains(&role_id) {
            self.whitelisted_roles.push(role_id);
        }
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        check_emoji_name(&self.name)?;
        if self.image.is_none() {
            return Err(DomainError::MissingField { field: "image" });
        }
        Ok(())
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.set("name", self.name.clone());
        body.opt("image", self.image.as_ref().map(ImageData::to_data_uri));
        if !self.whitelisted_roles.is_empty() {
            body.set(
                "roles",
                self.whitelisted_roles
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            );
        }
        Ok(body.into_value())
    }

    /// `POST /guilds/{server}/emojis`
    pub fn to_request(&self, server_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::post(RestEndpoint::CustomEmoji)
            .url_param(server_id)
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}

/// Changes a custom emoji
#[derive(Debug, Clone, Default, Validate)]
pub struct CustomEmojiUpdater {
    #[validate(length(min = 2, max = 32, message = "Emoji name must be 2-32 characters"))]
    name: Option<String>,
    /// `Some(empty)` makes the emoji usable by everyone again
    whitelisted_roles: Option<Vec<Snowflake>>,
    audit_log_reason: Option<String>,
}

impl CustomEmojiUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn whitelist_role(mut self, role_id: Snowflake) -> Self {
        let roles = self.whitelisted_roles.get_or_insert_with(Vec::new);
        if !roles.contains(&role_id) {
            roles.push(role_id);
        }
        self
    }

    #[must_use]
    pub fn remove_whitelist(mut self) -> Self {
        self.whitelisted_roles = Some(Vec::new());
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        self.name.as_deref().map_or(Ok(()), check_emoji_name)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.opt("name", self.name.clone());
        body.opt(
            "roles",
            self.whitelisted_roles
                .as_ref()
                .map(|roles| roles.iter().map(ToString::to_string).collect::<Vec<_>>()),
        );
        Ok(body.into_value())
    }

    /// `PATCH /guilds/{server}/emojis/{emoji}`
    pub fn to_request(&self, server_id: Snowflake, emoji_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::CustomEmoji)
            .url_params([server_id, emoji_id])
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image() -> ImageData {
        ImageData::from_bytes(b"GIF89a".to_vec(), None).unwrap()
    }

    #[test]
    fn test_builder_body() {
        let body = CustomEmojiBuilder::new("party_parrot")
            .image(image())
            .whitelist_role(Snowflake::new(4))
            .whitelist_role(Snowflake::new(4))
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            json!({
                "name": "party_parrot",
                "image": "data:image/gif;base64,R0lGODlh",
                "roles": ["4"],
            })
        );
    }

    #[test]
    fn test_image_is_required() {
        assert_eq!(
            CustomEmojiBuilder::new("ok").validate().unwrap_err(),
            DomainError::MissingField { field: "image" }
        );
    }

    #[test]
    fn test_name_rules() {
        assert!(CustomEmojiBuilder::new("a").image(image()).validate().is_err());
        assert!(CustomEmojiBuilder::new("x".repeat(33)).image(image()).validate().is_err());
        assert!(CustomEmojiBuilder::new("no-dash").image(image()).validate().is_err());
        assert!(CustomEmojiBuilder::new("ok_2").image(image()).validate().is_ok());
        assert!(CustomEmojiUpdater::new().name("bad name").validate().is_err());
    }

    #[test]
    fn test_updater_request() {
        let request = CustomEmojiUpdater::new()
            .name("renamed")
            .remove_whitelist()
            .to_request(Snowflake::new(1), Snowflake::new(2))
            .unwrap();
        assert_eq!(request.url_params, vec!["1", "2"]);
        assert_eq!(request.body, Some(json!({"name": "renamed", "roles": []})));
    }
}
