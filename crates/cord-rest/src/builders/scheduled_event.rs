//! Scheduled event builder and updater

use chrono::{DateTime, SecondsFormat, Utc};
use cord_core::entities::{
    ScheduledEventEntityType, ScheduledEventPrivacyLevel, ScheduledEventStatus,
};
use cord_core::{DomainError, Snowflake};
use serde_json::{json, Value};
use validator::Validate;

use super::{validate_fields, Body, ImageData};
use crate::endpoint::RestEndpoint;
use crate::request::RestRequest;

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Rules that tie the entity type to channel, location and end time
fn check_entity(
    entity_type: ScheduledEventEntityType,
    channel_id: Option<Snowflake>,
    location: Option<&str>,
    end: Option<DateTime<Utc>>,
) -> Result<(), DomainError> {
    if entity_type == ScheduledEventEntityType::External {
        if end.is_none() {
            return Err(DomainError::MissingField {
                field: "scheduled_end_time",
            });
        }
        if location.map_or(true, str::is_empty) {
            return Err(DomainError::MissingField { field: "location" });
        }
    }
    if entity_type.requires_channel() && channel_id.is_none() {
        return Err(DomainError::MissingField { field: "channel_id" });
    }
    Ok(())
}

fn check_order(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<(), DomainError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            return Err(DomainError::invalid(
                "scheduled_end_time",
                "must be after the start time",
            ));
        }
    }
    Ok(())
}

/// Creates a scheduled event
#[derive(Debug, Clone, Validate)]
pub struct ScheduledEventBuilder {
    #[validate(length(min = 1, max = 100, message = "Event name must be 1-100 characters"))]
    name: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    privacy_level: ScheduledEventPrivacyLevel,
    channel_id: Option<Snowflake>,
    entity_type: ScheduledEventEntityType,
    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    location: Option<String>,
    image: Option<ImageData>,
    audit_log_reason: Option<String>,
}

impl ScheduledEventBuilder {
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        entity_type: ScheduledEventEntityType,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_time,
            end_time: None,
            privacy_level: ScheduledEventPrivacyLevel::ServerOnly,
            channel_id: None,
            entity_type,
            location: None,
            image: None,
            audit_log_reason: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    #[must_use]
    pub fn privacy_level(mut self, privacy_level: ScheduledEventPrivacyLevel) -> Self {
        self.privacy_level = privacy_level;
        self
    }

    #[must_use]
    pub fn channel(mut self, channel_id: Snowflake) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        check_entity(
            self.entity_type,
            self.channel_id,
            self.location.as_deref(),
            self.end_time,
        )?;
        check_order(Some(self.start_time), self.end_time)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.set("name", self.name.clone());
        body.opt("description", self.description.clone());
        body.set("scheduled_start_time", rfc3339(self.start_time));
        body.opt("scheduled_end_time", self.end_time.map(rfc3339));
        body.set("privacy_level", self.privacy_level.id());
        body.opt("channel_id", self.channel_id.map(|id| id.to_string()));
        body.set("entity_type", self.entity_type.id());
        if let Some(location) = &self.location {
            body.set("entity_metadata", json!({ "location": location }));
        }
        body.opt("image", self.image.as_ref().map(ImageData::to_data_uri));
        Ok(body.into_value())
    }

    /// `POST /guilds/{server}/scheduled-events`
    pub fn to_request(&self, server_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::post(RestEndpoint::ScheduledEvents)
            .url_param(server_id)
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}

/// Changes a scheduled event
#[derive(Debug, Clone, Default, Validate)]
pub struct ScheduledEventUpdater {
    #[validate(length(min = 1, max = 100, message = "Event name must be 1-100 characters"))]
    name: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    description: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    privacy_level: Option<ScheduledEventPrivacyLevel>,
    channel_id: Option<Option<Snowflake>>,
    entity_type: Option<ScheduledEventEntityType>,
    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    location: Option<String>,
    image: Option<ImageData>,
    status: Option<ScheduledEventStatus>,
    audit_log_reason: Option<String>,
}

impl ScheduledEventUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    #[must_use]
    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    #[must_use]
    pub fn privacy_level(mut self, privacy_level: ScheduledEventPrivacyLevel) -> Self {
        self.privacy_level = Some(privacy_level);
        self
    }

    #[must_use]
    pub fn channel(mut self, channel_id: Snowflake) -> Self {
        self.channel_id = Some(Some(channel_id));
        self
    }

    /// Moving an event to an external location detaches it from its channel
    #[must_use]
    pub fn external(mut self, location: impl Into<String>, end_time: DateTime<Utc>) -> Self {
        self.entity_type = Some(ScheduledEventEntityType::External);
        self.channel_id = Some(None);
        self.location = Some(location.into());
        self.end_time = Some(end_time);
        self
    }

    #[must_use]
    pub fn entity_type(mut self, entity_type: ScheduledEventEntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub fn status(mut self, status: ScheduledEventStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: impl Into<String>) -> Self {
        self.audit_log_reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_fields(self)?;
        if let Some(entity_type) = self.entity_type {
            check_entity(
                entity_type,
                self.channel_id.flatten(),
                self.location.as_deref(),
                self.end_time,
            )?;
        }
        check_order(self.start_time, self.end_time)
    }

    pub fn to_body(&self) -> Result<Value, DomainError> {
        self.validate()?;
        let mut body = Body::new();
        body.opt("name", self.name.clone());
        body.opt("description", self.description.clone());
        body.opt("scheduled_start_time", self.start_time.map(rfc3339));
        body.opt("scheduled_end_time", self.end_time.map(rfc3339));
        body.opt("privacy_level", self.privacy_level.map(|p| p.id()));
        body.nullable("channel_id", self.channel_id.map(|id| id.map(|id| id.to_string())));
        body.opt("entity_type", self.entity_type.map(|t| t.id()));
        if let Some(location) = &self.location {
            body.set("entity_metadata", json!({ "location": location }));
        }
        body.opt("image", self.image.as_ref().map(ImageData::to_data_uri));
        body.opt("status", self.status.map(|s| s.id()));
        Ok(body.into_value())
    }

    /// `PATCH /guilds/{server}/scheduled-events/{event}`
    pub fn to_request(&self, server_id: Snowflake, event_id: Snowflake) -> Result<RestRequest, DomainError> {
        Ok(RestRequest::patch(RestEndpoint::ScheduledEvent)
            .url_params([server_id, event_id])
            .body(self.to_body()?)
            .audit_log_reason(self.audit_log_reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_external_event_body() {
        let body = ScheduledEventBuilder::new("Meetup", start(), ScheduledEventEntityType::External)
            .description("Bring snacks")
            .end_time(start() + Duration::hours(2))
            .location("Town hall")
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Meetup",
                "description": "Bring snacks",
                "scheduled_start_time": "2030-05-01T18:00:00Z",
                "scheduled_end_time": "2030-05-01T20:00:00Z",
                "privacy_level": 2,
                "entity_type": 3,
                "entity_metadata": {"location": "Town hall"},
            })
        );
    }

    #[test]
    fn test_external_requires_end_and_location() {
        let builder = ScheduledEventBuilder::new("Meetup", start(), ScheduledEventEntityType::External);
        assert_eq!(
            builder.clone().location("here").validate().unwrap_err(),
            DomainError::MissingField {
                field: "scheduled_end_time"
            }
        );
        assert_eq!(
            builder.end_time(start() + Duration::hours(1)).validate().unwrap_err(),
            DomainError::MissingField { field: "location" }
        );
    }

    #[test]
    fn test_voice_requires_channel() {
        let builder = ScheduledEventBuilder::new("Talk", start(), ScheduledEventEntityType::Voice);
        assert_eq!(
            builder.clone().validate().unwrap_err(),
            DomainError::MissingField { field: "channel_id" }
        );
        let body = builder.channel(Snowflake::new(7)).to_body().unwrap();
        assert_eq!(body["channel_id"], "7");
        assert!(body.get("scheduled_end_time").is_none());
    }

    #[test]
    fn test_end_after_start() {
        let err = ScheduledEventBuilder::new("Talk", start(), ScheduledEventEntityType::StageInstance)
            .channel(Snowflake::new(7))
            .end_time(start())
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_VALUE");
    }

    #[test]
    fn test_name_and_description_limits() {
        let too_long = ScheduledEventBuilder::new("x".repeat(101), start(), ScheduledEventEntityType::StageInstance)
            .channel(Snowflake::new(1));
        assert!(too_long.validate().is_err());
        let description = ScheduledEventBuilder::new("ok", start(), ScheduledEventEntityType::StageInstance)
            .channel(Snowflake::new(1))
            .description("d".repeat(1001));
        assert!(description.validate().is_err());
    }

    #[test]
    fn test_updater() {
        let request = ScheduledEventUpdater::new()
            .status(ScheduledEventStatus::Active)
            .external("Park", start() + Duration::hours(3))
            .to_request(Snowflake::new(1), Snowflake::new(2))
            .unwrap();
        assert_eq!(request.url_params, vec!["1", "2"]);
        assert_eq!(
            request.body,
            Some(json!({
                "scheduled_end_time": "2030-05-01T21:00:00Z",
                "channel_id": null,
                "entity_type": 3,
                "entity_metadata": {"location": "Park"},
                "status": 2,
            }))
        );
        assert!(ScheduledEventUpdater::new()
            .entity_type(ScheduledEventEntityType::Voice)
            .validate()
            .is_err());
    }
}
