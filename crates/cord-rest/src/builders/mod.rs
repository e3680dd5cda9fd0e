//! Builders and updaters
//!
//! Each builder validates itself and renders the JSON body of its request.
//! Updaters only send the fields that were set; `remove_*` setters send an
//! explicit `null`.

mod channel;
mod embed;
mod emoji;
mod image;
mod member;
mod message;
mod role;
mod scheduled_event;
mod server;

pub use channel::{OverwriteEntry, ServerChannelBuilder, ServerChannelUpdater};
pub use embed::EmbedBuilder;
pub use emoji::{CustomEmojiBuilder, CustomEmojiUpdater};
pub use image::ImageData;
pub use member::{MemberUpdater, MAX_TIMEOUT_DAYS};
pub use message::{AllowedMentions, MentionType, MessageBuilder, MessageUpdater};
pub use role::{RoleBuilder, RoleUpdater};
pub use scheduled_event::{ScheduledEventBuilder, ScheduledEventUpdater};
pub use server::ServerUpdater;

use cord_core::DomainError;
use serde_json::{Map, Value};
use validator::Validate;

/// Run the derived field validations
pub(crate) fn validate_fields<T: Validate>(value: &T) -> Result<(), DomainError> {
    value
        .validate()
        .map_err(|errors| DomainError::Validation(errors.to_string()))
}

/// JSON object under construction
#[derive(Debug, Default)]
pub(crate) struct Body(Map<String, Value>);

impl Body {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Set `key` only when a value is present
    pub(crate) fn opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    /// Absent leaves `key` out, `Some(None)` sends `null`
    pub(crate) fn nullable<T: Into<Value>>(&mut self, key: &str, value: Option<Option<T>>) {
        match value {
            Some(Some(value)) => self.set(key, value),
            Some(None) => self.set(key, Value::Null),
            None => {}
        }
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
