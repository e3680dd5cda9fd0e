use cord_core::payloads::RawScheduledEvent;
use cord_core::{ScheduledEvent, Snowflake};
use cord_rest::builders::{ScheduledEventBuilder, ScheduledEventUpdater};
use cord_rest::{RestEndpoint, RestRequest};

use super::DiscordApi;
use crate::error::Result;

impl DiscordApi {
    pub async fn create_scheduled_event(
        &self,
        server_id: Snowflake,
        builder: &ScheduledEventBuilder,
    ) -> Result<ScheduledEvent> {
        let raw: RawScheduledEvent = builder
            .to_request(server_id)?
            .execute(self.rest())
            .await?
            .json()?;
        Ok(raw.to_event())
    }

    pub async fn update_scheduled_event(
        &self,
        server_id: Snowflake,
        event_id: Snowflake,
        updater: &ScheduledEventUpdater,
    ) -> Result<ScheduledEvent> {
        let raw: RawScheduledEvent = updater
            .to_request(server_id, event_id)?
            .execute(self.rest())
            .await?
            .json()?;
        Ok(raw.to_event())
    }

    pub async fn delete_scheduled_event(&self, server_id: Snowflake, event_id: Snowflake) -> Result<()> {
        RestRequest::delete(RestEndpoint::ScheduledEvent)
            .url_params([server_id, event_id])
            .execute(self.rest())
            .await?;
        Ok(())
    }
}
