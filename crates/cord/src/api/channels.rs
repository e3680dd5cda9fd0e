use cord_core::payloads::RawChannel;
use cord_core::{Channel, ServerChannel, Snowflake};
use cord_rest::builders::{ServerChannelBuilder, ServerChannelUpdater};
use cord_rest::{RestEndpoint, RestRequest};

use super::DiscordApi;
use crate::error::{Error, Result};

impl DiscordApi {
    pub async fn create_channel(&self, server_id: Snowflake, builder: &ServerChannelBuilder) -> Result<ServerChannel> {
        let raw: RawChannel = builder
            .to_request(server_id)?
            .execute(self.rest())
            .await?
            .json()?;
        tracing::debug!(server_id = %server_id, channel_id = %raw.id, "Created channel");
        Ok(raw.to_server_channel(server_id))
    }

    pub async fn update_channel(&self, channel_id: Snowflake, updater: &ServerChannelUpdater) -> Result<Channel> {
        let raw: RawChannel = updater
            .to_request(channel_id)?
            .execute(self.rest())
            .await?
            .json()?;
        let server_id = self.channel(channel_id).and_then(|channel| channel.server_id());
        raw.to_channel(server_id)
            .ok_or(Error::UnexpectedResponse("unsupported channel type"))
    }

    pub async fn delete_channel(&self, channel_id: Snowflake, reason: Option<&str>) -> Result<()> {
        RestRequest::delete(RestEndpoint::Channel)
            .url_param(channel_id)
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }
}
