use cord_core::payloads::RawEmoji;
use cord_core::{KnownCustomEmoji, Snowflake};
use cord_rest::builders::{CustomEmojiBuilder, CustomEmojiUpdater};
use cord_rest::{RestEndpoint, RestRequest};

use super::DiscordApi;
use crate::error::{Error, Result};

impl DiscordApi {
    pub async fn create_custom_emoji(
        &self,
        server_id: Snowflake,
        builder: &CustomEmojiBuilder,
    ) -> Result<KnownCustomEmoji> {
        let raw: RawEmoji = builder
            .to_request(server_id)?
            .execute(self.rest())
            .await?
            .json()?;
        raw.to_known(server_id)
            .ok_or(Error::UnexpectedResponse("emoji without id"))
    }

    pub async fn update_custom_emoji(
        &self,
        server_id: Snowflake,
        emoji_id: Snowflake,
        updater: &CustomEmojiUpdater,
    ) -> Result<KnownCustomEmoji> {
        let raw: RawEmoji = updater
            .to_request(server_id, emoji_id)?
            .execute(self.rest())
            .await?
            .json()?;
        raw.to_known(server_id)
            .ok_or(Error::UnexpectedResponse("emoji without id"))
    }

    pub async fn delete_custom_emoji(&self, server_id: Snowflake, emoji_id: Snowflake, reason: Option<&str>) -> Result<()> {
        RestRequest::delete(RestEndpoint::CustomEmoji)
            .url_params([server_id, emoji_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }
}
