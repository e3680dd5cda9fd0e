use std::sync::Arc;

use cord_core::payloads::{RawChannel, RawUser};
use cord_core::{Channel, Snowflake, User};
use cord_rest::{RestEndpoint, RestRequest};
use serde_json::json;

use super::DiscordApi;
use crate::error::{Error, Result};

impl DiscordApi {
    pub async fn fetch_user(&self, user_id: Snowflake) -> Result<User> {
        let raw: RawUser = RestRequest::get(RestEndpoint::User)
            .url_param(user_id)
            .execute(self.rest())
            .await?
            .json()?;
        Ok(raw.to_user())
    }

    /// The private channel with a user, opened through REST if it is not cached yet
    pub async fn open_private_channel(&self, user_id: Snowflake) -> Result<Arc<Channel>> {
        if let Some(channel) = self.cache().private_channel_for(user_id) {
            return Ok(channel);
        }

        let raw: RawChannel = RestRequest::post(RestEndpoint::UserChannel)
            .body(json!({ "recipient_id": user_id.to_string() }))
            .execute(self.rest())
            .await?
            .json()?;
        let channel: Arc<Channel> = raw
            .to_channel(None)
            .filter(|channel| channel.as_private().is_some())
            .ok_or(Error::UnexpectedResponse("not a private channel"))?
            .into();

        tracing::debug!(user_id = %user_id, channel_id = %raw.id, "Opened private channel");
        self.cache().insert_channel(Arc::clone(&channel));
        Ok(channel)
    }
}
