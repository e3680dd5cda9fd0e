use chrono::{DateTime, Duration, Utc};
use cord_core::payloads::RawMessage;
use cord_core::{Emoji, Message, Snowflake};
use cord_rest::builders::{MessageBuilder, MessageUpdater};
use cord_rest::{RestEndpoint, RestRequest};
use serde_json::json;

use super::DiscordApi;
use crate::error::{Error, Result};

/// Most messages one bulk delete request accepts
pub const BULK_DELETE_LIMIT: usize = 100;

/// Discord refuses to bulk delete messages older than this
const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;

/// How a set of messages gets deleted
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkDeletePlan {
    /// Each batch holds 2 to 100 ids
    pub batches: Vec<Vec<Snowflake>>,
    /// Deleted one request at a time
    pub singles: Vec<Snowflake>,
}

/// Split message ids into bulk batches and single deletes.
///
/// Messages too old for the bulk endpoint, and a batch that would hold a
/// single id, are deleted individually.
pub fn bulk_delete_plan(message_ids: &[Snowflake], now: DateTime<Utc>) -> BulkDeletePlan {
    let cutoff = now - Duration::days(BULK_DELETE_MAX_AGE_DAYS);
    let mut ids = message_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let (recent, old): (Vec<_>, Vec<_>) = ids.into_iter().partition(|id| id.created_at() > cutoff);
    let mut plan = BulkDeletePlan {
        batches: Vec::new(),
        singles: old,
    };
    for chunk in recent.chunks(BULK_DELETE_LIMIT) {
        if let [single] = chunk {
            plan.singles.push(*single);
        } else {
            plan.batches.push(chunk.to_vec());
        }
    }
    plan
}

impl DiscordApi {
    pub async fn send_message(&self, channel_id: Snowflake, builder: &MessageBuilder) -> Result<Message> {
        let raw: RawMessage = builder
            .to_request(channel_id)?
            .execute(self.rest())
            .await?
            .json()?;
        raw.to_message()
            .ok_or(Error::UnexpectedResponse("message without author"))
    }

    pub async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        updater: &MessageUpdater,
    ) -> Result<Message> {
        let raw: RawMessage = updater
            .to_request(channel_id, message_id)?
            .execute(self.rest())
            .await?
            .json()?;
        raw.to_message()
            .ok_or(Error::UnexpectedResponse("message without author"))
    }

    pub async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake, reason: Option<&str>) -> Result<()> {
        RestRequest::delete(RestEndpoint::Message)
            .url_params([channel_id, message_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }

    /// Delete many messages of one channel with as few requests as possible
    pub async fn bulk_delete(&self, channel_id: Snowflake, message_ids: &[Snowflake]) -> Result<()> {
        let plan = bulk_delete_plan(message_ids, Utc::now());
        tracing::debug!(
            channel_id = %channel_id,
            batches = plan.batches.len(),
            singles = plan.singles.len(),
            "Bulk deleting messages"
        );

        for batch in &plan.batches {
            let ids: Vec<String> = batch.iter().map(ToString::to_string).collect();
            RestRequest::post(RestEndpoint::MessagesBulkDelete)
                .url_param(channel_id)
                .body(json!({ "messages": ids }))
                .execute(self.rest())
                .await?;
        }
        for message_id in plan.singles {
            self.delete_message(channel_id, message_id, None).await?;
        }
        Ok(())
    }

    /// The cached message, or the one Discord returns
    pub async fn fetch_message(&self, channel_id: Snowflake, message_id: Snowflake) -> Result<Message> {
        if let Some(message) = self.cache().channel_message(channel_id, message_id) {
            return Ok(Message::clone(&message));
        }
        let raw: RawMessage = RestRequest::get(RestEndpoint::Message)
            .url_params([channel_id, message_id])
            .execute(self.rest())
            .await?
            .json()?;
        raw.to_message()
            .ok_or(Error::UnexpectedResponse("message without author"))
    }

    // =========================================================================
    // Reactions
    // =========================================================================

    pub async fn add_reaction(&self, channel_id: Snowflake, message_id: Snowflake, emoji: &Emoji) -> Result<()> {
        RestRequest::put(RestEndpoint::Reaction)
            .url_params([channel_id.to_string(), message_id.to_string(), emoji.reaction_tag(), "@me".to_string()])
            .execute(self.rest())
            .await?;
        Ok(())
    }

    pub async fn remove_own_reaction(&self, channel_id: Snowflake, message_id: Snowflake, emoji: &Emoji) -> Result<()> {
        RestRequest::delete(RestEndpoint::Reaction)
            .url_params([channel_id.to_string(), message_id.to_string(), emoji.reaction_tag(), "@me".to_string()])
            .execute(self.rest())
            .await?;
        Ok(())
    }

    pub async fn remove_all_reactions(&self, channel_id: Snowflake, message_id: Snowflake) -> Result<()> {
        RestRequest::delete(RestEndpoint::Reaction)
            .url_params([channel_id, message_id])
            .execute(self.rest())
            .await?;
        Ok(())
    }
}
