use cord_core::payloads::RawMember;
use cord_core::{DomainError, Member, Snowflake};
use cord_rest::builders::MemberUpdater;
use cord_rest::{RestEndpoint, RestRequest};
use serde_json::json;

use super::DiscordApi;
use crate::error::{Error, Result};

/// Discord deletes at most a week of messages when banning
pub const MAX_BAN_DELETE_MESSAGE_SECONDS: u32 = 604_800;

impl DiscordApi {
    /// Update a member.
    ///
    /// Changing only your own nickname goes through the dedicated route,
    /// which needs CHANGE_NICKNAME instead of MANAGE_NICKNAMES. The result
    /// is `None` in that case since Discord does not send the member back.
    pub async fn update_member(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        updater: &MemberUpdater,
    ) -> Result<Option<Member>> {
        if updater.is_nickname_only() && self.cache().is_yourself(user_id) {
            updater
                .to_own_nickname_request(server_id)?
                .execute(self.rest())
                .await?;
            return Ok(None);
        }

        let response = updater
            .to_request(server_id, user_id)?
            .execute(self.rest())
            .await?;
        if response.is_empty() {
            return Ok(None);
        }
        let raw: RawMember = response.json()?;
        raw.to_member(server_id)
            .map(Some)
            .ok_or(Error::UnexpectedResponse("member without user"))
    }

    pub async fn add_role_to_member(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> Result<()> {
        RestRequest::put(RestEndpoint::ServerMemberRole)
            .url_params([server_id, user_id, role_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }

    pub async fn remove_role_from_member(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> Result<()> {
        RestRequest::delete(RestEndpoint::ServerMemberRole)
            .url_params([server_id, user_id, role_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }

    pub async fn kick(&self, server_id: Snowflake, user_id: Snowflake, reason: Option<&str>) -> Result<()> {
        RestRequest::delete(RestEndpoint::ServerMember)
            .url_params([server_id, user_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        tracing::info!(server_id = %server_id, user_id = %user_id, "Kicked member");
        Ok(())
    }

    /// Ban a user, deleting their messages of the last `delete_message_seconds`
    pub async fn ban(
        &self,
        server_id: Snowflake,
        user_id: Snowflake,
        delete_message_seconds: u32,
        reason: Option<&str>,
    ) -> Result<()> {
        if delete_message_seconds > MAX_BAN_DELETE_MESSAGE_SECONDS {
            return Err(DomainError::invalid(
                "delete_message_seconds",
                format!("must be at most {MAX_BAN_DELETE_MESSAGE_SECONDS}"),
            )
            .into());
        }
        RestRequest::put(RestEndpoint::Ban)
            .url_params([server_id, user_id])
            .body(json!({ "delete_message_seconds": delete_message_seconds }))
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        tracing::info!(server_id = %server_id, user_id = %user_id, "Banned user");
        Ok(())
    }

    pub async fn unban(&self, server_id: Snowflake, user_id: Snowflake, reason: Option<&str>) -> Result<()> {
        RestRequest::delete(RestEndpoint::Ban)
            .url_params([server_id, user_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }
}
