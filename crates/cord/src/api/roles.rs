use cord_core::payloads::{RawRole, RawServer};
use cord_core::{Role, Server, Snowflake};
use cord_rest::builders::{RoleBuilder, RoleUpdater, ServerUpdater};
use cord_rest::{RestEndpoint, RestRequest};

use super::DiscordApi;
use crate::error::{Error, Result};

impl DiscordApi {
    pub async fn create_role(&self, server_id: Snowflake, builder: &RoleBuilder) -> Result<Role> {
        let raw: RawRole = builder
            .to_request(server_id)?
            .execute(self.rest())
            .await?
            .json()?;
        tracing::debug!(server_id = %server_id, role_id = %raw.id, "Created role");
        Ok(raw.to_role(server_id))
    }

    /// Apply field changes and a position change, whichever were set
    pub async fn update_role(&self, server_id: Snowflake, role_id: Snowflake, updater: &RoleUpdater) -> Result<Role> {
        updater.validate()?;
        let mut updated = None;

        if let Some(request) = updater.position_request(server_id, role_id) {
            let roles: Vec<RawRole> = request.execute(self.rest()).await?.json()?;
            updated = roles
                .iter()
                .find(|raw| raw.id == role_id)
                .map(|raw| raw.to_role(server_id));
        }
        if updater.has_field_changes() || updated.is_none() {
            let raw: RawRole = updater
                .to_request(server_id, role_id)?
                .execute(self.rest())
                .await?
                .json()?;
            updated = Some(raw.to_role(server_id));
        }

        updated.ok_or(Error::UnexpectedResponse("role missing from role list"))
    }

    pub async fn delete_role(&self, server_id: Snowflake, role_id: Snowflake, reason: Option<&str>) -> Result<()> {
        RestRequest::delete(RestEndpoint::Role)
            .url_params([server_id, role_id])
            .audit_log_reason(reason)
            .execute(self.rest())
            .await?;
        Ok(())
    }

    pub async fn update_server(&self, server_id: Snowflake, updater: &ServerUpdater) -> Result<Server> {
        let raw: RawServer = updater
            .to_request(server_id)?
            .execute(self.rest())
            .await?
            .json()?;
        Ok(raw.to_server())
    }
}
