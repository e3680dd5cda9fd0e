//! Role packets

use std::sync::Arc;

use cord_core::events::{RoleChange, RoleChangeEvent, RoleEvent};
use cord_core::payloads::RawRole;
use cord_core::{Change, Event, ListenerScope, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::{parse, HandlerContext, HandlerResult, PacketHandler};

#[derive(Debug, Deserialize)]
struct RolePacket {
    guild_id: Snowflake,
    role: RawRole,
}

/// GUILD_ROLE_CREATE
pub struct GuildRoleCreateHandler;

impl PacketHandler for GuildRoleCreateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: RolePacket = parse(data)?;
        if ctx.require_server(packet.guild_id, "GUILD_ROLE_CREATE").is_none() {
            return Ok(Vec::new());
        }
        let role = Arc::new(packet.role.to_role(packet.guild_id));
        ctx.cache().insert_role(Arc::clone(&role));
        Ok(vec![Event::RoleCreate(RoleEvent { role })])
    }
}

/// GUILD_ROLE_UPDATE
pub struct GuildRoleUpdateHandler;

impl PacketHandler for GuildRoleUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: RolePacket = parse(data)?;
        let server_id = packet.guild_id;
        if ctx.require_server(server_id, "GUILD_ROLE_UPDATE").is_none() {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();

        let role = Arc::new(packet.role.to_role(server_id));
        let Some(old) = cache.role(role.id) else {
            cache.insert_role(role);
            return Ok(Vec::new());
        };
        let old_position = cache.role_position(role.id).unwrap_or_default();
        cache.insert_role(Arc::clone(&role));
        let new_position = cache.role_position(role.id).unwrap_or_default();

        let mut changes = Vec::new();
        if let Some(change) = Change::diff(old.color, role.color) {
            changes.push(RoleChange::Color(change));
        }
        if let Some(change) = Change::diff(old.hoist, role.hoist) {
            changes.push(RoleChange::Hoist(change));
        }
        if let Some(change) = Change::diff(old.mentionable, role.mentionable) {
            changes.push(RoleChange::Mentionable(change));
        }
        if let Some(change) = Change::diff_ref(&old.name, &role.name) {
            changes.push(RoleChange::Name(change));
        }
        if let Some(change) = Change::diff(old.permissions, role.permissions) {
            changes.push(RoleChange::Permissions(change));
            let yours = cache
                .yourself_id()
                .and_then(|you| cache.member(server_id, you))
                .is_some_and(|member| member.has_role(role.id));
            if yours {
                cache.evict_unreadable_messages(server_id);
            }
        }
        if old.raw_position != role.raw_position {
            changes.push(RoleChange::Position {
                raw_position: Change::new(old.raw_position, role.raw_position),
                position: Change::new(old_position, new_position),
            });
        }

        Ok(changes
            .into_iter()
            .map(|change| {
                Event::RoleChange(RoleChangeEvent {
                    role: Arc::clone(&role),
                    change,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct RoleDeletePacket {
    guild_id: Snowflake,
    role_id: Snowflake,
}

/// GUILD_ROLE_DELETE
pub struct GuildRoleDeleteHandler;

impl PacketHandler for GuildRoleDeleteHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: RoleDeletePacket = parse(data)?;
        let cache = ctx.cache();

        let yours = cache
            .yourself_id()
            .and_then(|you| cache.member(packet.guild_id, you))
            .is_some_and(|member| member.role_ids.contains(&packet.role_id));
        let Some(role) = cache.remove_role(packet.role_id) else {
            tracing::warn!(role_id = %packet.role_id, "Deleted role was not cached");
            return Ok(Vec::new());
        };
        if yours {
            cache.evict_unreadable_messages(packet.guild_id);
        }
        ctx.retire_listeners([ListenerScope::Role(packet.role_id)]);
        Ok(vec![Event::RoleDelete(RoleEvent { role })])
    }
}
