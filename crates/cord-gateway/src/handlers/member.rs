//! Server member packets

use std::sync::Arc;

use cord_core::events::{
    MemberChange, MemberChangeEvent, ServerMemberJoinEvent, ServerMemberLeaveEvent, UserRoleEvent,
};
use cord_core::payloads::{RawMember, RawPresence, RawUser};
use cord_core::{Change, Event, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::user::{apply_user_update, upsert_user};
use super::{parse, HandlerContext, HandlerError, HandlerResult, PacketHandler};

/// Server id and user of a member object, both required
fn member_keys(raw: &RawMember) -> HandlerResult<(Snowflake, &RawUser)> {
    let server_id = raw.guild_id.ok_or(HandlerError::MissingField("guild_id"))?;
    let user = raw.user.as_ref().ok_or(HandlerError::MissingField("user"))?;
    Ok((server_id, user))
}

/// GUILD_MEMBER_ADD
pub struct GuildMemberAddHandler;

impl PacketHandler for GuildMemberAddHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawMember = parse(data)?;
        let (server_id, raw_user) = member_keys(&raw)?;
        let Some(server) = ctx.require_server(server_id, "GUILD_MEMBER_ADD") else {
            return Ok(Vec::new());
        };
        let cache = ctx.cache();

        let user = upsert_user(cache, raw_user);
        let member = Arc::new(raw.to_member_of(server_id, user.id));
        cache.insert_member(Arc::clone(&member));

        let mut next = (*server).clone();
        next.member_count = next.member_count.saturating_add(1);
        cache.insert_server(next);

        Ok(vec![Event::ServerMemberJoin(ServerMemberJoinEvent {
            server_id,
            user,
            member,
        })])
    }
}

#[derive(Debug, Deserialize)]
struct MemberRemovePacket {
    guild_id: Snowflake,
    user: RawUser,
}

/// GUILD_MEMBER_REMOVE
pub struct GuildMemberRemoveHandler;

impl PacketHandler for GuildMemberRemoveHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: MemberRemovePacket = parse(data)?;
        let server_id = packet.guild_id;
        let Some(server) = ctx.require_server(server_id, "GUILD_MEMBER_REMOVE") else {
            return Ok(Vec::new());
        };
        let cache = ctx.cache();

        let user = upsert_user(cache, &packet.user);
        let member = cache.remove_member(server_id, user.id);

        let mut next = (*server).clone();
        next.member_count = next.member_count.saturating_sub(1);
        cache.insert_server(next);

        cache.remove_user_if_orphaned(user.id);

        Ok(vec![Event::ServerMemberLeave(ServerMemberLeaveEvent {
            server_id,
            user,
            member,
        })])
    }
}

/// GUILD_MEMBER_UPDATE - nickname, roles, timeout or user data changed
pub struct GuildMemberUpdateHandler;

impl PacketHandler for GuildMemberUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawMember = parse(data)?;
        let (server_id, raw_user) = member_keys(&raw)?;
        if ctx.require_server(server_id, "GUILD_MEMBER_UPDATE").is_none() {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();
        let user_id = raw_user.id;

        let old = cache.member(server_id, user_id);
        let mut next = raw.to_member_of(server_id, user_id);
        if let Some(old) = &old {
            next.self_muted = old.self_muted;
            next.self_deafened = old.self_deafened;
            next.joined_at = next.joined_at.or(old.joined_at);
        }
        let member = Arc::new(next);
        cache.insert_member(Arc::clone(&member));

        let Some(old) = old else {
            upsert_user(cache, raw_user);
            return Ok(Vec::new());
        };
        let user = cache.user(user_id).unwrap_or_else(|| upsert_user(cache, raw_user));

        let mut changes = Vec::new();
        if let Some(change) = Change::diff_ref(&old.nickname, &member.nickname) {
            changes.push(MemberChange::Nickname(change));
        }
        if let Some(change) = Change::diff_ref(&old.timeout_until, &member.timeout_until) {
            changes.push(MemberChange::Timeout(change));
        }
        if let Some(change) = Change::diff_ref(&old.server_avatar_hash, &member.server_avatar_hash) {
            changes.push(MemberChange::ServerAvatar(change));
        }
        if let Some(change) = Change::diff(old.pending, member.pending) {
            changes.push(MemberChange::Pending(change));
        }
        let mut events: Vec<Event> = changes
            .into_iter()
            .map(|change| {
                Event::MemberChange(MemberChangeEvent {
                    server_id,
                    user: Arc::clone(&user),
                    member: Arc::clone(&member),
                    change,
                })
            })
            .collect();

        let added = member.role_ids.iter().filter(|id| !old.role_ids.contains(id));
        let removed = old.role_ids.iter().filter(|id| !member.role_ids.contains(id));
        let mut roles_changed = false;
        for role_id in added {
            roles_changed = true;
            if let Some(role) = cache.role(*role_id) {
                events.push(Event::UserRoleAdd(UserRoleEvent { user_id, role }));
            }
        }
        for role_id in removed {
            roles_changed = true;
            if let Some(role) = cache.role(*role_id) {
                events.push(Event::UserRoleRemove(UserRoleEvent { user_id, role }));
            }
        }
        if roles_changed && cache.is_yourself(user_id) {
            cache.evict_unreadable_messages(server_id);
        }

        events.extend(apply_user_update(cache, raw_user));
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
struct MembersChunkPacket {
    guild_id: Snowflake,
    #[serde(default)]
    members: Vec<RawMember>,
    #[serde(default)]
    presences: Vec<RawPresence>,
    #[serde(default)]
    chunk_index: u32,
    #[serde(default)]
    chunk_count: u32,
    #[serde(default)]
    nonce: Option<String>,
}

/// GUILD_MEMBERS_CHUNK - answer to a member request, cached silently
pub struct GuildMembersChunkHandler;

impl PacketHandler for GuildMembersChunkHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: MembersChunkPacket = parse(data)?;
        let cache = ctx.cache();
        let server_id = packet.guild_id;

        for raw in &packet.members {
            let Some(raw_user) = &raw.user else {
                continue;
            };
            upsert_user(cache, raw_user);
            let mut member = raw.to_member_of(server_id, raw_user.id);
            if let Some(old) = cache.member(server_id, raw_user.id) {
                member.self_muted = old.self_muted;
                member.self_deafened = old.self_deafened;
            }
            cache.insert_member(member);
        }
        for presence in &packet.presences {
            cache.set_presence(presence.to_presence());
        }

        tracing::debug!(
            server_id = %server_id,
            members = packet.members.len(),
            chunk_index = packet.chunk_index,
            chunk_count = packet.chunk_count,
            nonce = ?packet.nonce,
            "Member chunk received"
        );
        Ok(Vec::new())
    }

    fn requires_ready(&self) -> bool {
        false
    }
}
