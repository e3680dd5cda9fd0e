//! GUILD_CREATE, GUILD_UPDATE, GUILD_DELETE and bans

use std::collections::HashSet;
use std::sync::Arc;

use cord_cache::Cache;
use cord_core::events::{ServerChange, ServerChangeEvent, ServerEvent, ServerUserEvent};
use cord_core::payloads::{RawServer, RawUser};
use cord_core::{Change, Event, ListenerScope, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::user::upsert_user;
use super::{parse, HandlerContext, HandlerResult, PacketHandler};

/// Load everything a full server object carries into the cache
fn populate(cache: &Cache, raw: &RawServer) {
    let server_id = raw.id;

    let role_ids: HashSet<Snowflake> = raw.roles.iter().map(|r| r.id).collect();
    for stale in cache.server_roles(server_id) {
        if !role_ids.contains(&stale.id) {
            cache.remove_role(stale.id);
        }
    }
    for role in &raw.roles {
        cache.insert_role(role.to_role(server_id));
    }

    let channel_ids: HashSet<Snowflake> =
        raw.channels.iter().chain(&raw.threads).map(|c| c.id).collect();
    for stale in cache.server_channels(server_id) {
        if !channel_ids.contains(&stale.id()) {
            cache.remove_channel(stale.id());
        }
    }
    for raw_channel in raw.channels.iter().chain(&raw.threads) {
        if let Some(channel) = raw_channel.to_channel(Some(server_id)) {
            cache.insert_channel(channel);
        }
    }

    for raw_member in &raw.members {
        let Some(raw_user) = &raw_member.user else {
            continue;
        };
        upsert_user(cache, raw_user);
        let mut member = raw_member.to_member_of(server_id, raw_user.id);
        if let Some(old) = cache.member(server_id, raw_user.id) {
            member.self_muted = old.self_muted;
            member.self_deafened = old.self_deafened;
        }
        cache.insert_member(member);
    }

    let emoji_ids: HashSet<Snowflake> = raw.emojis.iter().filter_map(|e| e.id).collect();
    for stale in cache.server_emojis(server_id) {
        if !emoji_ids.contains(&stale.id()) {
            cache.remove_emoji(stale.id());
        }
    }
    for raw_emoji in &raw.emojis {
        if let Some(emoji) = raw_emoji.to_known(server_id) {
            cache.insert_emoji(emoji);
        }
    }

    for presence in &raw.presences {
        cache.set_presence(presence.to_presence());
    }
    for event in &raw.guild_scheduled_events {
        cache.insert_scheduled_event(event.to_event());
    }
}

/// GUILD_CREATE - a server became available or was joined
pub struct GuildCreateHandler;

impl PacketHandler for GuildCreateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawServer = parse(data)?;
        let cache = ctx.cache();
        let server_id = raw.id;

        if raw.unavailable {
            cache.mark_unavailable(server_id);
            return Ok(Vec::new());
        }

        let known = cache.server(server_id).is_some();
        populate(cache, &raw);
        let server = Arc::new(raw.to_server());
        cache.insert_server(Arc::clone(&server));
        let was_unavailable = cache.mark_available(server_id);
        let (awaited, ready) = ctx.server_loaded(server_id);

        tracing::debug!(
            server_id = %server_id,
            members = raw.members.len(),
            channels = raw.channels.len(),
            "Server loaded"
        );

        let mut events = Vec::new();
        if awaited {
            ctx.dispatcher().release(server_id);
        } else if was_unavailable {
            events.push(Event::ServerBecomesAvailable(ServerEvent { server }));
        } else if !known {
            events.push(Event::ServerJoin(ServerEvent { server }));
        }
        events.extend(ready);
        Ok(events)
    }

    fn requires_ready(&self) -> bool {
        false
    }
}

/// GUILD_UPDATE - server settings changed
pub struct GuildUpdateHandler;

impl PacketHandler for GuildUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawServer = parse(data)?;
        let cache = ctx.cache();
        if cache.is_unavailable(raw.id) {
            return Ok(Vec::new());
        }
        let Some(old) = ctx.require_server(raw.id, "GUILD_UPDATE") else {
            return Ok(Vec::new());
        };

        let mut next = raw.to_server();
        next.member_count = old.member_count;
        next.large = old.large;
        if raw.system_channel_id.is_none() {
            next.system_channel_id = old.system_channel_id;
        }
        if raw.afk_channel_id.is_none() {
            next.afk_channel_id = old.afk_channel_id;
        }
        if raw.rules_channel_id.is_none() {
            next.rules_channel_id = old.rules_channel_id;
        }
        if raw.public_updates_channel_id.is_none() {
            next.moderators_only_channel_id = old.moderators_only_channel_id;
        }

        let mut changes = Vec::new();
        macro_rules! diff {
            ($($field:ident => $variant:ident),* $(,)?) => {
                $(
                    if let Some(change) = Change::diff_ref(&old.$field, &next.$field) {
                        changes.push(ServerChange::$variant(change));
                    }
                )*
            };
        }
        diff! {
            name => Name,
            icon_hash => Icon,
            splash_hash => Splash,
            discovery_splash_hash => DiscoverySplash,
            verification_level => VerificationLevel,
            region => Region,
            default_message_notification_level => DefaultMessageNotificationLevel,
            owner_id => Owner,
            system_channel_id => SystemChannel,
            afk_channel_id => AfkChannel,
            afk_timeout_secs => AfkTimeout,
            explicit_content_filter_level => ExplicitContentFilterLevel,
            mfa_level => MultiFactorAuthenticationLevel,
            rules_channel_id => RulesChannel,
            moderators_only_channel_id => ModeratorsOnlyChannel,
            boost_level => BoostLevel,
            nsfw_level => NsfwLevel,
            preferred_locale => PreferredLocale,
            boost_count => BoostCount,
            description => Description,
        }

        let server = Arc::new(next);
        cache.insert_server(Arc::clone(&server));

        Ok(changes
            .into_iter()
            .map(|change| {
                Event::ServerChange(ServerChangeEvent {
                    server: Arc::clone(&server),
                    change,
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ServerDeletePacket {
    id: Snowflake,
    #[serde(default)]
    unavailable: bool,
}

/// GUILD_DELETE - outage, or the account left the server
pub struct GuildDeleteHandler;

impl PacketHandler for GuildDeleteHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ServerDeletePacket = parse(data)?;
        let cache = ctx.cache();

        if packet.unavailable {
            cache.mark_unavailable(packet.id);
            tracing::warn!(server_id = %packet.id, "Server became unavailable");
            return Ok(cache
                .server(packet.id)
                .map(|server| Event::ServerBecomesUnavailable(ServerEvent { server }))
                .into_iter()
                .collect());
        }

        cache.mark_available(packet.id);
        ctx.retire_listeners(server_scopes(cache, packet.id));
        let removed = cache.remove_server(packet.id);
        let mut events: Vec<Event> = removed
            .map(|server| Event::ServerLeave(ServerEvent { server }))
            .into_iter()
            .collect();
        events.extend(ctx.server_gone(packet.id));
        Ok(events)
    }

    fn requires_ready(&self) -> bool {
        false
    }
}

/// Listener scopes of a server and its cached channels, roles and emojis
fn server_scopes(cache: &Cache, server_id: Snowflake) -> Vec<ListenerScope> {
    let mut scopes = vec![ListenerScope::Server(server_id)];
    scopes.extend(cache.server_channels(server_id).iter().map(|c| ListenerScope::Channel(c.id())));
    scopes.extend(cache.server_roles(server_id).iter().map(|r| ListenerScope::Role(r.id)));
    scopes.extend(cache.server_emojis(server_id).iter().map(|e| ListenerScope::Emoji(e.id())));
    scopes
}

#[derive(Debug, Deserialize)]
struct BanPacket {
    guild_id: Snowflake,
    user: RawUser,
}

/// GUILD_BAN_ADD and GUILD_BAN_REMOVE
pub struct GuildBanHandler {
    pub added: bool,
}

impl PacketHandler for GuildBanHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: BanPacket = parse(data)?;
        if ctx.require_server(packet.guild_id, "GUILD_BAN").is_none() {
            return Ok(Vec::new());
        }
        let event = ServerUserEvent {
            server_id: packet.guild_id,
            user: upsert_user(ctx.cache(), &packet.user),
        };
        Ok(vec![if self.added {
            Event::ServerMemberBan(event)
        } else {
            Event::ServerMemberUnban(event)
        }])
    }
}
