//! Channel packets

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cord_core::entities::ChannelType;
use cord_core::events::{
    ChannelEvent, ChannelPinsUpdateEvent, ServerChannelChange, ServerChannelChangeEvent,
    WebhooksUpdateEvent,
};
use cord_core::payloads::RawChannel;
use cord_core::{Change, Channel, Event, ListenerScope, OverwriteKind, ServerChannel, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::user::upsert_user;
use super::{parse, HandlerContext, HandlerResult, PacketHandler};

/// CHANNEL_CREATE - server or private channel
pub struct ChannelCreateHandler;

impl PacketHandler for ChannelCreateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawChannel = parse(data)?;
        let cache = ctx.cache();

        let Some(channel) = raw.to_channel(None) else {
            tracing::debug!(channel_id = %raw.id, kind = ?raw.kind, "Ignoring unsupported channel");
            return Ok(Vec::new());
        };
        if let Some(server_id) = channel.server_id() {
            if ctx.require_server(server_id, "CHANNEL_CREATE").is_none() {
                return Ok(Vec::new());
            }
        }
        for recipient in &raw.recipients {
            upsert_user(cache, recipient);
        }

        let channel = Arc::new(channel);
        cache.insert_channel(Arc::clone(&channel));
        Ok(vec![Event::ChannelCreate(ChannelEvent { channel })])
    }
}

/// Per-target overwrite changes of one kind
fn overwrite_changes(
    ctx: &HandlerContext,
    old: &ServerChannel,
    new: &ServerChannel,
    kind: OverwriteKind,
) -> Vec<ServerChannelChange> {
    let (old_map, new_map) = match kind {
        OverwriteKind::Role => (&old.role_overwrites, &new.role_overwrites),
        OverwriteKind::Member => (&old.member_overwrites, &new.member_overwrites),
    };
    let targets: BTreeSet<Snowflake> = old_map.keys().chain(new_map.keys()).copied().collect();

    let mut changes = Vec::new();
    for target_id in targets {
        if kind == OverwriteKind::Role && ctx.cache().role(target_id).is_none() {
            continue;
        }
        let (before, after) = match kind {
            OverwriteKind::Role => (old.role_overwrite(target_id), new.role_overwrite(target_id)),
            OverwriteKind::Member => (
                old.member_overwrite(target_id),
                new.member_overwrite(target_id),
            ),
        };
        if let Some(overwrite) = Change::diff(before, after) {
            changes.push(ServerChannelChange::OverwrittenPermissions {
                kind,
                target_id,
                overwrite,
            });
        }
    }
    changes
}

/// Field changes between two snapshots of a server channel
fn channel_changes(ctx: &HandlerContext, old: &ServerChannel, new: &ServerChannel) -> Vec<ServerChannelChange> {
    let mut changes = Vec::new();
    if let Some(change) = Change::diff_ref(&old.name, &new.name) {
        changes.push(ServerChannelChange::Name(change));
    }
    if old.raw_position != new.raw_position || old.parent_id != new.parent_id {
        changes.push(ServerChannelChange::Position {
            raw_position: Change::new(old.raw_position, new.raw_position),
            parent_id: Change::new(old.parent_id, new.parent_id),
        });
    }
    changes.extend(overwrite_changes(ctx, old, new, OverwriteKind::Role));
    changes.extend(overwrite_changes(ctx, old, new, OverwriteKind::Member));

    let kind = new.kind;
    if kind.is_text() || kind == ChannelType::ServerForum || kind.is_thread() {
        if let Some(change) = Change::diff_ref(&old.topic, &new.topic) {
            changes.push(ServerChannelChange::Topic(change));
        }
        if let Some(change) = Change::diff(old.nsfw, new.nsfw) {
            changes.push(ServerChannelChange::Nsfw(change));
        }
        if let Some(change) = Change::diff(old.slowmode_secs, new.slowmode_secs) {
            changes.push(ServerChannelChange::Slowmode(change));
        }
    } else if kind.is_voice() {
        if let Some(change) = Change::diff(old.bitrate, new.bitrate) {
            changes.push(ServerChannelChange::Bitrate(change));
        }
        if let Some(change) = Change::diff(old.user_limit, new.user_limit) {
            changes.push(ServerChannelChange::UserLimit(change));
        }
    } else if kind == ChannelType::Category {
        if let Some(change) = Change::diff(old.nsfw, new.nsfw) {
            changes.push(ServerChannelChange::Nsfw(change));
        }
    }
    changes
}

/// CHANNEL_UPDATE - server channels only, private channel updates are ignored
pub struct ChannelUpdateHandler;

impl PacketHandler for ChannelUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawChannel = parse(data)?;
        let Some(server_id) = raw.guild_id else {
            return Ok(Vec::new());
        };
        if matches!(raw.kind, ChannelType::Private | ChannelType::Group) {
            return Ok(Vec::new());
        }
        if ctx.require_server(server_id, "CHANNEL_UPDATE").is_none() {
            return Ok(Vec::new());
        }
        Ok(update_server_channel(ctx, &raw, server_id))
    }
}

/// Replace a cached server channel and describe what changed.
///
/// An uncached channel is cached without events.
pub(super) fn update_server_channel(ctx: &HandlerContext, raw: &RawChannel, server_id: Snowflake) -> Vec<Event> {
    let cache = ctx.cache();

    let new = raw.to_server_channel(server_id);
    let Some(old) = cache.server_channel(raw.id) else {
        tracing::warn!(channel_id = %raw.id, "Update for uncached channel, caching it");
        cache.insert_channel(Channel::Server(new));
        return Vec::new();
    };

    let could_see = cache.can_you_see(raw.id);
    let changes = channel_changes(ctx, &old, &new);
    let channel = Arc::new(Channel::Server(new));
    cache.insert_channel(Arc::clone(&channel));

    if could_see && !cache.can_you_see(raw.id) {
        cache.evict_messages_where(|channel_id| channel_id == raw.id);
    }

    changes
        .into_iter()
        .map(|change| {
            Event::ServerChannelChange(ServerChannelChangeEvent {
                channel: Arc::clone(&channel),
                change,
            })
        })
        .collect()
}

/// CHANNEL_DELETE
pub struct ChannelDeleteHandler;

impl PacketHandler for ChannelDeleteHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawChannel = parse(data)?;
        let channel = match ctx.cache().remove_channel(raw.id) {
            Some(channel) => channel,
            None => match raw.to_channel(None) {
                Some(channel) => Arc::new(channel),
                None => return Ok(Vec::new()),
            },
        };
        ctx.retire_listeners([ListenerScope::Channel(raw.id)]);
        Ok(vec![Event::ChannelDelete(ChannelEvent { channel })])
    }
}

#[derive(Debug, Deserialize)]
struct PinsUpdatePacket {
    #[serde(default)]
    guild_id: Option<Snowflake>,
    channel_id: Snowflake,
    #[serde(default)]
    last_pin_timestamp: Option<DateTime<Utc>>,
}

/// CHANNEL_PINS_UPDATE
pub struct ChannelPinsUpdateHandler;

impl PacketHandler for ChannelPinsUpdateHandler {
    fn handle(&self, _ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: PinsUpdatePacket = parse(data)?;
        Ok(vec![Event::ChannelPinsUpdate(ChannelPinsUpdateEvent {
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            last_pin_timestamp: packet.last_pin_timestamp,
        })])
    }
}

#[derive(Debug, Deserialize)]
struct WebhooksUpdatePacket {
    guild_id: Snowflake,
    channel_id: Snowflake,
}

/// WEBHOOKS_UPDATE
pub struct WebhooksUpdateHandler;

impl PacketHandler for WebhooksUpdateHandler {
    fn handle(&self, _ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: WebhooksUpdatePacket = parse(data)?;
        Ok(vec![Event::WebhooksUpdate(WebhooksUpdateEvent {
            server_id: packet.guild_id,
            channel_id: packet.channel_id,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{count_events, seeded, sf};
    use crate::handlers::HandlerRegistry;
    use cord_core::payloads::RawMessage;
    use std::sync::atomic::Ordering;
    use cord_core::{PermissionOverwrite, Permissions};
    use serde_json::json;

    fn changes(events: Vec<Event>) -> Vec<ServerChannelChange> {
        events
            .into_iter()
            .map(|e| match e {
                Event::ServerChannelChange(e) => e.change,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_create_private_channel() {
        let ctx = seeded();
        let events = ChannelCreateHandler
            .handle(
                &ctx,
                json!({"id": "60", "type": 1, "recipients": [{"id": "15", "username": "friend"}]}),
            )
            .unwrap();
        assert!(matches!(events.as_slice(), [Event::ChannelCreate(e)] if e.channel.as_private().is_some()));
        assert_eq!(ctx.cache().private_channel_for(sf(15)).unwrap().id(), sf(60));
        assert_eq!(ctx.cache().user(sf(15)).unwrap().name, "friend");
    }

    #[test]
    fn test_group_channels_are_ignored() {
        let ctx = seeded();
        let events = ChannelCreateHandler
            .handle(&ctx, json!({"id": "61", "type": 3, "recipients": []}))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_update_text_channel() {
        let ctx = seeded();
        let events = ChannelUpdateHandler
            .handle(
                &ctx,
                json!({"id": "100", "type": 0, "guild_id": "1", "name": "chat", "position": 3,
                       "topic": "hello", "rate_limit_per_user": 10,
                       "permission_overwrites": [
                           {"id": "2", "type": 0, "allow": "2048", "deny": "0"},
                           {"id": "99", "type": 0, "allow": "2048", "deny": "0"}
                       ]}),
            )
            .unwrap();

        let changes = changes(events);
        assert_eq!(changes.len(), 5);
        assert!(matches!(&changes[0], ServerChannelChange::Name(c) if c.new == "chat"));
        assert!(matches!(&changes[1], ServerChannelChange::Position { raw_position, .. } if raw_position.new == 3));
        assert_eq!(
            changes[2],
            ServerChannelChange::OverwrittenPermissions {
                kind: OverwriteKind::Role,
                target_id: sf(2),
                overwrite: Change::new(
                    PermissionOverwrite::EMPTY,
                    PermissionOverwrite::new(Permissions::SEND_MESSAGES, Permissions::empty())
                ),
            }
        );
        assert!(matches!(&changes[3], ServerChannelChange::Topic(c) if c.new == "hello"));
        assert!(matches!(&changes[4], ServerChannelChange::Slowmode(c) if c.new == 10));
    }

    #[test]
    fn test_update_voice_channel_ignores_topic() {
        let ctx = seeded();
        ctx.cache().insert_channel(Channel::Server(ServerChannel::new(
            sf(110),
            sf(1),
            ChannelType::ServerVoice,
            "voice",
        )));
        let events = ChannelUpdateHandler
            .handle(
                &ctx,
                json!({"id": "110", "type": 2, "guild_id": "1", "name": "voice",
                       "topic": "ignored", "bitrate": 96000, "user_limit": 5}),
            )
            .unwrap();
        let changes = changes(events);
        assert_eq!(
            changes,
            vec![
                ServerChannelChange::Bitrate(Change::new(0, 96000)),
                ServerChannelChange::UserLimit(Change::new(0, 5)),
            ]
        );
    }

    #[test]
    fn test_losing_sight_evicts_messages() {
        let ctx = seeded();
        let raw: RawMessage = serde_json::from_value(json!({
            "id": "500", "channel_id": "100", "author": {"id": "10", "username": "owner"}
        }))
        .unwrap();
        ctx.cache().add_message(Arc::new(raw.to_message().unwrap()));

        ChannelUpdateHandler
            .handle(
                &ctx,
                json!({"id": "100", "type": 0, "guild_id": "1", "name": "general",
                       "permission_overwrites": [{"id": "1", "type": 0, "allow": "0", "deny": "1024"}]}),
            )
            .unwrap();
        assert!(ctx.cache().channel_message(sf(100), sf(500)).is_none());
    }

    #[test]
    fn test_delete() {
        let ctx = seeded();
        let events = ChannelDeleteHandler
            .handle(&ctx, json!({"id": "100", "type": 0, "guild_id": "1"}))
            .unwrap();
        assert!(matches!(events.as_slice(), [Event::ChannelDelete(e)] if e.channel.id() == sf(100)));
        assert!(ctx.cache().channel(sf(100)).is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_channel_listeners() {
        let ctx = seeded();
        ctx.dispatcher().set_can_dispatch(true);
        let deleted = count_events(&ctx, ListenerScope::Channel(sf(100)));
        count_events(&ctx, ListenerScope::Channel(sf(101)));

        let registry = HandlerRegistry::with_defaults();
        let count = registry.handle(&ctx, "CHANNEL_DELETE", json!({"id": "100", "type": 0, "guild_id": "1"}));
        assert_eq!(count, 1);
        assert_eq!(ctx.dispatcher().listeners().len(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(deleted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pins_update() {
        let ctx = seeded();
        let events = ChannelPinsUpdateHandler
            .handle(
                &ctx,
                json!({"guild_id": "1", "channel_id": "100",
                       "last_pin_timestamp": "2024-01-01T00:00:00+00:00"}),
            )
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [Event::ChannelPinsUpdate(e)] if e.last_pin_timestamp.is_some() && e.server_id == Some(sf(1))
        ));
    }
}
