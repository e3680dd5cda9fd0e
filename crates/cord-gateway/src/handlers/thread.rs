//! Thread packets
//!
//! Threads are cached as server channels of a thread type, so messages,
//! listeners and permission checks work on them like on any text channel.

use std::collections::HashSet;
use std::sync::Arc;

use cord_core::events::ChannelEvent;
use cord_core::payloads::RawChannel;
use cord_core::{Channel, Event, ListenerScope, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::channel::update_server_channel;
use super::{parse, HandlerContext, HandlerResult, PacketHandler};

/// THREAD_CREATE
///
/// Also sent when the account is added to an existing thread, which only
/// refreshes the cached thread.
pub struct ThreadCreateHandler;

impl PacketHandler for ThreadCreateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawChannel = parse(data)?;
        let Some(server_id) = raw.guild_id.filter(|_| raw.kind.is_thread()) else {
            tracing::debug!(channel_id = %raw.id, kind = ?raw.kind, "Ignoring non-thread THREAD_CREATE");
            return Ok(Vec::new());
        };
        if ctx.require_server(server_id, "THREAD_CREATE").is_none() {
            return Ok(Vec::new());
        }

        let channel = Arc::new(Channel::Server(raw.to_server_channel(server_id)));
        if ctx.cache().insert_channel(Arc::clone(&channel)).is_some() {
            return Ok(Vec::new());
        }
        Ok(vec![Event::ChannelCreate(ChannelEvent { channel })])
    }
}

/// THREAD_UPDATE
pub struct ThreadUpdateHandler;

impl PacketHandler for ThreadUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawChannel = parse(data)?;
        let Some(server_id) = raw.guild_id.filter(|_| raw.kind.is_thread()) else {
            return Ok(Vec::new());
        };
        if ctx.require_server(server_id, "THREAD_UPDATE").is_none() {
            return Ok(Vec::new());
        }
        Ok(update_server_channel(ctx, &raw, server_id))
    }
}

#[derive(Debug, Deserialize)]
struct ThreadDeletePacket {
    id: Snowflake,
}

/// THREAD_DELETE - carries only the ids of the thread
pub struct ThreadDeleteHandler;

impl PacketHandler for ThreadDeleteHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ThreadDeletePacket = parse(data)?;
        ctx.retire_listeners([ListenerScope::Channel(packet.id)]);
        let Some(channel) = ctx.cache().remove_channel(packet.id) else {
            tracing::debug!(channel_id = %packet.id, "Deleted thread was not cached");
            return Ok(Vec::new());
        };
        Ok(vec![Event::ChannelDelete(ChannelEvent { channel })])
    }
}

#[derive(Debug, Deserialize)]
struct ThreadListSyncPacket {
    guild_id: Snowflake,
    /// Parents being synced; absent means the whole server
    #[serde(default)]
    channel_ids: Option<Vec<Snowflake>>,
    #[serde(default)]
    threads: Vec<RawChannel>,
}

/// THREAD_LIST_SYNC - the active threads of some or all parents
///
/// Cached threads of a synced parent that are missing from the list are no
/// longer active and dropped from the cache.
pub struct ThreadListSyncHandler;

impl PacketHandler for ThreadListSyncHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ThreadListSyncPacket = parse(data)?;
        let server_id = packet.guild_id;
        if ctx.require_server(server_id, "THREAD_LIST_SYNC").is_none() {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();

        let active: HashSet<Snowflake> = packet.threads.iter().map(|t| t.id).collect();
        let parents: Option<HashSet<Snowflake>> = packet.channel_ids.map(|ids| ids.into_iter().collect());
        let stale: Vec<Snowflake> = cache
            .server_channels(server_id)
            .iter()
            .filter_map(|channel| channel.as_server())
            .filter(|channel| channel.kind.is_thread() && !active.contains(&channel.id))
            .filter(|channel| match (&parents, channel.parent_id) {
                (None, _) => true,
                (Some(parents), Some(parent_id)) => parents.contains(&parent_id),
                (Some(_), None) => false,
            })
            .map(|channel| channel.id)
            .collect();

        for id in &stale {
            cache.remove_channel(*id);
        }
        ctx.retire_listeners(stale.iter().map(|id| ListenerScope::Channel(*id)));

        for raw in packet.threads.iter().filter(|t| t.kind.is_thread()) {
            cache.insert_channel(Channel::Server(raw.to_server_channel(server_id)));
        }
        tracing::debug!(
            server_id = %server_id,
            active = active.len(),
            dropped = stale.len(),
            "Synced threads"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{count_events, seeded, sf};
    use crate::handlers::HandlerRegistry;
    use cord_core::events::ServerChannelChange;
    use serde_json::json;

    fn thread(id: u64, parent: u64) -> Value {
        json!({"id": id.to_string(), "type": 11, "guild_id": "1", "parent_id": parent.to_string(),
               "name": format!("thread-{id}"), "rate_limit_per_user": 0})
    }

    #[test]
    fn test_create_caches_thread_for_messages() {
        let ctx = seeded();
        let registry = HandlerRegistry::with_defaults();

        let events = ThreadCreateHandler.handle(&ctx, thread(300, 100)).unwrap();
        assert!(matches!(events.as_slice(), [Event::ChannelCreate(e)] if e.channel.id() == sf(300)));
        let cached = ctx.cache().server_channel(sf(300)).unwrap();
        assert_eq!(cached.parent_id, Some(sf(100)));
        assert!(cached.kind.is_thread());

        let count = registry.handle(
            &ctx,
            "MESSAGE_CREATE",
            json!({"id": "500", "channel_id": "300", "guild_id": "1",
                   "author": {"id": "10", "username": "owner"}, "content": "in thread",
                   "timestamp": "2024-01-01T00:00:00+00:00"}),
        );
        assert_eq!(count, 1);
        assert!(ctx.cache().channel_message(sf(300), sf(500)).is_some());
    }

    #[test]
    fn test_create_for_known_thread_is_silent() {
        let ctx = seeded();
        assert_eq!(ThreadCreateHandler.handle(&ctx, thread(300, 100)).unwrap().len(), 1);
        assert!(ThreadCreateHandler.handle(&ctx, thread(300, 100)).unwrap().is_empty());
        assert!(ThreadCreateHandler
            .handle(&ctx, json!({"id": "301", "type": 0, "guild_id": "1"}))
            .unwrap()
            .is_empty());
        assert!(ctx.cache().channel(sf(301)).is_none());
    }

    #[test]
    fn test_update_diffs_thread() {
        let ctx = seeded();
        ThreadCreateHandler.handle(&ctx, thread(300, 100)).unwrap();

        let mut update = thread(300, 100);
        update["name"] = json!("renamed");
        update["rate_limit_per_user"] = json!(30);
        let events = ThreadUpdateHandler.handle(&ctx, update).unwrap();
        let changes: Vec<_> = events
            .into_iter()
            .map(|e| match e {
                Event::ServerChannelChange(e) => e.change,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert!(matches!(changes.as_slice(), [ServerChannelChange::Name(n), ServerChannelChange::Slowmode(s)]
            if n.new == "renamed" && s.new == 30));
        assert_eq!(ctx.cache().server_channel(sf(300)).unwrap().name, "renamed");
    }

    #[tokio::test]
    async fn test_delete_thread_from_server_create() {
        let ctx = seeded();
        let registry = HandlerRegistry::with_defaults();
        registry.handle(
            &ctx,
            "GUILD_CREATE",
            json!({"id": "1", "name": "guild", "owner_id": "10",
                   "roles": [{"id": "1", "name": "@everyone", "permissions": "1024"}],
                   "channels": [{"id": "100", "type": 0, "name": "general"}],
                   "threads": [thread(301, 100)]}),
        );
        assert!(ctx.cache().channel(sf(301)).is_some());
        count_events(&ctx, ListenerScope::Channel(sf(301)));

        let events = ThreadDeleteHandler
            .handle(&ctx, json!({"id": "301", "guild_id": "1", "parent_id": "100", "type": 11}))
            .unwrap();
        assert!(matches!(events.as_slice(), [Event::ChannelDelete(e)] if e.channel.id() == sf(301)));
        assert!(ctx.cache().channel(sf(301)).is_none());
        ctx.drop_retired_listeners();
        assert!(ctx.dispatcher().listeners().is_empty());

        assert!(ThreadDeleteHandler.handle(&ctx, json!({"id": "301"})).unwrap().is_empty());
    }

    #[test]
    fn test_list_sync_drops_inactive_threads_of_synced_parents() {
        let ctx = seeded();
        ctx.cache().insert_channel(Channel::Server(cord_core::ServerChannel::new(
            sf(101),
            sf(1),
            cord_core::entities::ChannelType::ServerText,
            "other",
        )));
        for (id, parent) in [(300, 100), (301, 100), (302, 101)] {
            ThreadCreateHandler.handle(&ctx, thread(id, parent)).unwrap();
        }

        let events = ThreadListSyncHandler
            .handle(
                &ctx,
                json!({"guild_id": "1", "channel_ids": ["100"], "threads": [thread(301, 100), thread(303, 100)],
                       "members": []}),
            )
            .unwrap();
        assert!(events.is_empty());
        let cache = ctx.cache();
        assert!(cache.channel(sf(300)).is_none());
        assert!(cache.channel(sf(301)).is_some());
        assert!(cache.channel(sf(302)).is_some());
        assert!(cache.channel(sf(303)).is_some());
        assert!(cache.channel(sf(100)).is_some());

        ThreadListSyncHandler
            .handle(&ctx, json!({"guild_id": "1", "threads": []}))
            .unwrap();
        assert!(cache.channel(sf(301)).is_none());
        assert!(cache.channel(sf(302)).is_none());
        assert!(cache.channel(sf(101)).is_some());
    }
}
