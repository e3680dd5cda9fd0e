//! Entity cache
//!
//! Holds every entity the gateway reported as `Arc` snapshots in `DashMap`s.
//! Updates never mutate a snapshot: handlers build a new value and swap it
//! in, getting the previous snapshot back for diffing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cord_core::entities::Presence;
use cord_core::{
    Channel, KnownCustomEmoji, Member, Message, Role, ScheduledEvent, Server, ServerChannel,
    Snowflake, User,
};
use dashmap::{DashMap, DashSet};
use parking_lot::{Mutex, RwLock};

use crate::messages::MessageCache;

pub type SharedCache = Arc<Cache>;

/// In-memory entity cache
///
/// Uses `DashMap` for concurrent access from handlers and API calls.
pub struct Cache {
    servers: DashMap<Snowflake, Arc<Server>>,
    unavailable_servers: DashSet<Snowflake>,
    channels: DashMap<Snowflake, Arc<Channel>>,
    roles: DashMap<Snowflake, Arc<Role>>,
    users: DashMap<Snowflake, Arc<User>>,
    /// Keyed by (server id, user id)
    members: DashMap<(Snowflake, Snowflake), Arc<Member>>,
    emojis: DashMap<Snowflake, Arc<KnownCustomEmoji>>,
    scheduled_events: DashMap<Snowflake, Arc<ScheduledEvent>>,
    presences: DashMap<Snowflake, Arc<Presence>>,
    /// Recipient id to private channel id
    private_channel_by_user: DashMap<Snowflake, Snowflake>,
    message_caches: DashMap<Snowflake, Arc<Mutex<MessageCache>>>,
    yourself: RwLock<Option<Arc<User>>>,
    message_cache_capacity: usize,
    message_cache_storage_secs: u64,
}

impl Cache {
    /// Create an empty cache; new message caches get the given limits
    #[must_use]
    pub fn new(message_cache_capacity: usize, message_cache_storage_secs: u64) -> Self {
        Self {
            servers: DashMap::new(),
            unavailable_servers: DashSet::new(),
            channels: DashMap::new(),
            roles: DashMap::new(),
            users: DashMap::new(),
            members: DashMap::new(),
            emojis: DashMap::new(),
            scheduled_events: DashMap::new(),
            presences: DashMap::new(),
            private_channel_by_user: DashMap::new(),
            message_caches: DashMap::new(),
            yourself: RwLock::new(None),
            message_cache_capacity,
            message_cache_storage_secs,
        }
    }

    #[must_use]
    pub fn new_shared(message_cache_capacity: usize, message_cache_storage_secs: u64) -> SharedCache {
        Arc::new(Self::new(message_cache_capacity, message_cache_storage_secs))
    }

    // =========================================================================
    // Yourself
    // =========================================================================

    pub fn yourself(&self) -> Option<Arc<User>> {
        self.yourself.read().clone()
    }

    pub fn yourself_id(&self) -> Option<Snowflake> {
        self.yourself.read().as_ref().map(|user| user.id)
    }

    /// Set the connected account, also caching it as a user
    pub fn set_yourself(&self, user: impl Into<Arc<User>>) -> Option<Arc<User>> {
        let user = user.into();
        self.users.insert(user.id, Arc::clone(&user));
        self.yourself.write().replace(user)
    }

    pub fn is_yourself(&self, user_id: Snowflake) -> bool {
        self.yourself_id() == Some(user_id)
    }

    // =========================================================================
    // Servers
    // =========================================================================

    pub fn insert_server(&self, server: impl Into<Arc<Server>>) -> Option<Arc<Server>> {
        let server = server.into();
        self.servers.insert(server.id, server)
    }

    pub fn server(&self, id: Snowflake) -> Option<Arc<Server>> {
        self.servers.get(&id).map(|r| r.clone())
    }

    pub fn servers(&self) -> Vec<Arc<Server>> {
        self.servers.iter().map(|r| r.clone()).collect()
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// A server is ready once it is cached and available
    pub fn is_server_ready(&self, id: Snowflake) -> bool {
        self.servers.contains_key(&id) && !self.unavailable_servers.contains(&id)
    }

    pub fn mark_unavailable(&self, id: Snowflake) {
        self.unavailable_servers.insert(id);
    }

    /// Returns whether the server was unavailable before
    pub fn mark_available(&self, id: Snowflake) -> bool {
        self.unavailable_servers.remove(&id).is_some()
    }

    pub fn is_unavailable(&self, id: Snowflake) -> bool {
        self.unavailable_servers.contains(&id)
    }

    pub fn unavailable_servers(&self) -> Vec<Snowflake> {
        self.unavailable_servers.iter().map(|r| *r).collect()
    }

    /// Remove a server and everything that belongs to it.
    ///
    /// Users who share no other server (and have no open private channel)
    /// are dropped as well.
    pub fn remove_server(&self, id: Snowflake) -> Option<Arc<Server>> {
        let removed = self.servers.remove(&id).map(|(_, server)| server);

        let channel_ids: Vec<Snowflake> = self
            .channels
            .iter()
            .filter(|r| r.server_id() == Some(id))
            .map(|r| *r.key())
            .collect();
        for channel_id in channel_ids {
            self.channels.remove(&channel_id);
            self.message_caches.remove(&channel_id);
        }
        self.roles.retain(|_, role| role.server_id != id);
        self.emojis.retain(|_, emoji| emoji.server_id != id);
        self.scheduled_events.retain(|_, event| event.server_id != id);

        let user_ids: Vec<Snowflake> = self
            .members
            .iter()
            .filter(|r| r.key().0 == id)
            .map(|r| r.key().1)
            .collect();
        self.members.retain(|(server_id, _), _| *server_id != id);
        for user_id in user_ids {
            self.remove_user_if_orphaned(user_id);
        }

        if removed.is_some() {
            tracing::debug!(server_id = %id, "Server removed from cache");
        }
        removed
    }

    // =========================================================================
    // Channels
    // =========================================================================

    pub fn insert_channel(&self, channel: impl Into<Arc<Channel>>) -> Option<Arc<Channel>> {
        let channel = channel.into();
        if let Channel::Private(private) = channel.as_ref() {
            self.private_channel_by_user
                .insert(private.recipient_id, private.id);
        }
        self.channels.insert(channel.id(), channel)
    }

    pub fn channel(&self, id: Snowflake) -> Option<Arc<Channel>> {
        self.channels.get(&id).map(|r| r.clone())
    }

    /// Remove a channel together with its message cache
    pub fn remove_channel(&self, id: Snowflake) -> Option<Arc<Channel>> {
        let removed = self.channels.remove(&id).map(|(_, channel)| channel);
        if let Some(Channel::Private(private)) = removed.as_deref() {
            self.private_channel_by_user.remove(&private.recipient_id);
        }
        self.message_caches.remove(&id);
        removed
    }

    /// Open private channel with a user
    pub fn private_channel_for(&self, user_id: Snowflake) -> Option<Arc<Channel>> {
        let channel_id = *self.private_channel_by_user.get(&user_id)?;
        self.channel(channel_id)
    }

    /// Channels of a server in display order
    pub fn server_channels(&self, server_id: Snowflake) -> Vec<Arc<Channel>> {
        let mut channels: Vec<Arc<Channel>> = self
            .channels
            .iter()
            .filter(|r| r.server_id() == Some(server_id))
            .map(|r| r.clone())
            .collect();
        channels.sort_by(|a, b| match (a.as_server(), b.as_server()) {
            (Some(a), Some(b)) => a.cmp_position(b),
            _ => a.id().cmp(&b.id()),
        });
        channels
    }

    /// Index of a channel among its server's channels
    pub fn channel_position(&self, channel_id: Snowflake) -> Option<usize> {
        let server_id = self.channel(channel_id)?.server_id()?;
        self.server_channels(server_id)
            .iter()
            .position(|c| c.id() == channel_id)
    }

    pub fn server_channel(&self, id: Snowflake) -> Option<ServerChannel> {
        self.channel(id).and_then(|c| c.as_server().cloned())
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub fn insert_role(&self, role: impl Into<Arc<Role>>) -> Option<Arc<Role>> {
        let role = role.into();
        self.roles.insert(role.id, role)
    }

    pub fn role(&self, id: Snowflake) -> Option<Arc<Role>> {
        self.roles.get(&id).map(|r| r.clone())
    }

    /// Remove a role and strip it from every member of its server
    pub fn remove_role(&self, id: Snowflake) -> Option<Arc<Role>> {
        let (_, role) = self.roles.remove(&id)?;
        let holders: Vec<Arc<Member>> = self
            .members
            .iter()
            .filter(|r| r.server_id == role.server_id && r.role_ids.contains(&id))
            .map(|r| r.clone())
            .collect();
        for member in holders {
            let mut next = (*member).clone();
            next.role_ids.retain(|role_id| *role_id != id);
            self.insert_member(next);
        }
        Some(role)
    }

    /// Roles of a server, lowest first
    pub fn server_roles(&self, server_id: Snowflake) -> Vec<Arc<Role>> {
        let mut roles: Vec<Arc<Role>> = self
            .roles
            .iter()
            .filter(|r| r.server_id == server_id)
            .map(|r| r.clone())
            .collect();
        roles.sort_by(|a, b| a.cmp_position(b));
        roles
    }

    /// Index of a role in its server's role hierarchy (0 is @everyone)
    pub fn role_position(&self, role_id: Snowflake) -> Option<usize> {
        let server_id = self.role(role_id)?.server_id;
        self.server_roles(server_id)
            .iter()
            .position(|r| r.id == role_id)
    }

    /// Members holding a role; every member holds @everyone
    pub fn role_members(&self, role_id: Snowflake) -> Vec<Arc<Member>> {
        let Some(role) = self.role(role_id) else {
            return Vec::new();
        };
        self.members
            .iter()
            .filter(|r| r.server_id == role.server_id && r.has_role(role_id))
            .map(|r| r.clone())
            .collect()
    }

    // =========================================================================
    // Users and Members
    // =========================================================================

    /// Insert or swap a user snapshot
    pub fn insert_user(&self, user: impl Into<Arc<User>>) -> Option<Arc<User>> {
        let user = user.into();
        if self.is_yourself(user.id) {
            *self.yourself.write() = Some(Arc::clone(&user));
        }
        self.users.insert(user.id, user)
    }

    pub fn user(&self, id: Snowflake) -> Option<Arc<User>> {
        self.users.get(&id).map(|r| r.clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Drop a user nobody needs anymore; returns whether it was removed
    pub fn remove_user_if_orphaned(&self, user_id: Snowflake) -> bool {
        if self.is_yourself(user_id)
            || self.private_channel_by_user.contains_key(&user_id)
            || self.members.iter().any(|r| r.key().1 == user_id)
        {
            return false;
        }
        self.presences.remove(&user_id);
        self.users.remove(&user_id).is_some()
    }

    pub fn insert_member(&self, member: impl Into<Arc<Member>>) -> Option<Arc<Member>> {
        let member = member.into();
        self.members.insert((member.server_id, member.user_id), member)
    }

    pub fn member(&self, server_id: Snowflake, user_id: Snowflake) -> Option<Arc<Member>> {
        self.members.get(&(server_id, user_id)).map(|r| r.clone())
    }

    pub fn remove_member(&self, server_id: Snowflake, user_id: Snowflake) -> Option<Arc<Member>> {
        self.members
            .remove(&(server_id, user_id))
            .map(|(_, member)| member)
    }

    pub fn server_members(&self, server_id: Snowflake) -> Vec<Arc<Member>> {
        self.members
            .iter()
            .filter(|r| r.key().0 == server_id)
            .map(|r| r.clone())
            .collect()
    }

    /// Servers a user is a cached member of
    pub fn member_servers(&self, user_id: Snowflake) -> Vec<Snowflake> {
        self.members
            .iter()
            .filter(|r| r.key().1 == user_id)
            .map(|r| r.key().0)
            .collect()
    }

    // =========================================================================
    // Presences
    // =========================================================================

    pub fn set_presence(&self, presence: impl Into<Arc<Presence>>) -> Option<Arc<Presence>> {
        let presence = presence.into();
        self.presences.insert(presence.user_id, presence)
    }

    pub fn presence(&self, user_id: Snowflake) -> Option<Arc<Presence>> {
        self.presences.get(&user_id).map(|r| r.clone())
    }

    // =========================================================================
    // Custom Emojis
    // =========================================================================

    pub fn insert_emoji(
        &self,
        emoji: impl Into<Arc<KnownCustomEmoji>>,
    ) -> Option<Arc<KnownCustomEmoji>> {
        let emoji = emoji.into();
        self.emojis.insert(emoji.id(), emoji)
    }

    pub fn emoji(&self, id: Snowflake) -> Option<Arc<KnownCustomEmoji>> {
        self.emojis.get(&id).map(|r| r.clone())
    }

    pub fn remove_emoji(&self, id: Snowflake) -> Option<Arc<KnownCustomEmoji>> {
        self.emojis.remove(&id).map(|(_, emoji)| emoji)
    }

    pub fn server_emojis(&self, server_id: Snowflake) -> Vec<Arc<KnownCustomEmoji>> {
        self.emojis
            .iter()
            .filter(|r| r.server_id == server_id)
            .map(|r| r.clone())
            .collect()
    }

    // =========================================================================
    // Scheduled Events
    // =========================================================================

    pub fn insert_scheduled_event(
        &self,
        event: impl Into<Arc<ScheduledEvent>>,
    ) -> Option<Arc<ScheduledEvent>> {
        let event = event.into();
        self.scheduled_events.insert(event.id, event)
    }

    pub fn scheduled_event(&self, id: Snowflake) -> Option<Arc<ScheduledEvent>> {
        self.scheduled_events.get(&id).map(|r| r.clone())
    }

    pub fn remove_scheduled_event(&self, id: Snowflake) -> Option<Arc<ScheduledEvent>> {
        self.scheduled_events.remove(&id).map(|(_, event)| event)
    }

    pub fn server_scheduled_events(&self, server_id: Snowflake) -> Vec<Arc<ScheduledEvent>> {
        let mut events: Vec<Arc<ScheduledEvent>> = self
            .scheduled_events
            .iter()
            .filter(|r| r.server_id == server_id)
            .map(|r| r.clone())
            .collect();
        events.sort_by_key(|e| (e.start_time, e.id));
        events
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Message cache of a channel, created on first use
    pub fn message_cache(&self, channel_id: Snowflake) -> Arc<Mutex<MessageCache>> {
        self.message_caches
            .entry(channel_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(MessageCache::new(
                    self.message_cache_capacity,
                    self.message_cache_storage_secs,
                )))
            })
            .clone()
    }

    /// Message cache of a channel, if one was created
    pub fn existing_message_cache(&self, channel_id: Snowflake) -> Option<Arc<Mutex<MessageCache>>> {
        self.message_caches.get(&channel_id).map(|r| r.clone())
    }

    /// Look up a cached message in any channel
    pub fn cached_message(&self, message_id: Snowflake) -> Option<Arc<Message>> {
        self.message_caches
            .iter()
            .find_map(|r| r.lock().get(message_id))
    }

    /// Cached message of a known channel
    pub fn channel_message(&self, channel_id: Snowflake, message_id: Snowflake) -> Option<Arc<Message>> {
        self.existing_message_cache(channel_id)?.lock().get(message_id)
    }

    /// Add a message to its channel's cache; returns `false` for duplicates
    pub fn add_message(&self, message: Arc<Message>) -> bool {
        self.message_cache(message.channel_id).lock().add(message)
    }

    /// Swap a cached message snapshot, returning the previous one
    pub fn update_message(&self, message: impl Into<Arc<Message>>) -> Option<Arc<Message>> {
        let message = message.into();
        self.existing_message_cache(message.channel_id)?
            .lock()
            .update(message)
    }

    pub fn remove_message(&self, channel_id: Snowflake, message_id: Snowflake) -> Option<Arc<Message>> {
        self.existing_message_cache(channel_id)?
            .lock()
            .remove(message_id)
    }

    /// Drop the message caches of every channel matching `pred`; returns how many were dropped
    pub fn evict_messages_where<F>(&self, pred: F) -> usize
    where
        F: Fn(Snowflake) -> bool,
    {
        let doomed: Vec<Snowflake> = self
            .message_caches
            .iter()
            .map(|r| *r.key())
            .filter(|id| pred(*id))
            .collect();
        for channel_id in &doomed {
            self.message_caches.remove(channel_id);
        }
        if !doomed.is_empty() {
            tracing::debug!(channels = doomed.len(), "Evicted message caches");
        }
        doomed.len()
    }

    /// Run `clean` on every message cache; returns the number of messages removed
    pub fn clean_message_caches(&self, now: DateTime<Utc>) -> usize {
        self.message_caches.iter().map(|r| r.lock().clean(now)).sum()
    }

    /// Channel ids with a message cache
    pub fn message_cache_channels(&self) -> HashSet<Snowflake> {
        self.message_caches.iter().map(|r| *r.key()).collect()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(50, 43_200)
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("servers", &self.servers.len())
            .field("channels", &self.channels.len())
            .field("roles", &self.roles.len())
            .field("users", &self.users.len())
            .field("members", &self.members.len())
            .field("message_caches", &self.message_caches.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cord_core::entities::{ChannelType, PrivateChannel};

    fn sf(id: u64) -> Snowflake {
        Snowflake::new(id)
    }

    fn populated() -> Cache {
        let cache = Cache::default();
        cache.insert_server(Server::new(sf(1), "guild", sf(10)));
        cache.insert_role(Role::new(sf(1), sf(1), "@everyone"));
        let mut mods = Role::new(sf(2), sf(1), "mods");
        mods.raw_position = 1;
        cache.insert_role(mods);
        cache.insert_channel(Channel::Server(ServerChannel::new(
            sf(100),
            sf(1),
            ChannelType::ServerText,
            "general",
        )));
        cache.insert_user(User::new(sf(10), "owner"));
        cache.insert_user(User::new(sf(11), "member"));
        cache.insert_member(Member::new(sf(1), sf(10)));
        let mut member = Member::new(sf(1), sf(11));
        member.role_ids.push(sf(2));
        cache.insert_member(member);
        cache
    }

    #[test]
    fn test_insert_returns_previous_snapshot() {
        let cache = Cache::default();
        assert!(cache.insert_user(User::new(sf(5), "old")).is_none());
        let previous = cache.insert_user(User::new(sf(5), "new")).unwrap();
        assert_eq!(previous.name, "old");
        assert_eq!(cache.user(sf(5)).unwrap().name, "new");
    }

    #[test]
    fn test_server_roles_sorted() {
        let cache = populated();
        let roles = cache.server_roles(sf(1));
        assert_eq!(roles.len(), 2);
        assert!(roles[0].is_everyone());
        assert_eq!(cache.role_position(sf(2)), Some(1));
        assert_eq!(cache.role_members(sf(2)).len(), 1);
        assert_eq!(cache.role_members(sf(1)).len(), 2);
    }

    #[test]
    fn test_remove_role_strips_members() {
        let cache = populated();
        assert!(cache.remove_role(sf(2)).is_some());
        assert!(cache.member(sf(1), sf(11)).unwrap().role_ids.is_empty());
    }

    #[test]
    fn test_remove_server_cascades() {
        let cache = populated();
        cache.insert_user(User::new(sf(12), "friend"));
        cache.insert_member(Member::new(sf(1), sf(12)));
        cache.insert_channel(Channel::Private(PrivateChannel {
            id: sf(200),
            recipient_id: sf(12),
        }));
        cache.add_message(Arc::new(message(sf(300), sf(100))));

        assert!(cache.remove_server(sf(1)).is_some());
        assert!(cache.channel(sf(100)).is_none());
        assert!(cache.role(sf(2)).is_none());
        assert!(cache.server_members(sf(1)).is_empty());
        assert!(cache.user(sf(11)).is_none());
        // kept alive by the private channel
        assert!(cache.user(sf(12)).is_some());
        assert!(cache.cached_message(sf(300)).is_none());
    }

    #[test]
    fn test_availability() {
        let cache = populated();
        assert!(cache.is_server_ready(sf(1)));
        cache.mark_unavailable(sf(1));
        assert!(!cache.is_server_ready(sf(1)));
        assert!(cache.mark_available(sf(1)));
        assert!(!cache.mark_available(sf(1)));
    }

    #[test]
    fn test_yourself_follows_user_updates() {
        let cache = Cache::default();
        cache.set_yourself(User::new(sf(7), "bot"));
        cache.insert_user(User::new(sf(7), "renamed"));
        assert_eq!(cache.yourself().unwrap().name, "renamed");
        assert!(!cache.remove_user_if_orphaned(sf(7)));
    }

    #[test]
    fn test_message_cache_roundtrip() {
        let cache = populated();
        let msg = Arc::new(message(sf(300), sf(100)));
        assert!(cache.add_message(Arc::clone(&msg)));
        assert!(!cache.add_message(msg));
        assert!(cache.channel_message(sf(100), sf(300)).is_some());

        let evicted = cache.evict_messages_where(|channel_id| channel_id == sf(100));
        assert_eq!(evicted, 1);
        assert!(cache.cached_message(sf(300)).is_none());
    }

    fn message(id: Snowflake, channel_id: Snowflake) -> Message {
        Message {
            id,
            channel_id,
            server_id: Some(sf(1)),
            author: cord_core::entities::MessageAuthor {
                id: sf(11),
                name: "member".to_string(),
                discriminator: "0".to_string(),
                avatar_hash: None,
                bot: false,
                webhook_id: None,
            },
            content: "hi".to_string(),
            created_at: Utc::now(),
            edited_at: None,
            tts: false,
            mention_everyone: false,
            mentioned_user_ids: Vec::new(),
            mentioned_role_ids: Vec::new(),
            attachments: Vec::new(),
            embeds: Vec::new(),
            reactions: Vec::new(),
            pinned: false,
            kind: 0,
            nonce: None,
            referenced_message_id: None,
            cached_forever: false,
        }
    }
}
