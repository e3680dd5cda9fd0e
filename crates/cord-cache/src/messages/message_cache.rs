//! Message cache
//!
//! Bounded cache of the newest messages of one channel, ordered by id.
//! Messages flagged `cached_forever` do not count against the capacity
//! and are never trimmed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use cord_core::{Message, Snowflake};

/// Messages of a single channel
#[derive(Debug, Clone)]
pub struct MessageCache {
    messages: BTreeMap<Snowflake, Arc<Message>>,
    capacity: usize,
    storage_secs: u64,
}

impl MessageCache {
    /// Create a cache keeping at most `capacity` messages for `storage_secs` seconds
    #[must_use]
    pub fn new(capacity: usize, storage_secs: u64) -> Self {
        Self {
            messages: BTreeMap::new(),
            capacity,
            storage_secs,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity; takes effect on the next add or clean
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn storage_secs(&self) -> u64 {
        self.storage_secs
    }

    pub fn set_storage_secs(&mut self, storage_secs: u64) {
        self.storage_secs = storage_secs;
    }

    /// Add a message; returns `false` if its id is already cached
    pub fn add(&mut self, message: Arc<Message>) -> bool {
        if self.messages.contains_key(&message.id) {
            return false;
        }
        self.messages.insert(message.id, message);
        self.trim_to_capacity();
        true
    }

    /// Replace a cached message, returning the previous snapshot.
    ///
    /// Unknown ids are ignored.
    pub fn update(&mut self, message: Arc<Message>) -> Option<Arc<Message>> {
        let slot = self.messages.get_mut(&message.id)?;
        Some(std::mem::replace(slot, message))
    }

    pub fn remove(&mut self, id: Snowflake) -> Option<Arc<Message>> {
        self.messages.remove(&id)
    }

    pub fn get(&self, id: Snowflake) -> Option<Arc<Message>> {
        self.messages.get(&id).cloned()
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        self.messages.contains_key(&id)
    }

    /// Up to `n` newest messages, oldest first
    pub fn newest(&self, n: usize) -> Vec<Arc<Message>> {
        let mut newest: Vec<_> = self.messages.values().rev().take(n).cloned().collect();
        newest.reverse();
        newest
    }

    /// All messages, oldest first
    pub fn all(&self) -> Vec<Arc<Message>> {
        self.messages.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Flag a cached message as exempt (or no longer exempt) from trimming
    pub fn set_cached_forever(&mut self, id: Snowflake, forever: bool) -> bool {
        let Some(slot) = self.messages.get_mut(&id) else {
            return false;
        };
        if slot.cached_forever != forever {
            let mut next = (**slot).clone();
            next.cached_forever = forever;
            *slot = Arc::new(next);
        }
        true
    }

    /// Drop expired messages, then trim to capacity; returns the number removed
    pub fn clean(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.messages.len();
        let storage = Duration::seconds(i64::try_from(self.storage_secs).unwrap_or(i64::MAX));
        let min_age = now.checked_sub_signed(storage).unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.messages
            .retain(|_, message| message.cached_forever || message.created_at >= min_age);
        self.trim_to_capacity();
        before - self.messages.len()
    }

    fn trim_to_capacity(&mut self) {
        let forever = self.messages.values().filter(|m| m.cached_forever).count();
        let excess = self
            .messages
            .len()
            .saturating_sub(self.capacity)
            .saturating_sub(forever);
        if excess == 0 {
            return;
        }
        let oldest: Vec<Snowflake> = self
            .messages
            .values()
            .filter(|m| !m.cached_forever)
            .take(excess)
            .map(|m| m.id)
            .collect();
        for id in oldest {
            self.messages.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cord_core::entities::MessageAuthor;

    fn message_at(created_at: DateTime<Utc>, n: u64) -> Arc<Message> {
        let id = Snowflake::new(Snowflake::from_timestamp(created_at).into_inner() + n);
        Arc::new(Message {
            id,
            channel_id: Snowflake::new(1),
            server_id: None,
            author: MessageAuthor {
                id: Snowflake::new(2),
                name: "author".to_string(),
                discriminator: "0".to_string(),
                avatar_hash: None,
                bot: false,
                webhook_id: None,
            },
            content: format!("message {n}"),
            created_at,
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
        })
    }

    #[test]
    fn test_add_ignores_duplicates() {
        let mut cache = MessageCache::new(10, 3600);
        let message = message_at(Utc::now(), 0);
        assert!(cache.add(message.clone()));
        assert!(!cache.add(message));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_add_keeps_order_and_trims_oldest() {
        let now = Utc::now();
        let mut cache = MessageCache::new(2, 3600);
        let a = message_at(now, 1);
        let b = message_at(now, 2);
        let c = message_at(now, 3);
        cache.add(c.clone());
        cache.add(a.clone());
        cache.add(b.clone());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(a.id));
        let ids: Vec<_> = cache.all().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![b.id, c.id]);
    }

    #[test]
    fn test_forever_messages_survive_trimming() {
        let now = Utc::now();
        let mut cache = MessageCache::new(1, 3600);
        let pinned = message_at(now, 1);
        cache.add(pinned.clone());
        assert!(cache.set_cached_forever(pinned.id, true));
        cache.add(message_at(now, 2));
        cache.add(message_at(now, 3));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(pinned.id));
        assert!(cache.get(pinned.id).unwrap().cached_forever);
    }

    #[test]
    fn test_clean_drops_expired() {
        let now = Utc::now();
        let mut cache = MessageCache::new(10, 60);
        let old = message_at(now - Duration::seconds(120), 1);
        let old_forever = message_at(now - Duration::seconds(120), 2);
        let fresh = message_at(now - Duration::seconds(10), 3);
        cache.add(old.clone());
        cache.add(old_forever.clone());
        cache.add(fresh.clone());
        cache.set_cached_forever(old_forever.id, true);

        assert_eq!(cache.clean(now), 1);
        assert!(!cache.contains(old.id));
        assert!(cache.contains(old_forever.id));
        assert!(cache.contains(fresh.id));
    }

    #[test]
    fn test_clean_applies_lowered_capacity() {
        let now = Utc::now();
        let mut cache = MessageCache::new(5, 3600);
        for n in 0..5 {
            cache.add(message_at(now, n));
        }
        cache.set_capacity(0);
        assert_eq!(cache.clean(now), 5);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_update_and_newest() {
        let now = Utc::now();
        let mut cache = MessageCache::new(10, 3600);
        let first = message_at(now, 1);
        let second = message_at(now, 2);
        cache.add(first.clone());
        cache.add(second.clone());

        let mut edited = (*first).clone();
        edited.content = "edited".to_string();
        let previous = cache.update(Arc::new(edited)).unwrap();
        assert_eq!(previous.content, "message 1");
        assert_eq!(cache.get(first.id).unwrap().content, "edited");
        assert!(cache.update(message_at(now, 9)).is_none());

        let newest = cache.newest(1);
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].id, second.id);
        assert!(cache.remove(second.id).is_some());
        assert_eq!(cache.newest(5).len(), 1);
    }
}
