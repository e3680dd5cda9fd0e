//! USER_UPDATE and the user merging shared by other handlers

use std::sync::Arc;

use cord_cache::Cache;
use cord_core::events::{UserChange, UserChangeEvent};
use cord_core::payloads::RawUser;
use cord_core::{Change, Event, User};
use serde_json::Value;

use super::{parse, HandlerContext, HandlerResult, PacketHandler};

/// Cache a user without firing events.
///
/// Partial objects never replace a cached user.
pub(crate) fn upsert_user(cache: &Cache, raw: &RawUser) -> Arc<User> {
    match cache.user(raw.id) {
        Some(old) if raw.is_partial() => old,
        Some(old) => {
            let next = raw.merge_into(&old);
            if next == *old {
                return old;
            }
            let next = Arc::new(next);
            cache.insert_user(Arc::clone(&next));
            next
        }
        None => {
            let user = Arc::new(raw.to_user());
            cache.insert_user(Arc::clone(&user));
            user
        }
    }
}

/// Apply user data carried by another packet, firing `UserChange` per changed field
pub(crate) fn apply_user_update(cache: &Cache, raw: &RawUser) -> Vec<Event> {
    let Some(old) = cache.user(raw.id) else {
        if !raw.is_partial() {
            upsert_user(cache, raw);
        }
        return Vec::new();
    };
    if raw.is_partial() {
        return Vec::new();
    }

    let next = raw.merge_into(&old);
    let mut changes = Vec::new();
    if let Some(change) = Change::diff_ref(&old.name, &next.name) {
        changes.push(UserChange::Name(change));
    }
    if let Some(change) = Change::diff_ref(&old.discriminator, &next.discriminator) {
        changes.push(UserChange::Discriminator(change));
    }
    if let Some(change) = Change::diff_ref(&old.avatar_hash, &next.avatar_hash) {
        changes.push(UserChange::Avatar(change));
    }
    if let Some(change) = Change::diff_ref(&old.global_name, &next.global_name) {
        changes.push(UserChange::GlobalName(change));
    }
    if changes.is_empty() {
        return Vec::new();
    }

    let user = Arc::new(next);
    cache.insert_user(Arc::clone(&user));
    changes
        .into_iter()
        .map(|change| {
            Event::UserChange(UserChangeEvent {
                user: Arc::clone(&user),
                change,
            })
        })
        .collect()
}

/// USER_UPDATE - the connected account changed
pub struct UserUpdateHandler;

impl PacketHandler for UserUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawUser = parse(data)?;
        Ok(apply_user_update(ctx.cache(), &raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{seeded, sf};
    use serde_json::json;

    #[test]
    fn test_user_update_diffs_fields() {
        let ctx = seeded();
        let events = UserUpdateHandler
            .handle(
                &ctx,
                json!({"id": "9", "username": "renamed", "discriminator": "0", "avatar": "a1"}),
            )
            .unwrap();

        let changes: Vec<&UserChange> = events
            .iter()
            .map(|e| match e {
                Event::UserChange(e) => &e.change,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(changes.len(), 2);
        assert!(matches!(changes[0], UserChange::Name(c) if c.new == "renamed"));
        assert!(matches!(changes[1], UserChange::Avatar(c) if c.new.as_deref() == Some("a1")));
        assert_eq!(ctx.cache().yourself().unwrap().name, "renamed");
    }

    #[test]
    fn test_partial_user_is_ignored() {
        let ctx = seeded();
        let events = apply_user_update(ctx.cache(), &RawUser {
            id: sf(10),
            ..RawUser::default()
        });
        assert!(events.is_empty());
        assert_eq!(ctx.cache().user(sf(10)).unwrap().name, "owner");
    }

    #[test]
    fn test_upsert_unknown_user() {
        let ctx = seeded();
        let raw: RawUser = serde_json::from_value(json!({"id": "44", "username": "new"})).unwrap();
        let user = upsert_user(ctx.cache(), &raw);
        assert_eq!(user.name, "new");
        assert!(ctx.cache().user(sf(44)).is_some());
    }
}
