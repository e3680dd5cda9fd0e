//! Event listeners and their registry

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cord_core::{Event, ListenerScope};
use dashmap::DashMap;

/// Receives every event of the scopes it is registered for
#[async_trait]
pub trait EventListener: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);
}

/// Listener backed by an async closure
pub struct FnListener<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> EventListener for FnListener<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_event(&self, event: &Event) {
        (self.f)(event.clone()).await;
    }
}

/// Wrap an async closure as a listener
pub fn listener_fn<F, Fut>(f: F) -> Arc<dyn EventListener>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnListener { f })
}

/// Handle returned when a listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

type Registered = (ListenerId, Arc<dyn EventListener>);

/// Listener registry keyed by scope
pub struct ListenerManager {
    listeners: DashMap<ListenerScope, Vec<Registered>>,
    next_id: AtomicU64,
}

impl ListenerManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add(&self, scope: ListenerScope, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.entry(scope).or_default().push((id, listener));
        tracing::debug!(listener = %id, scope = %scope, "Listener registered");
        id
    }

    /// Returns whether a listener was removed
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, registered| {
            let before = registered.len();
            registered.retain(|(listener_id, _)| *listener_id != id);
            removed |= registered.len() != before;
            !registered.is_empty()
        });
        removed
    }

    /// Drop every listener attached to a scope, e.g. a deleted channel
    pub fn remove_scope(&self, scope: ListenerScope) -> usize {
        self.listeners
            .remove(&scope)
            .map_or(0, |(_, registered)| registered.len())
    }

    /// Global listeners plus those of the event's subjects.
    ///
    /// A listener registered under several matching scopes is returned once.
    pub fn listeners_for(&self, event: &Event) -> Vec<Arc<dyn EventListener>> {
        let mut found: Vec<Arc<dyn EventListener>> = Vec::new();
        let scopes = std::iter::once(ListenerScope::Global).chain(event.subjects());
        for scope in scopes {
            let Some(registered) = self.listeners.get(&scope) else {
                continue;
            };
            for (_, listener) in registered.iter() {
                let address = Arc::as_ptr(listener).cast::<()>();
                if !found.iter().any(|l| Arc::as_ptr(l).cast::<()>() == address) {
                    found.push(Arc::clone(listener));
                }
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.listeners.iter().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerManager")
            .field("scopes", &self.listeners.len())
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cord_core::events::{RoleEvent, RoleChange, RoleChangeEvent};
    use cord_core::{Change, Role, Snowflake};

    struct Noop;

    #[async_trait]
    impl EventListener for Noop {
        async fn on_event(&self, _event: &Event) {}
    }

    fn role_event() -> Event {
        Event::RoleCreate(RoleEvent {
            role: Arc::new(Role::new(Snowflake::new(5), Snowflake::new(1), "mods")),
        })
    }

    #[test]
    fn test_scoped_listeners() {
        let manager = ListenerManager::new();
        manager.add(ListenerScope::Global, Arc::new(Noop));
        manager.add(ListenerScope::Server(Snowflake::new(1)), Arc::new(Noop));
        manager.add(ListenerScope::Role(Snowflake::new(5)), Arc::new(Noop));
        manager.add(ListenerScope::Role(Snowflake::new(6)), Arc::new(Noop));
        manager.add(ListenerScope::Server(Snowflake::new(2)), Arc::new(Noop));

        assert_eq!(manager.len(), 5);
        assert_eq!(manager.listeners_for(&role_event()).len(), 3);
        assert_eq!(manager.listeners_for(&Event::Resumed).len(), 1);
    }

    #[test]
    fn test_same_listener_runs_once() {
        let manager = ListenerManager::new();
        let listener: Arc<dyn EventListener> = Arc::new(Noop);
        manager.add(ListenerScope::Server(Snowflake::new(1)), Arc::clone(&listener));
        manager.add(ListenerScope::Role(Snowflake::new(5)), listener);

        let event = Event::RoleChange(RoleChangeEvent {
            role: Arc::new(Role::new(Snowflake::new(5), Snowflake::new(1), "mods")),
            change: RoleChange::Hoist(Change::new(false, true)),
        });
        assert_eq!(manager.listeners_for(&event).len(), 1);
    }

    #[test]
    fn test_remove() {
        let manager = ListenerManager::new();
        let id = manager.add(ListenerScope::Global, Arc::new(Noop));
        let other = manager.add(ListenerScope::Role(Snowflake::new(5)), Arc::new(Noop));
        assert_ne!(id, other);

        assert!(manager.remove(id));
        assert!(!manager.remove(id));
        assert_eq!(manager.len(), 1);

        assert_eq!(manager.remove_scope(ListenerScope::Role(Snowflake::new(5))), 1);
        assert!(manager.is_empty());
    }
}
