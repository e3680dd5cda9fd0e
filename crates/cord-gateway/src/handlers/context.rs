//! Shared state handed to every packet handler

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cord_cache::SharedCache;
use cord_core::events::ReadyEvent;
use cord_core::{Event, ListenerScope, Server, Snowflake};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::broadcast::EventDispatcher;

/// Startup bookkeeping between READY and the last awaited GUILD_CREATE
#[derive(Debug, Default)]
struct Startup {
    awaiting: HashSet<Snowflake>,
    ready: Option<ReadyEvent>,
    last_progress: Option<Instant>,
}

/// Cache, dispatcher and startup state used by the handlers
pub struct HandlerContext {
    cache: SharedCache,
    dispatcher: Arc<EventDispatcher>,
    wait_for_servers: bool,
    startup: Mutex<Startup>,
    /// Listener scopes of deleted entities, dropped after the packet's events
    retired: Mutex<Vec<ListenerScope>>,
    /// Number of completed startups
    readiness: watch::Sender<u64>,
}

impl HandlerContext {
    pub fn new(cache: SharedCache, dispatcher: Arc<EventDispatcher>, wait_for_servers: bool) -> Self {
        let (readiness, _) = watch::channel(0);
        Self {
            cache,
            dispatcher,
            wait_for_servers,
            startup: Mutex::new(Startup::default()),
            retired: Mutex::new(Vec::new()),
            readiness,
        }
    }

    #[inline]
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    #[inline]
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Receiver that observes every completed startup
    pub fn subscribe_ready(&self) -> watch::Receiver<u64> {
        self.readiness.subscribe()
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Start waiting for the servers listed in READY.
    ///
    /// Returns the ready events right away when there is nothing to wait for.
    pub fn begin_startup(
        &self,
        ready: ReadyEvent,
        servers: impl IntoIterator<Item = Snowflake>,
    ) -> Vec<Event> {
        let awaiting: HashSet<Snowflake> = if self.wait_for_servers {
            servers.into_iter().collect()
        } else {
            HashSet::new()
        };

        let mut startup = self.startup.lock();
        if awaiting.is_empty() {
            *startup = Startup::default();
            drop(startup);
            return self.announce_ready(ready);
        }

        tracing::debug!(servers = awaiting.len(), "Waiting for servers");
        *startup = Startup {
            awaiting,
            ready: Some(ready),
            last_progress: Some(Instant::now()),
        };
        Vec::new()
    }

    /// Record a GUILD_CREATE.
    ///
    /// Returns whether the server was awaited and the ready events if it
    /// was the last one.
    pub fn server_loaded(&self, server_id: Snowflake) -> (bool, Vec<Event>) {
        let mut startup = self.startup.lock();
        if startup.ready.is_none() {
            return (false, Vec::new());
        }
        let awaited = startup.awaiting.remove(&server_id);
        startup.last_progress = Some(Instant::now());
        if !startup.awaiting.is_empty() {
            return (awaited, Vec::new());
        }
        let ready = startup.ready.take();
        drop(startup);
        (awaited, ready.map(|r| self.announce_ready(r)).unwrap_or_default())
    }

    /// Stop waiting for a server we were removed from during startup
    pub fn server_gone(&self, server_id: Snowflake) -> Vec<Event> {
        self.server_loaded(server_id).1
    }

    /// Give up waiting; returns the ready events if startup was still running
    pub fn finish_startup(&self) -> Vec<Event> {
        let ready = {
            let mut startup = self.startup.lock();
            if !startup.awaiting.is_empty() {
                tracing::warn!(
                    missing = startup.awaiting.len(),
                    "Servers did not arrive in time, continuing without them"
                );
            }
            std::mem::take(&mut *startup).ready
        };
        ready.map(|r| self.announce_ready(r)).unwrap_or_default()
    }

    pub fn is_starting(&self) -> bool {
        self.startup.lock().ready.is_some()
    }

    /// Time since the last awaited server arrived, while starting
    pub fn stalled_for(&self) -> Option<Duration> {
        let startup = self.startup.lock();
        startup.ready.as_ref()?;
        startup.last_progress.map(|at| at.elapsed())
    }

    /// Ready for the first startup; ready and reconnect afterwards
    fn announce_ready(&self, ready: ReadyEvent) -> Vec<Event> {
        let mut completed = 0;
        self.readiness.send_modify(|count| {
            completed = *count;
            *count += 1;
        });
        tracing::info!(session_id = %ready.session_id, user = %ready.user.name, "Ready");
        if completed == 0 {
            vec![Event::Ready(ready)]
        } else {
            vec![Event::Ready(ready), Event::Reconnect]
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Hand events to the dispatcher, holding back those of unavailable servers
    pub fn emit(&self, events: Vec<Event>, requires_ready: bool) {
        for event in events {
            match event.server_id() {
                Some(server_id) if requires_ready && self.cache.is_unavailable(server_id) => {
                    self.dispatcher.defer(server_id, event);
                }
                _ => self.dispatcher.dispatch(event),
            }
        }
    }

    /// Remove the listeners of deleted entities once the current packet's
    /// events are dispatched
    pub fn retire_listeners(&self, scopes: impl IntoIterator<Item = ListenerScope>) {
        self.retired.lock().extend(scopes);
    }

    /// Remove the listeners retired by the current packet
    pub(crate) fn drop_retired_listeners(&self) -> usize {
        let scopes = std::mem::take(&mut *self.retired.lock());
        let listeners = self.dispatcher.listeners();
        let removed: usize = scopes.into_iter().map(|scope| listeners.remove_scope(scope)).sum();
        if removed > 0 {
            tracing::debug!(listeners = removed, "Removed listeners of deleted entities");
        }
        removed
    }

    /// Cached server a packet refers to; warns when it is missing
    pub fn require_server(&self, server_id: Snowflake, packet: &'static str) -> Option<Arc<Server>> {
        let server = self.cache.server(server_id);
        if server.is_none() {
            tracing::warn!(server_id = %server_id, packet, "Packet for unknown server");
        }
        server
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("wait_for_servers", &self.wait_for_servers)
            .field("starting", &self.is_starting())
            .field("readiness", &*self.readiness.borrow())
            .finish_non_exhaustive()
    }
}
