//! Event dispatcher
//!
//! Runs listeners on ordered queues: one per server and one global queue.
//! Events of the same server are delivered in order, different servers run
//! concurrently. Events of servers that are not ready yet are held back
//! until the server becomes available.
//!
//! Listeners are resolved when an event is dispatched, so a listener removed
//! by a later packet still sees the events queued before its removal.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cord_core::{Event, Snowflake};
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};

use super::{EventListener, ListenerManager};

/// Limits applied to every listener invocation
#[derive(Debug, Clone, Copy)]
pub struct ListenerTimeouts {
    /// Invocations slower than this are logged at debug
    pub debug_after: Duration,
    /// Invocations slower than this are logged at warn
    pub warn_after: Duration,
    /// Invocations are aborted after this
    pub max: Duration,
}

impl Default for ListenerTimeouts {
    fn default() -> Self {
        Self {
            debug_after: Duration::from_millis(500),
            warn_after: Duration::from_secs(10),
            max: Duration::from_secs(120),
        }
    }
}

/// Configuration for the event dispatcher
#[derive(Debug, Clone)]
pub struct EventDispatcherConfig {
    /// Drop events until the first READY was dispatched
    pub wait_for_ready: bool,
    /// Broadcast buffer size for [`EventDispatcher::subscribe`]
    pub broadcast_buffer: usize,
    pub timeouts: ListenerTimeouts,
}

impl Default for EventDispatcherConfig {
    fn default() -> Self {
        Self {
            wait_for_ready: true,
            broadcast_buffer: 1024,
            timeouts: ListenerTimeouts::default(),
        }
    }
}

type Job = (Arc<Event>, Vec<Arc<dyn EventListener>>);

struct Queue {
    tx: mpsc::UnboundedSender<Job>,
    /// Jobs sent but not yet completed
    in_flight: Arc<AtomicUsize>,
}

impl Queue {
    fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) == 0
    }
}

/// Routes events to the listeners registered for them
pub struct EventDispatcher {
    listeners: Arc<ListenerManager>,
    /// `None` is the global queue
    queues: DashMap<Option<Snowflake>, Queue>,
    /// Events held back until their server is ready
    pending: DashMap<Snowflake, Vec<Event>>,
    broadcast: broadcast::Sender<Arc<Event>>,
    can_dispatch: AtomicBool,
    timeouts: ListenerTimeouts,
}

impl EventDispatcher {
    pub fn new(listeners: Arc<ListenerManager>, config: EventDispatcherConfig) -> Self {
        let (broadcast, _) = broadcast::channel(config.broadcast_buffer.max(1));
        Self {
            listeners,
            queues: DashMap::new(),
            pending: DashMap::new(),
            broadcast,
            can_dispatch: AtomicBool::new(!config.wait_for_ready),
            timeouts: config.timeouts,
        }
    }

    pub fn listeners(&self) -> &Arc<ListenerManager> {
        &self.listeners
    }

    /// Receive every dispatched event as a stream
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.broadcast.subscribe()
    }

    pub fn can_dispatch(&self) -> bool {
        self.can_dispatch.load(Ordering::Acquire)
    }

    pub fn set_can_dispatch(&self, can_dispatch: bool) {
        self.can_dispatch.store(can_dispatch, Ordering::Release);
    }

    /// Queue an event for its listeners.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, event: Event) {
        if matches!(event, Event::Ready(_)) {
            self.set_can_dispatch(true);
        }
        if !self.can_dispatch() {
            tracing::trace!(event = event.event_type(), "Dispatching disabled, event dropped");
            return;
        }

        let server_id = event.server_id();
        let releases = match &event {
            Event::ServerBecomesAvailable(e) | Event::ServerJoin(e) => Some(e.server.id),
            _ => None,
        };
        let leaves = match &event {
            Event::ServerLeave(e) => Some(e.server.id),
            _ => None,
        };

        let event = Arc::new(event);
        let _ = self.broadcast.send(Arc::clone(&event));
        self.enqueue(server_id, event);

        if let Some(server_id) = releases {
            self.release(server_id);
        }
        if let Some(server_id) = leaves {
            // the queue stays until it ran dry, see `reap_queues`
            self.pending.remove(&server_id);
        }
    }

    /// Hold an event back until its server becomes available
    pub fn defer(&self, server_id: Snowflake, event: Event) {
        tracing::trace!(
            server_id = %server_id,
            event = event.event_type(),
            "Server not ready, event deferred"
        );
        self.pending.entry(server_id).or_default().push(event);
    }

    /// Dispatch every event deferred for a server
    pub fn release(&self, server_id: Snowflake) -> usize {
        let Some((_, events)) = self.pending.remove(&server_id) else {
            return 0;
        };
        let count = events.len();
        for event in events {
            self.dispatch(event);
        }
        tracing::debug!(server_id = %server_id, events = count, "Released deferred events");
        count
    }

    pub fn pending_count(&self, server_id: Snowflake) -> usize {
        self.pending.get(&server_id).map_or(0, |r| r.len())
    }

    /// Drop the idle queues and the deferred events of servers for which
    /// `keep` returns false. Queues with events still running are kept.
    pub fn reap_queues<F>(&self, keep: F) -> usize
    where
        F: Fn(Snowflake) -> bool,
    {
        let before = self.queues.len();
        self.queues
            .retain(|key, queue| key.map_or(true, |id| keep(id) || !queue.is_idle()));
        let reaped = before - self.queues.len();
        if reaped > 0 {
            tracing::debug!(queues = reaped, "Reaped idle dispatch queues");
        }

        let mut dropped = 0;
        self.pending.retain(|server_id, events| {
            let retain = keep(*server_id);
            if !retain {
                dropped += events.len();
            }
            retain
        });
        if dropped > 0 {
            tracing::debug!(events = dropped, "Dropped deferred events of departed servers");
        }
        reaped
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    fn enqueue(&self, key: Option<Snowflake>, event: Arc<Event>) {
        let listeners = self.listeners.listeners_for(&event);
        // sent under the entry lock so a reap cannot race the counter
        let mut queue = self.queues.entry(key).or_insert_with(|| self.spawn_queue(key));
        queue.in_flight.fetch_add(1, Ordering::AcqRel);
        if let Err(mpsc::error::SendError(job)) = queue.tx.send((event, listeners)) {
            // the queue task is gone; start a fresh one
            *queue = self.spawn_queue(key);
            queue.in_flight.fetch_add(1, Ordering::AcqRel);
            let _ = queue.tx.send(job);
        }
    }

    fn spawn_queue(&self, key: Option<Snowflake>) -> Queue {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&in_flight);
        let timeouts = self.timeouts;
        tokio::spawn(async move {
            while let Some((event, listeners)) = rx.recv().await {
                for listener in listeners {
                    invoke(listener, Arc::clone(&event), timeouts).await;
                }
                counter.fetch_sub(1, Ordering::AcqRel);
            }
            tracing::trace!(queue = ?key, "Dispatch queue closed");
        });
        Queue { tx, in_flight }
    }
}

/// Run one listener in its own task so panics and overruns stay contained
async fn invoke(listener: Arc<dyn EventListener>, event: Arc<Event>, timeouts: ListenerTimeouts) {
    let event_type = event.event_type();
    let started = Instant::now();
    let task = tokio::spawn(async move { listener.on_event(&event).await });
    let abort = task.abort_handle();

    match tokio::time::timeout(timeouts.max, task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.is_panic() => {
            tracing::error!(event = event_type, "Listener panicked");
            return;
        }
        Ok(Err(e)) => {
            tracing::warn!(event = event_type, error = %e, "Listener task cancelled");
            return;
        }
        Err(_) => {
            abort.abort();
            tracing::error!(
                event = event_type,
                max_secs = timeouts.max.as_secs(),
                "Listener timed out and was aborted"
            );
            return;
        }
    }

    let elapsed = started.elapsed();
    if elapsed > timeouts.warn_after {
        tracing::warn!(
            event = event_type,
            elapsed_ms = elapsed.as_millis() as u64,
            "Listener took very long, consider moving work off the dispatch queue"
        );
    } else if elapsed > timeouts.debug_after {
        tracing::debug!(
            event = event_type,
            elapsed_ms = elapsed.as_millis() as u64,
            "Slow listener"
        );
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .field("queues", &self.queues.len())
            .field("pending_servers", &self.pending.len())
            .field("can_dispatch", &self.can_dispatch())
            .finish_non_exhaustive()
    }
}
