//! Background cleanup
//!
//! Expires old cached messages and drops deferred-event queues of servers
//! that are gone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cord_cache::SharedCache;
use cord_gateway::{EventDispatcher, GatewayClient};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// One cleanup pass; returns evicted messages and reaped queues
pub fn run_once(cache: &SharedCache, dispatcher: &EventDispatcher) -> (usize, usize) {
    let messages = cache.clean_message_caches(Utc::now());
    let queues = dispatcher.reap_queues(|server_id| cache.server(server_id).is_some() || cache.is_unavailable(server_id));
    (messages, queues)
}

pub(crate) fn spawn(cache: SharedCache, dispatcher: Arc<EventDispatcher>, client: Arc<GatewayClient>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if client.is_stopped() {
                break;
            }

            let (messages, queues) = run_once(&cache, &dispatcher);
            if messages > 0 || queues > 0 {
                tracing::debug!(messages, queues, "Cleaned caches");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cord_cache::Cache;
    use cord_core::events::ServerEvent;
    use cord_core::{Event, Server, Snowflake};
    use cord_gateway::{EventDispatcherConfig, ListenerManager};

    fn unavailable(id: u64) -> Event {
        Event::ServerBecomesUnavailable(ServerEvent {
            server: Arc::new(Server::new(Snowflake::new(id), "s", Snowflake::new(9))),
        })
    }

    #[tokio::test]
    async fn test_reaps_queues_of_unknown_servers() {
        let cache = Cache::new_shared(10, 60);
        let dispatcher = EventDispatcher::new(ListenerManager::new_shared(), EventDispatcherConfig::default());
        dispatcher.set_can_dispatch(true);

        cache.insert_server(Server::new(Snowflake::new(1), "kept", Snowflake::new(9)));
        dispatcher.dispatch(unavailable(1));
        dispatcher.dispatch(unavailable(2));
        let before = dispatcher.queue_count();
        // busy queues are kept
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (messages, queues) = run_once(&cache, &dispatcher);
        assert_eq!(messages, 0);
        assert_eq!(queues, 1);
        assert_eq!(dispatcher.queue_count(), before - 1);
    }
}
