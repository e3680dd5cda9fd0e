//! READY and RESUMED

use std::sync::Arc;

use cord_core::events::ReadyEvent;
use cord_core::payloads::{RawChannel, RawUser};
use cord_core::{Event, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::{parse, HandlerContext, HandlerResult, PacketHandler};

#[derive(Debug, Deserialize)]
struct UnavailableServer {
    id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct ReadyPacket {
    session_id: String,
    user: RawUser,
    #[serde(default)]
    guilds: Vec<UnavailableServer>,
    #[serde(default)]
    private_channels: Vec<RawChannel>,
}

/// READY - a new session started
pub struct ReadyHandler;

impl PacketHandler for ReadyHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ReadyPacket = parse(data)?;
        let cache = ctx.cache();

        let user = Arc::new(packet.user.to_user());
        cache.set_yourself(Arc::clone(&user));

        for raw in &packet.private_channels {
            if let Some(channel) = raw.to_channel(None) {
                cache.insert_channel(channel);
            }
        }
        for server in &packet.guilds {
            cache.mark_unavailable(server.id);
        }

        tracing::info!(
            session_id = %packet.session_id,
            user_id = %user.id,
            servers = packet.guilds.len(),
            "Session started"
        );

        let ready = ReadyEvent {
            session_id: packet.session_id,
            user,
        };
        Ok(ctx.begin_startup(ready, packet.guilds.iter().map(|s| s.id)))
    }

    fn requires_ready(&self) -> bool {
        false
    }
}

/// RESUMED - missed events were replayed
pub struct ResumedHandler;

impl PacketHandler for ResumedHandler {
    fn handle(&self, _ctx: &HandlerContext, _data: Value) -> HandlerResult<Vec<Event>> {
        tracing::info!("Session resumed");
        Ok(vec![Event::Resumed])
    }

    fn requires_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{context, sf};
    use serde_json::json;

    #[test]
    fn test_ready_marks_servers_unavailable() {
        let ctx = context();
        let events = ReadyHandler
            .handle(
                &ctx,
                json!({
                    "v": 10,
                    "session_id": "s1",
                    "resume_gateway_url": "wss://resume.example",
                    "user": {"id": "9", "username": "bot", "bot": true},
                    "guilds": [{"id": "1", "unavailable": true}, {"id": "2", "unavailable": true}],
                    "private_channels": [{"id": "50", "type": 1, "recipients": [{"id": "7"}]}]
                }),
            )
            .unwrap();

        assert!(events.is_empty());
        assert!(ctx.is_starting());
        let cache = ctx.cache();
        assert_eq!(cache.yourself_id(), Some(sf(9)));
        assert!(cache.is_unavailable(sf(1)));
        assert!(cache.is_unavailable(sf(2)));
        assert_eq!(cache.private_channel_for(sf(7)).unwrap().id(), sf(50));
    }

    #[test]
    fn test_ready_without_servers_fires_immediately() {
        let ctx = context();
        let events = ReadyHandler
            .handle(
                &ctx,
                json!({"session_id": "s1", "user": {"id": "9", "username": "bot"}, "guilds": []}),
            )
            .unwrap();
        assert!(matches!(events.as_slice(), [Event::Ready(ready)] if ready.session_id == "s1"));
    }
}
