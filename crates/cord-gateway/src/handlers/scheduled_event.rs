//! Scheduled event packets

use std::sync::Arc;

use cord_core::events::{
    ScheduledEventChange, ScheduledEventChangeEvent, ScheduledEventEvent, ScheduledEventUserEvent,
};
use cord_core::payloads::RawScheduledEvent;
use cord_core::{Change, Event, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::{parse, HandlerContext, HandlerResult, PacketHandler};

/// GUILD_SCHEDULED_EVENT_CREATE
pub struct ScheduledEventCreateHandler;

impl PacketHandler for ScheduledEventCreateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawScheduledEvent = parse(data)?;
        if ctx.require_server(raw.guild_id, "GUILD_SCHEDULED_EVENT_CREATE").is_none() {
            return Ok(Vec::new());
        }
        let event = Arc::new(raw.to_event());
        ctx.cache().insert_scheduled_event(Arc::clone(&event));
        Ok(vec![Event::ScheduledEventCreate(ScheduledEventEvent { event })])
    }
}

/// GUILD_SCHEDULED_EVENT_UPDATE
pub struct ScheduledEventUpdateHandler;

impl PacketHandler for ScheduledEventUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawScheduledEvent = parse(data)?;
        if ctx.require_server(raw.guild_id, "GUILD_SCHEDULED_EVENT_UPDATE").is_none() {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();

        let mut next = raw.to_event();
        let old = cache.scheduled_event(raw.id);
        if let Some(old) = &old {
            next.user_count = next.user_count.or(old.user_count);
        }
        let event = Arc::new(next);
        cache.insert_scheduled_event(Arc::clone(&event));
        let Some(old) = old else {
            return Ok(Vec::new());
        };

        let mut changes = Vec::new();
        if let Some(change) = Change::diff_ref(&old.name, &event.name) {
            changes.push(ScheduledEventChange::Name(change));
        }
        if let Some(change) = Change::diff_ref(&old.description, &event.description) {
            changes.push(ScheduledEventChange::Description(change));
        }
        if let Some(change) = Change::diff(old.start_time, event.start_time) {
            changes.push(ScheduledEventChange::StartTime(change));
        }
        if let Some(change) = Change::diff(old.end_time, event.end_time) {
            changes.push(ScheduledEventChange::EndTime(change));
        }
        if let Some(change) = Change::diff(old.status, event.status) {
            changes.push(ScheduledEventChange::Status(change));
        }
        if let Some(change) = Change::diff_ref(&old.location, &event.location) {
            changes.push(ScheduledEventChange::Location(change));
        }

        Ok(changes
            .into_iter()
            .map(|change| {
                Event::ScheduledEventChange(ScheduledEventChangeEvent {
                    event: Arc::clone(&event),
                    change,
                })
            })
            .collect())
    }
}

/// GUILD_SCHEDULED_EVENT_DELETE
pub struct ScheduledEventDeleteHandler;

impl PacketHandler for ScheduledEventDeleteHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawScheduledEvent = parse(data)?;
        let event = ctx
            .cache()
            .remove_scheduled_event(raw.id)
            .unwrap_or_else(|| Arc::new(raw.to_event()));
        Ok(vec![Event::ScheduledEventDelete(ScheduledEventEvent { event })])
    }
}

#[derive(Debug, Deserialize)]
struct ScheduledEventUserPacket {
    guild_scheduled_event_id: Snowflake,
    user_id: Snowflake,
    guild_id: Snowflake,
}

/// GUILD_SCHEDULED_EVENT_USER_ADD and GUILD_SCHEDULED_EVENT_USER_REMOVE
pub struct ScheduledEventUserHandler {
    pub added: bool,
}

impl PacketHandler for ScheduledEventUserHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ScheduledEventUserPacket = parse(data)?;
        let cache = ctx.cache();

        if let Some(event) = cache.scheduled_event(packet.guild_scheduled_event_id) {
            if let Some(count) = event.user_count {
                let mut next = (*event).clone();
                next.user_count = Some(if self.added {
                    count.saturating_add(1)
                } else {
                    count.saturating_sub(1)
                });
                cache.insert_scheduled_event(next);
            }
        }

        let event = ScheduledEventUserEvent {
            event_id: packet.guild_scheduled_event_id,
            server_id: packet.guild_id,
            user_id: packet.user_id,
        };
        Ok(vec![if self.added {
            Event::ScheduledEventUserAdd(event)
        } else {
            Event::ScheduledEventUserRemove(event)
        }])
    }
}
