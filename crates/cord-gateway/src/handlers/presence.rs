//! PRESENCE_UPDATE and TYPING_START

use std::sync::Arc;

use cord_core::entities::{ClientStatus, UserStatus};
use cord_core::events::{UserChangeActivityEvent, UserChangeStatusEvent, UserStartTypingEvent};
use cord_core::payloads::{RawMember, RawPresence};
use cord_core::{Change, Event, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::user::{apply_user_update, upsert_user};
use super::{parse, HandlerContext, HandlerResult, PacketHandler};

/// PRESENCE_UPDATE - status, activities and partial user data
pub struct PresenceUpdateHandler;

impl PacketHandler for PresenceUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawPresence = parse(data)?;
        let cache = ctx.cache();
        let user_id = raw.user.id;

        let presence = Arc::new(raw.to_presence());
        let old = cache.set_presence(Arc::clone(&presence));
        let (old_status, old_client_status, old_activities) = match &old {
            Some(old) => (old.status, old.client_status, old.activities.clone()),
            None => (UserStatus::Offline, ClientStatus::default(), Vec::new()),
        };

        let mut events = Vec::new();
        if old_status != presence.status || old_client_status != presence.client_status {
            events.push(Event::UserChangeStatus(UserChangeStatusEvent {
                user_id,
                server_id: raw.guild_id,
                status: Change::new(old_status, presence.status),
                client_status: Change::new(old_client_status, presence.client_status),
            }));
        }
        if old_activities != presence.activities {
            events.push(Event::UserChangeActivity(UserChangeActivityEvent {
                user_id,
                server_id: raw.guild_id,
                activities: Change::new(old_activities, presence.activities.clone()),
            }));
        }

        events.extend(apply_user_update(cache, &raw.user));
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
struct TypingStartPacket {
    channel_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    user_id: Snowflake,
    #[serde(default)]
    member: Option<RawMember>,
}

/// TYPING_START
pub struct TypingStartHandler;

impl PacketHandler for TypingStartHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: TypingStartPacket = parse(data)?;
        let cache = ctx.cache();

        let member = match (packet.guild_id, &packet.member) {
            (Some(server_id), Some(raw)) => Some(cache.member(server_id, packet.user_id).unwrap_or_else(|| {
                if let Some(user) = &raw.user {
                    upsert_user(cache, user);
                }
                Arc::new(raw.to_member_of(server_id, packet.user_id))
            })),
            (Some(server_id), None) => cache.member(server_id, packet.user_id),
            (None, _) => None,
        };

        Ok(vec![Event::UserStartTyping(UserStartTypingEvent {
            user_id: packet.user_id,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            member,
        })])
    }
}
