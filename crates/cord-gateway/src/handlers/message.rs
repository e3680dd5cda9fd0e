//! Message packets

use std::sync::Arc;

use cord_core::events::{MessageBulkDeleteEvent, MessageCreateEvent, MessageDeleteEvent, MessageEditEvent};
use cord_core::payloads::RawMessage;
use cord_core::{Change, Channel, Event, PrivateChannel, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::user::upsert_user;
use super::{parse, HandlerContext, HandlerError, HandlerResult, PacketHandler};

/// MESSAGE_CREATE
pub struct MessageCreateHandler;

impl PacketHandler for MessageCreateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawMessage = parse(data)?;
        let message = raw.to_message().ok_or(HandlerError::MissingField("author"))?;
        let cache = ctx.cache();
        let author_id = message.author.id;

        if cache.channel(raw.channel_id).is_none() {
            if raw.guild_id.is_some() {
                tracing::warn!(channel_id = %raw.channel_id, "Message in unknown channel");
                return Ok(Vec::new());
            }
            if !cache.is_yourself(author_id) {
                cache.insert_channel(Channel::Private(PrivateChannel {
                    id: raw.channel_id,
                    recipient_id: author_id,
                }));
            }
        }

        if raw.webhook_id.is_none() {
            if let Some(author) = &raw.author {
                upsert_user(cache, author);
            }
        }
        if let (Some(server_id), Some(member)) = (raw.guild_id, &raw.member) {
            if cache.member(server_id, author_id).is_none() {
                cache.insert_member(member.to_member_of(server_id, author_id));
            }
        }

        let message = Arc::new(message);
        cache.add_message(Arc::clone(&message));
        Ok(vec![Event::MessageCreate(MessageCreateEvent { message })])
    }
}

/// MESSAGE_UPDATE - edits and embed unfurls
pub struct MessageUpdateHandler;

impl PacketHandler for MessageUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let raw: RawMessage = parse(data)?;
        if raw.content.is_none() && raw.embeds.is_none() {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();

        let Some(old) = cache.channel_message(raw.channel_id, raw.id) else {
            if raw.edited_timestamp.is_none() {
                return Ok(Vec::new());
            }
            return Ok(vec![Event::MessageEdit(MessageEditEvent {
                message_id: raw.id,
                channel_id: raw.channel_id,
                server_id: raw.guild_id,
                content: Change::new(None, raw.content.clone()),
                embeds: Change::new(None, raw.embeds.clone()),
                message: None,
            })]);
        };

        let message = Arc::new(raw.merge_into(&old));
        cache.update_message(Arc::clone(&message));

        let newly_edited = raw
            .edited_timestamp
            .is_some_and(|edited| old.edited_at != Some(edited));
        if !newly_edited && old.content == message.content && old.embeds == message.embeds {
            return Ok(Vec::new());
        }

        Ok(vec![Event::MessageEdit(MessageEditEvent {
            message_id: message.id,
            channel_id: message.channel_id,
            server_id: message.server_id,
            content: Change::new(Some(old.content.clone()), Some(message.content.clone())),
            embeds: Change::new(Some(old.embeds.clone()), Some(message.embeds.clone())),
            message: Some(message),
        })])
    }
}

#[derive(Debug, Deserialize)]
struct MessageDeletePacket {
    id: Snowflake,
    channel_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
}

/// MESSAGE_DELETE
pub struct MessageDeleteHandler;

impl PacketHandler for MessageDeleteHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: MessageDeletePacket = parse(data)?;
        let message = ctx.cache().remove_message(packet.channel_id, packet.id);
        Ok(vec![Event::MessageDelete(MessageDeleteEvent {
            message_id: packet.id,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            message,
        })])
    }
}

#[derive(Debug, Deserialize)]
struct MessageDeleteBulkPacket {
    ids: Vec<Snowflake>,
    channel_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
}

/// MESSAGE_DELETE_BULK
pub struct MessageDeleteBulkHandler;

impl PacketHandler for MessageDeleteBulkHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: MessageDeleteBulkPacket = parse(data)?;
        let cache = ctx.cache();
        let messages = packet
            .ids
            .iter()
            .filter_map(|id| cache.remove_message(packet.channel_id, *id))
            .collect();
        Ok(vec![Event::MessageBulkDelete(MessageBulkDeleteEvent {
            message_ids: packet.ids,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            messages,
        })])
    }
}
