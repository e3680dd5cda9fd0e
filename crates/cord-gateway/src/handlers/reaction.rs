//! Reaction packets

use std::sync::Arc;

use cord_core::events::{ReactionEvent, ReactionRemoveAllEvent, ReactionRemoveEmojiEvent};
use cord_core::payloads::{RawEmoji, RawMember};
use cord_core::{Channel, Emoji, Event, Message, PrivateChannel, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::user::upsert_user;
use super::{parse, HandlerContext, HandlerResult, PacketHandler};

#[derive(Debug, Deserialize)]
struct ReactionPacket {
    user_id: Snowflake,
    channel_id: Snowflake,
    message_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    #[serde(default)]
    member: Option<RawMember>,
    emoji: RawEmoji,
    #[serde(default)]
    burst: bool,
    #[serde(default)]
    burst_colors: Vec<String>,
}

/// Make sure the channel is known; DMs open the private channel on the fly
fn resolve_channel(
    ctx: &HandlerContext,
    channel_id: Snowflake,
    server_id: Option<Snowflake>,
    user_id: Snowflake,
) -> bool {
    let cache = ctx.cache();
    if cache.channel(channel_id).is_some() {
        return true;
    }
    if server_id.is_some() {
        tracing::warn!(channel_id = %channel_id, "Reaction in unknown channel");
        return false;
    }
    if !cache.is_yourself(user_id) {
        cache.insert_channel(Channel::Private(PrivateChannel {
            id: channel_id,
            recipient_id: user_id,
        }));
    }
    true
}

/// Unicode, a known custom emoji, or an ad-hoc custom emoji from another server
fn resolve_emoji(ctx: &HandlerContext, raw: &RawEmoji) -> Emoji {
    raw.id
        .and_then(|id| ctx.cache().emoji(id))
        .map_or_else(|| raw.to_emoji(), |known| known.as_emoji())
}

/// Swap the cached message through `update`, returning the new snapshot
fn update_cached<F>(ctx: &HandlerContext, channel_id: Snowflake, message_id: Snowflake, update: F) -> Option<Arc<Message>>
where
    F: FnOnce(&Message) -> Message,
{
    let cache = ctx.cache();
    let old = cache.channel_message(channel_id, message_id)?;
    let next = Arc::new(update(&old));
    cache.update_message(Arc::clone(&next));
    Some(next)
}

/// MESSAGE_REACTION_ADD
pub struct ReactionAddHandler;

impl PacketHandler for ReactionAddHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ReactionPacket = parse(data)?;
        if !resolve_channel(ctx, packet.channel_id, packet.guild_id, packet.user_id) {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();

        let emoji = resolve_emoji(ctx, &packet.emoji);
        let by_me = cache.is_yourself(packet.user_id);
        let message = update_cached(ctx, packet.channel_id, packet.message_id, |message| {
            message.with_reaction_added(&emoji, by_me, packet.burst, &packet.burst_colors)
        });

        let member = match (packet.guild_id, &packet.member) {
            (Some(server_id), Some(raw)) => {
                if let Some(user) = &raw.user {
                    upsert_user(cache, user);
                }
                Some(
                    cache
                        .member(server_id, packet.user_id)
                        .unwrap_or_else(|| Arc::new(raw.to_member_of(server_id, packet.user_id))),
                )
            }
            _ => None,
        };

        Ok(vec![Event::ReactionAdd(ReactionEvent {
            message_id: packet.message_id,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            user_id: packet.user_id,
            emoji,
            member,
            burst: packet.burst,
            burst_colors: packet.burst_colors,
            message,
        })])
    }
}

/// MESSAGE_REACTION_REMOVE
pub struct ReactionRemoveHandler;

impl PacketHandler for ReactionRemoveHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ReactionPacket = parse(data)?;
        if !resolve_channel(ctx, packet.channel_id, packet.guild_id, packet.user_id) {
            return Ok(Vec::new());
        }

        let emoji = resolve_emoji(ctx, &packet.emoji);
        let by_me = ctx.cache().is_yourself(packet.user_id);
        let message = update_cached(ctx, packet.channel_id, packet.message_id, |message| {
            message.with_reaction_removed(&emoji, by_me, packet.burst)
        });

        Ok(vec![Event::ReactionRemove(ReactionEvent {
            message_id: packet.message_id,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            user_id: packet.user_id,
            emoji,
            member: None,
            burst: packet.burst,
            burst_colors: Vec::new(),
            message,
        })])
    }
}

#[derive(Debug, Deserialize)]
struct ReactionRemoveAllPacket {
    channel_id: Snowflake,
    message_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
}

/// MESSAGE_REACTION_REMOVE_ALL
pub struct ReactionRemoveAllHandler;

impl PacketHandler for ReactionRemoveAllHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ReactionRemoveAllPacket = parse(data)?;
        let message = update_cached(ctx, packet.channel_id, packet.message_id, Message::with_all_reactions_cleared);
        Ok(vec![Event::ReactionRemoveAll(ReactionRemoveAllEvent {
            message_id: packet.message_id,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            message,
        })])
    }
}

#[derive(Debug, Deserialize)]
struct ReactionRemoveEmojiPacket {
    channel_id: Snowflake,
    message_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    emoji: RawEmoji,
}

/// MESSAGE_REACTION_REMOVE_EMOJI
pub struct ReactionRemoveEmojiHandler;

impl PacketHandler for ReactionRemoveEmojiHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: ReactionRemoveEmojiPacket = parse(data)?;
        let emoji = resolve_emoji(ctx, &packet.emoji);
        let message = update_cached(ctx, packet.channel_id, packet.message_id, |message| {
            message.with_emoji_reactions_cleared(&emoji)
        });
        Ok(vec![Event::ReactionRemoveEmoji(ReactionRemoveEmojiEvent {
            message_id: packet.message_id,
            channel_id: packet.channel_id,
            server_id: packet.guild_id,
            emoji,
            message,
        })])
    }
}
