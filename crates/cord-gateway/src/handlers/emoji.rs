//! GUILD_EMOJIS_UPDATE
//!
//! Discord sends the full emoji list; creates, deletes and changes are
//! derived by comparing it with the cached emojis of the server.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cord_core::events::{CustomEmojiChange, CustomEmojiChangeEvent, CustomEmojiEvent};
use cord_core::payloads::RawEmoji;
use cord_core::{Change, Event, KnownCustomEmoji, ListenerScope, Snowflake};
use serde::Deserialize;
use serde_json::Value;

use super::{parse, HandlerContext, HandlerResult, PacketHandler};

#[derive(Debug, Deserialize)]
struct EmojisUpdatePacket {
    guild_id: Snowflake,
    #[serde(default)]
    emojis: Vec<RawEmoji>,
}

pub struct GuildEmojisUpdateHandler;

impl PacketHandler for GuildEmojisUpdateHandler {
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>> {
        let packet: EmojisUpdatePacket = parse(data)?;
        let server_id = packet.guild_id;
        if ctx.require_server(server_id, "GUILD_EMOJIS_UPDATE").is_none() {
            return Ok(Vec::new());
        }
        let cache = ctx.cache();

        let old: HashMap<Snowflake, Arc<KnownCustomEmoji>> = cache
            .server_emojis(server_id)
            .into_iter()
            .map(|emoji| (emoji.id(), emoji))
            .collect();
        let mut seen = HashSet::new();
        let mut events = Vec::new();

        for raw in &packet.emojis {
            let Some(emoji) = raw.to_known(server_id) else {
                continue;
            };
            let emoji = Arc::new(emoji);
            seen.insert(emoji.id());
            cache.insert_emoji(Arc::clone(&emoji));

            let Some(previous) = old.get(&emoji.id()) else {
                events.push(Event::CustomEmojiCreate(CustomEmojiEvent { emoji }));
                continue;
            };
            let mut changes = Vec::new();
            if let Some(change) = Change::diff_ref(&previous.emoji.name, &emoji.emoji.name) {
                changes.push(CustomEmojiChange::Name(change));
            }
            if !previous.same_whitelist(emoji.whitelisted_role_ids.as_deref()) {
                changes.push(CustomEmojiChange::WhitelistedRoles(Change::new(
                    previous.whitelisted_role_ids.clone(),
                    emoji.whitelisted_role_ids.clone(),
                )));
            }
            events.extend(changes.into_iter().map(|change| {
                Event::CustomEmojiChange(CustomEmojiChangeEvent {
                    emoji: Arc::clone(&emoji),
                    change,
                })
            }));
        }

        for (id, emoji) in old {
            if !seen.contains(&id) {
                cache.remove_emoji(id);
                ctx.retire_listeners([ListenerScope::Emoji(id)]);
                events.push(Event::CustomEmojiDelete(CustomEmojiEvent { emoji }));
            }
        }
        Ok(events)
    }
}
