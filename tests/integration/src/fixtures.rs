//! JSON payloads shaped like Discord's

use serde_json::{json, Value};

pub const BOT_ID: u64 = 100;
pub const OWNER_ID: u64 = 200;
pub const SERVER_ID: u64 = 1;
pub const CHANNEL_ID: u64 = 10;

pub fn bot_user() -> Value {
    json!({"id": BOT_ID.to_string(), "username": "cord-bot", "discriminator": "0", "bot": true})
}

pub fn user(id: u64, name: &str) -> Value {
    json!({"id": id.to_string(), "username": name, "discriminator": "0", "avatar": null})
}

/// READY with the given servers still unavailable
pub fn ready(session_id: &str, resume_url: &str, server_ids: &[u64]) -> Value {
    let guilds: Vec<Value> = server_ids
        .iter()
        .map(|id| json!({"id": id.to_string(), "unavailable": true}))
        .collect();
    json!({
        "v": 10,
        "session_id": session_id,
        "resume_gateway_url": resume_url,
        "user": bot_user(),
        "guilds": guilds,
        "private_channels": []
    })
}

/// Full GUILD_CREATE with one text channel, the bot and the owner
pub fn guild_create(server_id: u64) -> Value {
    json!({
        "id": server_id.to_string(),
        "name": "Test Server",
        "owner_id": OWNER_ID.to_string(),
        "preferred_locale": "en-US",
        "roles": [
            {"id": server_id.to_string(), "name": "@everyone", "permissions": "104324673", "position": 0}
        ],
        "channels": [
            {"id": CHANNEL_ID.to_string(), "type": 0, "name": "general", "position": 0, "permission_overwrites": []}
        ],
        "members": [
            {"user": bot_user(), "roles": [], "joined_at": "2024-01-01T00:00:00+00:00"},
            {"user": user(OWNER_ID, "owner"), "roles": [], "joined_at": "2023-01-01T00:00:00+00:00"}
        ],
        "emojis": [],
        "presences": [],
        "guild_scheduled_events": []
    })
}

/// A message from `author` in the test channel
pub fn message(id: u64, author: Value, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": CHANNEL_ID.to_string(),
        "guild_id": SERVER_ID.to_string(),
        "author": author,
        "content": content,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "edited_timestamp": null,
        "tts": false,
        "mention_everyone": false,
        "mentions": [],
        "mention_roles": [],
        "attachments": [],
        "embeds": [],
        "pinned": false,
        "type": 0
    })
}

/// Body of a Discord JSON error
pub fn discord_error(code: u32, message: &str) -> Value {
    json!({"code": code, "message": message})
}
