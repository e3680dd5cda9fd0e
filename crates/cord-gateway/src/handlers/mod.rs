//! Dispatch packet handlers
//!
//! Each handler parses one dispatch type, updates the cache and returns
//! the events describing what changed. The registry routes by the `t`
//! field of DISPATCH frames and hands the events to the dispatcher.

mod channel;
mod context;
mod emoji;
mod error;
mod member;
mod message;
mod presence;
mod reaction;
mod ready;
mod role;
mod scheduled_event;
mod server;
mod thread;
mod user;

use std::collections::HashMap;

use cord_core::Event;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use context::HandlerContext;
pub use error::{HandlerError, HandlerResult};

/// Handles one dispatch type
pub trait PacketHandler: Send + Sync {
    /// Update the cache from `data` and return the resulting events
    fn handle(&self, ctx: &HandlerContext, data: Value) -> HandlerResult<Vec<Event>>;

    /// Whether the events wait until their server is available
    fn requires_ready(&self) -> bool {
        true
    }
}

/// Dispatch type to handler
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Box<dyn PacketHandler>>,
}

impl HandlerRegistry {
    /// Registry without handlers
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in handler
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register("READY", ready::ReadyHandler);
        registry.register("RESUMED", ready::ResumedHandler);

        registry.register("GUILD_CREATE", server::GuildCreateHandler);
        registry.register("GUILD_UPDATE", server::GuildUpdateHandler);
        registry.register("GUILD_DELETE", server::GuildDeleteHandler);
        registry.register("GUILD_BAN_ADD", server::GuildBanHandler { added: true });
        registry.register("GUILD_BAN_REMOVE", server::GuildBanHandler { added: false });

        registry.register("GUILD_MEMBER_ADD", member::GuildMemberAddHandler);
        registry.register("GUILD_MEMBER_REMOVE", member::GuildMemberRemoveHandler);
        registry.register("GUILD_MEMBER_UPDATE", member::GuildMemberUpdateHandler);
        registry.register("GUILD_MEMBERS_CHUNK", member::GuildMembersChunkHandler);

        registry.register("GUILD_ROLE_CREATE", role::GuildRoleCreateHandler);
        registry.register("GUILD_ROLE_UPDATE", role::GuildRoleUpdateHandler);
        registry.register("GUILD_ROLE_DELETE", role::GuildRoleDeleteHandler);

        registry.register("GUILD_EMOJIS_UPDATE", emoji::GuildEmojisUpdateHandler);

        registry.register("CHANNEL_CREATE", channel::ChannelCreateHandler);
        registry.register("CHANNEL_UPDATE", channel::ChannelUpdateHandler);
        registry.register("CHANNEL_DELETE", channel::ChannelDeleteHandler);
        registry.register("CHANNEL_PINS_UPDATE", channel::ChannelPinsUpdateHandler);
        registry.register("WEBHOOKS_UPDATE", channel::WebhooksUpdateHandler);

        registry.register("THREAD_CREATE", thread::ThreadCreateHandler);
        registry.register("THREAD_UPDATE", thread::ThreadUpdateHandler);
        registry.register("THREAD_DELETE", thread::ThreadDeleteHandler);
        registry.register("THREAD_LIST_SYNC", thread::ThreadListSyncHandler);

        registry.register("PRESENCE_UPDATE", presence::PresenceUpdateHandler);
        registry.register("TYPING_START", presence::TypingStartHandler);
        registry.register("USER_UPDATE", user::UserUpdateHandler);

        registry.register("MESSAGE_CREATE", message::MessageCreateHandler);
        registry.register("MESSAGE_UPDATE", message::MessageUpdateHandler);
        registry.register("MESSAGE_DELETE", message::MessageDeleteHandler);
        registry.register("MESSAGE_DELETE_BULK", message::MessageDeleteBulkHandler);

        registry.register("MESSAGE_REACTION_ADD", reaction::ReactionAddHandler);
        registry.register("MESSAGE_REACTION_REMOVE", reaction::ReactionRemoveHandler);
        registry.register("MESSAGE_REACTION_REMOVE_ALL", reaction::ReactionRemoveAllHandler);
        registry.register("MESSAGE_REACTION_REMOVE_EMOJI", reaction::ReactionRemoveEmojiHandler);

        registry.register(
            "GUILD_SCHEDULED_EVENT_CREATE",
            scheduled_event::ScheduledEventCreateHandler,
        );
        registry.register(
            "GUILD_SCHEDULED_EVENT_UPDATE",
            scheduled_event::ScheduledEventUpdateHandler,
        );
        registry.register(
            "GUILD_SCHEDULED_EVENT_DELETE",
            scheduled_event::ScheduledEventDeleteHandler,
        );
        registry.register(
            "GUILD_SCHEDULED_EVENT_USER_ADD",
            scheduled_event::ScheduledEventUserHandler { added: true },
        );
        registry.register(
            "GUILD_SCHEDULED_EVENT_USER_REMOVE",
            scheduled_event::ScheduledEventUserHandler { added: false },
        );

        registry
    }

    /// Add or replace the handler of a dispatch type
    pub fn register(&mut self, packet_type: &'static str, handler: impl PacketHandler + 'static) {
        self.handlers.insert(packet_type, Box::new(handler));
    }

    pub fn contains(&self, packet_type: &str) -> bool {
        self.handlers.contains_key(packet_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler of `packet_type` and dispatch its events.
    ///
    /// Returns the number of events produced.
    pub fn handle(&self, ctx: &HandlerContext, packet_type: &str, data: Value) -> usize {
        let Some(handler) = self.handlers.get(packet_type) else {
            tracing::debug!(packet = packet_type, "Unknown dispatch type");
            return 0;
        };

        tracing::debug!(packet = packet_type, "Dispatch received");
        tracing::trace!(packet = packet_type, data = %data, "Dispatch payload");

        match handler.handle(ctx, data) {
            Ok(events) => {
                let count = events.len();
                ctx.emit(events, handler.requires_ready());
                ctx.drop_retired_listeners();
                count
            }
            Err(e) => {
                tracing::warn!(
                    packet = packet_type,
                    error = %e,
                    code = e.code(),
                    "Failed to handle packet"
                );
                ctx.drop_retired_listeners();
                0
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Deserialize a dispatch payload
pub(crate) fn parse<T: DeserializeOwned>(data: Value) -> HandlerResult<T> {
    Ok(serde_json::from_value(data)?)
}
