//! # cord-core
//!
//! Domain layer containing Discord entities, value objects, raw JSON payloads,
//! and the typed events produced by the gateway.
//! This crate has no dependency on HTTP, WebSocket or async runtimes.

pub mod entities;
pub mod error;
pub mod events;
pub mod payloads;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Channel, ChannelType, CustomEmoji, Embed, Emoji, KnownCustomEmoji, Member, Message,
    PrivateChannel, Reaction, Role, ScheduledEvent, Server, ServerChannel, User,
};
pub use error::{DomainError, DomainResult};
pub use events::{Change, Event, ListenerScope};
pub use value_objects::{
    Intents, OverwriteKind, PermissionOverwrite, PermissionState, Permissions, Snowflake,
    SnowflakeParseError,
};
