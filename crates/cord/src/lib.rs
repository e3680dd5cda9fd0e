//! # cord
//!
//! A Discord bot client. Log in with [`DiscordApiBuilder`], then read the
//! cache, react to events through listeners and call the REST API through
//! the returned [`DiscordApi`].
//!
//! ## Example
//!
//! ```ignore
//! use cord::{listener_fn, DiscordApiBuilder, Event, ListenerScope};
//!
//! let api = DiscordApiBuilder::new()
//!     .token(token)
//!     .all_non_privileged_intents()
//!     .login()
//!     .await?;
//!
//! api.add_listener(ListenerScope::Global, listener_fn(|event| async move {
//!     if let Event::MessageCreate(e) = &event {
//!         tracing::info!(content = %e.message.content, "Message");
//!     }
//! }));
//! ```

pub mod api;
pub mod builder;
pub mod error;
mod maintenance;

pub use api::DiscordApi;
pub use builder::DiscordApiBuilder;
pub use error::{Error, Result};

pub use cord_cache::{Cache, SharedCache};
pub use cord_common::ClientConfig;
pub use cord_core::{Event, Intents, ListenerScope, Snowflake};
pub use cord_gateway::{listener_fn, EventListener, ListenerId};
pub use cord_rest::builders;
