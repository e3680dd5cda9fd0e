//! Listener scopes - the entity a listener is attached to

use std::fmt;

use crate::value_objects::Snowflake;

/// Where a listener is registered.
///
/// A listener attached to a channel only receives events whose subjects
/// include that channel. Global listeners receive everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    Global,
    Server(Snowflake),
    Channel(Snowflake),
    User(Snowflake),
    Role(Snowflake),
    Message(Snowflake),
    Emoji(Snowflake),
}

impl fmt::Display for ListenerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Server(id) => write!(f, "server:{id}"),
            Self::Channel(id) => write!(f, "channel:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
            Self::Role(id) => write!(f, "role:{id}"),
            Self::Message(id) => write!(f, "message:{id}"),
            Self::Emoji(id) => write!(f, "emoji:{id}"),
        }
    }
}
