//! Channel entities - server channels of every kind and private (DM) channels

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::value_objects::{PermissionOverwrite, Snowflake};

/// Channel type as sent in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    ServerText,
    Private,
    ServerVoice,
    Group,
    Category,
    ServerNews,
    ServerStore,
    NewsThread,
    PublicThread,
    PrivateThread,
    ServerStageVoice,
    ServerForum,
    Unknown(u8),
}

impl ChannelType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::ServerText,
            1 => Self::Private,
            2 => Self::ServerVoice,
            3 => Self::Group,
            4 => Self::Category,
            5 => Self::ServerNews,
            6 => Self::ServerStore,
            10 => Self::NewsThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::ServerStageVoice,
            15 => Self::ServerForum,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::ServerText => 0,
            Self::Private => 1,
            Self::ServerVoice => 2,
            Self::Group => 3,
            Self::Category => 4,
            Self::ServerNews => 5,
            Self::ServerStore => 6,
            Self::NewsThread => 10,
            Self::PublicThread => 11,
            Self::PrivateThread => 12,
            Self::ServerStageVoice => 13,
            Self::ServerForum => 15,
            Self::Unknown(other) => other,
        }
    }

    /// Text-like server channels (news channels are handled as text)
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self, Self::ServerText | Self::ServerNews)
    }

    #[inline]
    pub fn is_voice(self) -> bool {
        matches!(self, Self::ServerVoice | Self::ServerStageVoice)
    }

    #[inline]
    pub fn is_thread(self) -> bool {
        matches!(self, Self::NewsThread | Self::PublicThread | Self::PrivateThread)
    }

    #[inline]
    pub fn is_server_channel(self) -> bool {
        !matches!(self, Self::Private | Self::Group)
    }
}

impl serde::Serialize for ChannelType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> serde::Deserialize<'de> for ChannelType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u8 as serde::Deserialize>::deserialize(deserializer).map(Self::from_u8)
    }
}

/// Channel inside a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerChannel {
    pub id: Snowflake,
    pub server_id: Snowflake,
    pub kind: ChannelType,
    pub name: String,
    pub raw_position: i32,
    pub parent_id: Option<Snowflake>,
    pub nsfw: bool,
    /// Empty when no topic is set
    pub topic: String,
    pub slowmode_secs: u32,
    pub bitrate: u32,
    pub user_limit: u32,
    pub role_overwrites: HashMap<Snowflake, PermissionOverwrite>,
    pub member_overwrites: HashMap<Snowflake, PermissionOverwrite>,
}

impl ServerChannel {
    pub fn new(id: Snowflake, server_id: Snowflake, kind: ChannelType, name: impl Into<String>) -> Self {
        Self {
            id,
            server_id,
            kind,
            name: name.into(),
            raw_position: 0,
            parent_id: None,
            nsfw: false,
            topic: String::new(),
            slowmode_secs: 0,
            bitrate: 0,
            user_limit: 0,
            role_overwrites: HashMap::new(),
            member_overwrites: HashMap::new(),
        }
    }

    #[inline]
    pub fn mention_tag(&self) -> String {
        format!("<#{}>", self.id)
    }

    /// Overwrite for a role, empty if none is set
    pub fn role_overwrite(&self, role_id: Snowflake) -> PermissionOverwrite {
        self.role_overwrites.get(&role_id).copied().unwrap_or_default()
    }

    /// Overwrite for a member, empty if none is set
    pub fn member_overwrite(&self, user_id: Snowflake) -> PermissionOverwrite {
        self.member_overwrites.get(&user_id).copied().unwrap_or_default()
    }

    /// Ordering inside the server's channel list
    pub fn cmp_position(&self, other: &ServerChannel) -> Ordering {
        self.raw_position
            .cmp(&other.raw_position)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Direct message channel with a single recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateChannel {
    pub id: Snowflake,
    pub recipient_id: Snowflake,
}

/// Any cached channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Private(PrivateChannel),
    Server(ServerChannel),
}

impl Channel {
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Private(channel) => channel.id,
            Self::Server(channel) => channel.id,
        }
    }

    pub fn server_id(&self) -> Option<Snowflake> {
        match self {
            Self::Private(_) => None,
            Self::Server(channel) => Some(channel.server_id),
        }
    }

    pub fn kind(&self) -> ChannelType {
        match self {
            Self::Private(_) => ChannelType::Private,
            Self::Server(channel) => channel.kind,
        }
    }

    pub fn as_server(&self) -> Option<&ServerChannel> {
        match self {
            Self::Server(channel) => Some(channel),
            Self::Private(_) => None,
        }
    }

    pub fn as_private(&self) -> Option<&PrivateChannel> {
        match self {
            Self::Private(channel) => Some(channel),
            Self::Server(_) => None,
        }
    }
}
