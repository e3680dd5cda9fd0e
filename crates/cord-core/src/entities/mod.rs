//! Domain entities - cached Discord resources
//!
//! Entities are plain values. The cache holds them behind `Arc` and
//! replaces a whole snapshot whenever a gateway packet changes it.

/// Base URL of Discord's media CDN
pub const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Numeric enum with an `Unknown` fallback for ids Discord adds later.
macro_rules! id_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            Unknown(u8),
        }

        impl $name {
            pub fn from_id(id: u8) -> Self {
                match id {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            pub fn id(self) -> u8 {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Unknown(other) => other,
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(self.id())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <u8 as serde::Deserialize>::deserialize(deserializer).map(Self::from_id)
            }
        }
    };
}

mod channel;
mod embed;
mod emoji;
mod member;
mod message;
mod presence;
mod reaction;
mod role;
mod scheduled_event;
mod server;
mod user;

pub use channel::{Channel, ChannelType, PrivateChannel, ServerChannel};
pub use embed::{Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedMedia, EmbedProvider};
pub use emoji::{CustomEmoji, Emoji, KnownCustomEmoji};
pub use member::Member;
pub use message::{Attachment, Message, MessageAuthor};
pub use presence::{Activity, ActivityType, ClientStatus, Presence, UserStatus};
pub use reaction::Reaction;
pub use role::Role;
pub use scheduled_event::{
    ScheduledEvent, ScheduledEventEntityType, ScheduledEventPrivacyLevel, ScheduledEventStatus,
};
pub use server::{
    BoostLevel, DefaultMessageNotificationLevel, ExplicitContentFilterLevel,
    MultiFactorAuthenticationLevel, NsfwLevel, Server, VerificationLevel,
};
pub use user::User;
