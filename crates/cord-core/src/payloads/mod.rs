//! Raw payloads - serde mirrors of Discord's JSON objects
//!
//! The same structs parse REST responses and gateway packets. Each one
//! converts into its entity; the server id is supplied by the caller when
//! the object itself does not carry it.

mod channel;
mod message;
mod scheduled_event;
mod server;
mod user;

pub use channel::{RawChannel, RawOverwrite};
pub use message::{RawCountDetails, RawMessage, RawMessageReference, RawReaction};
pub use scheduled_event::{RawEntityMetadata, RawScheduledEvent};
pub use server::{RawEmoji, RawRole, RawServer};
pub use user::{RawActivity, RawClientStatus, RawMember, RawPresence, RawUser};

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
