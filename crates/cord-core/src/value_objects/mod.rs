//! Value objects - immutable types that represent domain concepts

mod intents;
mod permissions;
mod snowflake;

pub use intents::Intents;
pub use permissions::{OverwriteKind, PermissionOverwrite, PermissionState, Permissions};
pub use snowflake::{Snowflake, SnowflakeParseError};
