//! Role entity - represents a server role with permissions

use std::cmp::Ordering;

use crate::value_objects::{Permissions, Snowflake};

/// Role entity
///
/// The @everyone role shares its id with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Snowflake,
    pub server_id: Snowflake,
    pub name: String,
    /// RGB color, `0` means no color
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
    pub managed: bool,
    pub permissions: Permissions,
    /// Position as sent by Discord; may contain duplicates
    pub raw_position: i32,
}

impl Role {
    pub fn new(id: Snowflake, server_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            server_id,
            name: name.into(),
            color: 0,
            hoist: false,
            mentionable: false,
            managed: false,
            permissions: Permissions::empty(),
            raw_position: 0,
        }
    }

    #[inline]
    pub fn is_everyone(&self) -> bool {
        self.id == self.server_id
    }

    /// Mention tag; @everyone has no id-based tag
    pub fn mention_tag(&self) -> String {
        if self.is_everyone() {
            "@everyone".to_string()
        } else {
            format!("<@&{}>", self.id)
        }
    }

    /// Color as hex string (without #), `None` when unset
    pub fn color_hex(&self) -> Option<String> {
        (self.color != 0).then(|| format!("{:06x}", self.color))
    }

    /// Hierarchy order: raw position first, ties broken by id
    pub fn cmp_position(&self, other: &Role) -> Ordering {
        self.raw_position
            .cmp(&other.raw_position)
            .then_with(|| other.id.cmp(&self.id))
    }

    #[inline]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        self.cmp_position(other) == Ordering::Greater
    }
}
