//! Permissions bitflags and channel permission overwrites
//!
//! Bit values follow Discord's documented permission table. Permission
//! sets travel as decimal strings in JSON.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Discord permission flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE    = 1 << 0;
        const KICK_MEMBERS             = 1 << 1;
        const BAN_MEMBERS              = 1 << 2;
        /// Bypasses every permission check and all channel overwrites
        const ADMINISTRATOR            = 1 << 3;
        const MANAGE_CHANNELS          = 1 << 4;
        const MANAGE_GUILD             = 1 << 5;
        const ADD_REACTIONS            = 1 << 6;
        const VIEW_AUDIT_LOG           = 1 << 7;
        const PRIORITY_SPEAKER         = 1 << 8;
        const STREAM                   = 1 << 9;
        const VIEW_CHANNEL             = 1 << 10;
        const SEND_MESSAGES            = 1 << 11;
        const SEND_TTS_MESSAGES        = 1 << 12;
        const MANAGE_MESSAGES          = 1 << 13;
        const EMBED_LINKS              = 1 << 14;
        const ATTACH_FILES             = 1 << 15;
        const READ_MESSAGE_HISTORY     = 1 << 16;
        const MENTION_EVERYONE         = 1 << 17;
        const USE_EXTERNAL_EMOJIS      = 1 << 18;
        const VIEW_GUILD_INSIGHTS      = 1 << 19;
        const CONNECT                  = 1 << 20;
        const SPEAK                    = 1 << 21;
        const MUTE_MEMBERS             = 1 << 22;
        const DEAFEN_MEMBERS           = 1 << 23;
        const MOVE_MEMBERS             = 1 << 24;
        const USE_VAD                  = 1 << 25;
        const CHANGE_NICKNAME          = 1 << 26;
        const MANAGE_NICKNAMES         = 1 << 27;
        const MANAGE_ROLES             = 1 << 28;
        const MANAGE_WEBHOOKS          = 1 << 29;
        const MANAGE_EMOJIS            = 1 << 30;
        const USE_APPLICATION_COMMANDS = 1 << 31;
        const REQUEST_TO_SPEAK         = 1 << 32;
        const MANAGE_EVENTS            = 1 << 33;
        const MANAGE_THREADS           = 1 << 34;
        const CREATE_PUBLIC_THREADS    = 1 << 35;
        const CREATE_PRIVATE_THREADS   = 1 << 36;
        const USE_EXTERNAL_STICKERS    = 1 << 37;
        const SEND_MESSAGES_IN_THREADS = 1 << 38;
        const USE_EMBEDDED_ACTIVITIES  = 1 << 39;
        const MODERATE_MEMBERS         = 1 << 40;
    }
}

impl Permissions {
    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Check if the permission set has any of the given permissions
    #[inline]
    pub fn has_any(&self, permissions: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.intersects(permissions)
    }

    /// Check if the permission set has all of the given permissions
    #[inline]
    pub fn has_all(&self, permissions: Permissions) -> bool {
        self.has(permissions)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_truncate)
    }

    /// Names of all individual permissions that are set
    pub fn list(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_truncate(bits)
    }
}

impl From<Permissions> for u64 {
    fn from(perms: Permissions) -> Self {
        perms.bits()
    }
}

/// State of a single permission inside an overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionState {
    Allowed,
    Denied,
    Unset,
}

/// Target of a channel permission overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OverwriteKind {
    Role = 0,
    Member = 1,
}

impl OverwriteKind {
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Role),
            1 => Some(Self::Member),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Explicitly allowed and denied permissions of a channel overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    #[serde(rename = "allow")]
    pub allowed: Permissions,
    #[serde(rename = "deny")]
    pub denied: Permissions,
}

impl PermissionOverwrite {
    /// Overwrite that neither allows nor denies anything
    pub const EMPTY: Self = Self {
        allowed: Permissions::empty(),
        denied: Permissions::empty(),
    };

    pub fn new(allowed: Permissions, denied: Permissions) -> Self {
        Self { allowed, denied }
    }

    pub fn state(&self, permission: Permissions) -> PermissionState {
        if self.allowed.contains(permission) {
            PermissionState::Allowed
        } else if self.denied.contains(permission) {
            PermissionState::Denied
        } else {
            PermissionState::Unset
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.denied.is_empty()
    }

    /// Apply this overwrite on top of a base permission set
    #[inline]
    pub fn apply(&self, base: Permissions) -> Permissions {
        (base & !self.denied) | self.allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discord_bit_values() {
        assert_eq!(Permissions::ADMINISTRATOR.bits(), 0x8);
        assert_eq!(Permissions::VIEW_CHANNEL.bits(), 0x400);
        assert_eq!(Permissions::SEND_MESSAGES.bits(), 0x800);
        assert_eq!(Permissions::MANAGE_ROLES.bits(), 0x1000_0000);
        assert_eq!(Permissions::MODERATE_MEMBERS.bits(), 1 << 40);
    }

    #[test]
    fn test_administrator_bypass() {
        let admin = Permissions::ADMINISTRATOR;
        assert!(admin.has(Permissions::VIEW_CHANNEL));
        assert!(admin.has(Permissions::MANAGE_GUILD));
        assert!(admin.has_any(Permissions::BAN_MEMBERS));
        assert!(admin.has_all(Permissions::MANAGE_ROLES | Permissions::KICK_MEMBERS));
    }

    #[test]
    fn test_has_permission() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert!(perms.has(Permissions::VIEW_CHANNEL));
        assert!(!perms.has(Permissions::MANAGE_GUILD));
        assert!(!perms.has_all(Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD));
        assert!(perms.has_any(Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_combine_permissions() {
        let combined = Permissions::combine([
            Permissions::VIEW_CHANNEL,
            Permissions::SEND_MESSAGES,
            Permissions::MANAGE_GUILD,
        ]);
        assert!(combined.contains(Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_serialize_json() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert_eq!(serde_json::to_string(&perms).unwrap(), "\"3072\"");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        let from_str: Permissions = serde_json::from_str("\"3072\"").unwrap();
        let from_num: Permissions = serde_json::from_str("3072").unwrap();
        assert_eq!(from_str, from_num);
        assert!(from_str.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_unknown_bits_are_truncated() {
        let perms: Permissions = serde_json::from_str(&format!("\"{}\"", 1u64 << 60)).unwrap();
        assert!(perms.is_empty());
    }

    #[test]
    fn test_list_permissions() {
        let list = (Permissions::VIEW_CHANNEL | Permissions::ADMINISTRATOR).list();
        assert_eq!(list, vec!["ADMINISTRATOR", "VIEW_CHANNEL"]);
    }

    #[test]
    fn test_parse_and_display() {
        let perms = Permissions::parse("1024").unwrap();
        assert_eq!(perms, Permissions::VIEW_CHANNEL);
        assert_eq!(perms.to_string(), "1024");
        assert!(Permissions::parse("abc").is_err());
    }

    #[test]
    fn test_overwrite_state() {
        let overwrite = PermissionOverwrite::new(Permissions::SEND_MESSAGES, Permissions::VIEW_CHANNEL);
        assert_eq!(overwrite.state(Permissions::SEND_MESSAGES), PermissionState::Allowed);
        assert_eq!(overwrite.state(Permissions::VIEW_CHANNEL), PermissionState::Denied);
        assert_eq!(overwrite.state(Permissions::KICK_MEMBERS), PermissionState::Unset);
        assert!(!overwrite.is_empty());
        assert!(PermissionOverwrite::EMPTY.is_empty());
    }

    #[test]
    fn test_overwrite_apply() {
        let base = Permissions::VIEW_CHANNEL | Permissions::ADD_REACTIONS;
        let overwrite = PermissionOverwrite::new(Permissions::SEND_MESSAGES, Permissions::ADD_REACTIONS);
        assert_eq!(
            overwrite.apply(base),
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES
        );
    }

    #[test]
    fn test_overwrite_json_shape() {
        let overwrite: PermissionOverwrite =
            serde_json::from_str(r#"{"allow":"1024","deny":"2048"}"#).unwrap();
        assert_eq!(overwrite.allowed, Permissions::VIEW_CHANNEL);
        assert_eq!(overwrite.denied, Permissions::SEND_MESSAGES);
    }

    #[test]
    fn test_overwrite_kind() {
        assert_eq!(OverwriteKind::from_u8(0), Some(OverwriteKind::Role));
        assert_eq!(OverwriteKind::from_u8(1), Some(OverwriteKind::Member));
        assert_eq!(OverwriteKind::from_u8(2), None);
        assert_eq!(OverwriteKind::Member.as_u8(), 1);
    }
}
