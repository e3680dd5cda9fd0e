//! Gateway intents - which event groups the gateway delivers

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Gateway intent bitmask sent with IDENTIFY
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u32 {
        const GUILDS                        = 1 << 0;
        /// Privileged
        const GUILD_MEMBERS                 = 1 << 1;
        const GUILD_MODERATION              = 1 << 2;
        const GUILD_EMOJIS_AND_STICKERS     = 1 << 3;
        const GUILD_INTEGRATIONS            = 1 << 4;
        const GUILD_WEBHOOKS                = 1 << 5;
        const GUILD_INVITES                 = 1 << 6;
        const GUILD_VOICE_STATES            = 1 << 7;
        /// Privileged
        const GUILD_PRESENCES               = 1 << 8;
        const GUILD_MESSAGES                = 1 << 9;
        const GUILD_MESSAGE_REACTIONS       = 1 << 10;
        const GUILD_MESSAGE_TYPING          = 1 << 11;
        const DIRECT_MESSAGES               = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS      = 1 << 13;
        const DIRECT_MESSAGE_TYPING         = 1 << 14;
        /// Privileged
        const MESSAGE_CONTENT               = 1 << 15;
        const GUILD_SCHEDULED_EVENTS        = 1 << 16;
        const AUTO_MODERATION_CONFIGURATION = 1 << 20;
        const AUTO_MODERATION_EXECUTION     = 1 << 21;
    }
}

impl Intents {
    /// Intents that must be enabled in the developer portal
    #[inline]
    pub const fn privileged() -> Self {
        Self::GUILD_MEMBERS
            .union(Self::GUILD_PRESENCES)
            .union(Self::MESSAGE_CONTENT)
    }

    /// Every intent that does not need portal approval
    #[inline]
    pub const fn non_privileged() -> Self {
        Self::all().difference(Self::privileged())
    }

    #[inline]
    pub fn is_privileged(&self) -> bool {
        self.intersects(Self::privileged())
    }
}

impl Default for Intents {
    fn default() -> Self {
        Self::non_privileged()
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u32::deserialize(deserializer).map(Self::from_bits_truncate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmask_values() {
        assert_eq!(Intents::GUILDS.bits(), 1);
        assert_eq!((Intents::GUILDS | Intents::GUILD_MESSAGES).bits(), 513);
        assert_eq!(Intents::AUTO_MODERATION_EXECUTION.bits(), 1 << 21);
    }

    #[test]
    fn test_privileged_split() {
        let privileged = Intents::privileged();
        assert!(privileged.contains(Intents::GUILD_MEMBERS));
        assert!(privileged.contains(Intents::GUILD_PRESENCES));
        assert!(privileged.contains(Intents::MESSAGE_CONTENT));
        assert_eq!(privileged.bits().count_ones(), 3);

        let regular = Intents::non_privileged();
        assert!(!regular.is_privileged());
        assert!(regular.contains(Intents::GUILDS | Intents::GUILD_SCHEDULED_EVENTS));
        assert_eq!(regular | privileged, Intents::all());
    }

    #[test]
    fn test_default_is_non_privileged() {
        assert_eq!(Intents::default(), Intents::non_privileged());
    }

    #[test]
    fn test_serde_as_number() {
        let intents = Intents::GUILDS | Intents::GUILD_MEMBERS;
        assert_eq!(serde_json::to_string(&intents).unwrap(), "3");
        let parsed: Intents = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, intents);
    }
}
