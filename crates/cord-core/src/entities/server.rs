//! Server entity - a Discord guild and its settings

use super::CDN_BASE;
use crate::value_objects::Snowflake;

id_enum! {
    pub enum VerificationLevel {
        None = 0,
        Low = 1,
        Medium = 2,
        High = 3,
        VeryHigh = 4,
    }
}

id_enum! {
    pub enum DefaultMessageNotificationLevel {
        AllMessages = 0,
        OnlyMentions = 1,
    }
}

id_enum! {
    pub enum ExplicitContentFilterLevel {
        Disabled = 0,
        MembersWithoutRoles = 1,
        AllMembers = 2,
    }
}

id_enum! {
    pub enum MultiFactorAuthenticationLevel {
        None = 0,
        Elevated = 1,
    }
}

id_enum! {
    /// Server boost tier
    pub enum BoostLevel {
        None = 0,
        Tier1 = 1,
        Tier2 = 2,
        Tier3 = 3,
    }
}

id_enum! {
    pub enum NsfwLevel {
        Default = 0,
        Explicit = 1,
        Safe = 2,
        AgeRestricted = 3,
    }
}

/// Server entity
///
/// Roles, channels, members, emojis and scheduled events are cached
/// separately and looked up by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: Snowflake,
    pub name: String,
    pub icon_hash: Option<String>,
    pub splash_hash: Option<String>,
    pub discovery_splash_hash: Option<String>,
    pub owner_id: Snowflake,
    pub application_id: Option<Snowflake>,
    /// Deprecated by Discord, kept while servers still report it
    pub region: Option<String>,
    pub verification_level: VerificationLevel,
    pub default_message_notification_level: DefaultMessageNotificationLevel,
    pub explicit_content_filter_level: ExplicitContentFilterLevel,
    pub mfa_level: MultiFactorAuthenticationLevel,
    pub boost_level: BoostLevel,
    pub nsfw_level: NsfwLevel,
    pub preferred_locale: String,
    pub boost_count: u32,
    pub description: Option<String>,
    pub system_channel_id: Option<Snowflake>,
    pub afk_channel_id: Option<Snowflake>,
    pub afk_timeout_secs: u32,
    pub rules_channel_id: Option<Snowflake>,
    pub moderators_only_channel_id: Option<Snowflake>,
    pub member_count: u32,
    pub large: bool,
}

impl Server {
    pub fn new(id: Snowflake, name: impl Into<String>, owner_id: Snowflake) -> Self {
        Self {
            id,
            name: name.into(),
            icon_hash: None,
            splash_hash: None,
            discovery_splash_hash: None,
            owner_id,
            application_id: None,
            region: None,
            verification_level: VerificationLevel::None,
            default_message_notification_level: DefaultMessageNotificationLevel::AllMessages,
            explicit_content_filter_level: ExplicitContentFilterLevel::Disabled,
            mfa_level: MultiFactorAuthenticationLevel::None,
            boost_level: BoostLevel::None,
            nsfw_level: NsfwLevel::Default,
            preferred_locale: "en-US".to_string(),
            boost_count: 0,
            description: None,
            system_channel_id: None,
            afk_channel_id: None,
            afk_timeout_secs: 300,
            rules_channel_id: None,
            moderators_only_channel_id: None,
            member_count: 0,
            large: false,
        }
    }

    /// Id of the @everyone role
    #[inline]
    pub fn everyone_role_id(&self) -> Snowflake {
        self.id
    }

    pub fn icon_url(&self) -> Option<String> {
        self.icon_hash.as_ref().map(|hash| {
            let extension = if hash.starts_with("a_") { "gif" } else { "png" };
            format!("{CDN_BASE}/icons/{}/{hash}.{extension}", self.id)
        })
    }

    pub fn splash_url(&self) -> Option<String> {
        self.splash_hash
            .as_ref()
            .map(|hash| format!("{CDN_BASE}/splashes/{}/{hash}.png", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ids() {
        assert_eq!(VerificationLevel::from_id(3), VerificationLevel::High);
        assert_eq!(VerificationLevel::High.id(), 3);
        assert_eq!(VerificationLevel::from_id(42), VerificationLevel::Unknown(42));
        assert_eq!(VerificationLevel::Unknown(42).id(), 42);
        assert_eq!(NsfwLevel::from_id(3), NsfwLevel::AgeRestricted);
        assert_eq!(BoostLevel::from_id(2), BoostLevel::Tier2);
    }

    #[test]
    fn test_level_serde_as_number() {
        let json = serde_json::to_string(&ExplicitContentFilterLevel::AllMembers).unwrap();
        assert_eq!(json, "2");
        let parsed: DefaultMessageNotificationLevel = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, DefaultMessageNotificationLevel::OnlyMentions);
    }

    #[test]
    fn test_icon_url() {
        let mut server = Server::new(Snowflake::new(1), "Test", Snowflake::new(2));
        assert_eq!(server.icon_url(), None);

        server.icon_hash = Some("abc".to_string());
        assert_eq!(
            server.icon_url().as_deref(),
            Some("https://cdn.discordapp.com/icons/1/abc.png")
        );

        server.icon_hash = Some("a_abc".to_string());
        assert!(server.icon_url().unwrap().ends_with(".gif"));
    }

    #[test]
    fn test_everyone_role_id() {
        let server = Server::new(Snowflake::new(7), "Test", Snowflake::new(2));
        assert_eq!(server.everyone_role_id(), Snowflake::new(7));
    }
}
