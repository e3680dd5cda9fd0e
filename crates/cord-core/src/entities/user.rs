//! User entity - a Discord account, shared by every server it is a member of

use super::CDN_BASE;
use crate::value_objects::Snowflake;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub name: String,
    /// `"0"` for accounts migrated to unique usernames
    pub discriminator: String,
    pub global_name: Option<String>,
    pub avatar_hash: Option<String>,
    pub bot: bool,
}

impl User {
    /// Create a user with only the required fields set
    pub fn new(id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            discriminator: "0".to_string(),
            global_name: None,
            avatar_hash: None,
            bot: false,
        }
    }

    /// `name#1234`, or just the name for migrated accounts
    pub fn discriminated_name(&self) -> String {
        if self.has_legacy_discriminator() {
            format!("{}#{}", self.name, self.discriminator)
        } else {
            self.name.clone()
        }
    }

    #[inline]
    pub fn mention_tag(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Global display name, falling back to the username
    #[inline]
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.name)
    }

    /// Avatar URL, or the default avatar if none is set
    pub fn avatar_url(&self) -> String {
        match &self.avatar_hash {
            Some(hash) => {
                let extension = if hash.starts_with("a_") { "gif" } else { "png" };
                format!("{CDN_BASE}/avatars/{}/{hash}.{extension}", self.id)
            }
            None => {
                let index = if self.has_legacy_discriminator() {
                    self.discriminator.parse::<u64>().unwrap_or(0) % 5
                } else {
                    (self.id.into_inner() >> 22) % 6
                };
                format!("{CDN_BASE}/embed/avatars/{index}.png")
            }
        }
    }

    fn has_legacy_discriminator(&self) -> bool {
        !self.discriminator.is_empty() && self.discriminator != "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminated_name() {
        let mut user = User::new(Snowflake::new(1), "nexus");
        assert_eq!(user.discriminated_name(), "nexus");

        user.discriminator = "0420".to_string();
        assert_eq!(user.discriminated_name(), "nexus#0420");
    }

    #[test]
    fn test_display_name_prefers_global_name() {
        let mut user = User::new(Snowflake::new(1), "nexus");
        assert_eq!(user.display_name(), "nexus");

        user.global_name = Some("Nexus".to_string());
        assert_eq!(user.display_name(), "Nexus");
    }

    #[test]
    fn test_mention_tag() {
        assert_eq!(User::new(Snowflake::new(42), "a").mention_tag(), "<@42>");
    }

    #[test]
    fn test_avatar_url() {
        let mut user = User::new(Snowflake::new(80_351_110_224_678_912), "nelly");
        user.avatar_hash = Some("8342729096ea3675442027381ff50dfe".to_string());
        assert_eq!(
            user.avatar_url(),
            "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
        );

        user.avatar_hash = Some("a_1269e74af4df7417b13759eae50c83dc".to_string());
        assert!(user.avatar_url().ends_with(".gif"));
    }

    #[test]
    fn test_default_avatar_url() {
        let mut user = User::new(Snowflake::new(80_351_110_224_678_912), "nelly");
        user.discriminator = "1337".to_string();
        assert_eq!(user.avatar_url(), "https://cdn.discordapp.com/embed/avatars/2.png");

        user.discriminator = "0".to_string();
        let index = (80_351_110_224_678_912u64 >> 22) % 6;
        assert_eq!(
            user.avatar_url(),
            format!("https://cdn.discordapp.com/embed/avatars/{index}.png")
        );
    }
}
