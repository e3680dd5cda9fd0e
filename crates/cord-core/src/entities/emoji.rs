//! Emoji entities - unicode emojis, custom emojis, and server-owned custom emojis

use std::fmt;

use super::CDN_BASE;
use crate::value_objects::Snowflake;

/// Custom emoji as referenced by messages and reactions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomEmoji {
    pub id: Snowflake,
    pub name: String,
    pub animated: bool,
}

impl CustomEmoji {
    pub fn image_url(&self) -> String {
        let extension = if self.animated { "gif" } else { "png" };
        format!("{CDN_BASE}/emojis/{}.{extension}", self.id)
    }
}

/// Either a unicode emoji or a custom one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Emoji {
    Unicode(String),
    Custom(CustomEmoji),
}

impl Emoji {
    /// Build from the `{id, name, animated}` object Discord sends.
    ///
    /// An emoji without id is a unicode emoji whose name is the emoji itself.
    pub fn from_parts(id: Option<Snowflake>, name: Option<String>, animated: bool) -> Self {
        match id {
            Some(id) => Self::Custom(CustomEmoji {
                id,
                name: name.unwrap_or_default(),
                animated,
            }),
            None => Self::Unicode(name.unwrap_or_default()),
        }
    }

    #[inline]
    pub fn custom_id(&self) -> Option<Snowflake> {
        match self {
            Self::Custom(custom) => Some(custom.id),
            Self::Unicode(_) => None,
        }
    }

    /// Form used in reaction REST paths: the unicode value or `name:id`
    pub fn reaction_tag(&self) -> String {
        match self {
            Self::Unicode(value) => value.clone(),
            Self::Custom(custom) => format!("{}:{}", custom.name, custom.id),
        }
    }

    /// Form used inside message content
    pub fn mention_tag(&self) -> String {
        match self {
            Self::Unicode(value) => value.clone(),
            Self::Custom(custom) if custom.animated => format!("<a:{}:{}>", custom.name, custom.id),
            Self::Custom(custom) => format!("<:{}:{}>", custom.name, custom.id),
        }
    }

    /// Whether two emojis denote the same reaction
    pub fn same_as(&self, other: &Emoji) -> bool {
        match (self, other) {
            (Self::Unicode(a), Self::Unicode(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.id == b.id,
            _ => false,
        }
    }
}

impl fmt::Display for Emoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mention_tag())
    }
}

impl From<&str> for Emoji {
    fn from(value: &str) -> Self {
        Self::Unicode(value.to_string())
    }
}

/// Custom emoji owned by a cached server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownCustomEmoji {
    pub emoji: CustomEmoji,
    pub server_id: Snowflake,
    /// Roles allowed to use the emoji; `None` means everyone
    pub whitelisted_role_ids: Option<Vec<Snowflake>>,
    pub require_colons: bool,
    pub managed: bool,
    pub available: bool,
}

impl KnownCustomEmoji {
    #[inline]
    pub fn id(&self) -> Snowflake {
        self.emoji.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.emoji.name
    }

    pub fn as_emoji(&self) -> Emoji {
        Emoji::Custom(self.emoji.clone())
    }

    /// Whitelist comparison that ignores order
    pub fn same_whitelist(&self, other: Option<&[Snowflake]>) -> bool {
        let mut mine: Vec<Snowflake> = self.whitelisted_role_ids.clone().unwrap_or_default();
        let mut theirs: Vec<Snowflake> = other.map(<[Snowflake]>::to_vec).unwrap_or_default();
        mine.sort_unstable();
        mine.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(id: u64, name: &str, animated: bool) -> Emoji {
        Emoji::Custom(CustomEmoji {
            id: Snowflake::new(id),
            name: name.to_string(),
            animated,
        })
    }

    #[test]
    fn test_from_parts() {
        let unicode = Emoji::from_parts(None, Some("👍".to_string()), false);
        assert_eq!(unicode, Emoji::Unicode("👍".to_string()));
        assert_eq!(unicode.custom_id(), None);

        let emoji = Emoji::from_parts(Some(Snowflake::new(7)), Some("blob".to_string()), true);
        assert_eq!(emoji, custom(7, "blob", true));
        assert_eq!(emoji.custom_id(), Some(Snowflake::new(7)));
    }

    #[test]
    fn test_tags() {
        assert_eq!(custom(7, "blob", false).reaction_tag(), "blob:7");
        assert_eq!(custom(7, "blob", false).mention_tag(), "<:blob:7>");
        assert_eq!(custom(7, "blob", true).mention_tag(), "<a:blob:7>");
        assert_eq!(Emoji::from("👍").reaction_tag(), "👍");
        assert_eq!(Emoji::from("👍").to_string(), "👍");
    }

    #[test]
    fn test_same_as_compares_custom_by_id() {
        assert!(custom(7, "old", false).same_as(&custom(7, "renamed", false)));
        assert!(!custom(7, "a", false).same_as(&custom(8, "a", false)));
        assert!(!custom(7, "a", false).same_as(&Emoji::from("a")));
    }

    #[test]
    fn test_image_url() {
        let emoji = CustomEmoji {
            id: Snowflake::new(9),
            name: "x".to_string(),
            animated: true,
        };
        assert_eq!(emoji.image_url(), "https://cdn.discordapp.com/emojis/9.gif");
    }

    #[test]
    fn test_same_whitelist_ignores_order() {
        let known = KnownCustomEmoji {
            emoji: CustomEmoji {
                id: Snowflake::new(1),
                name: "x".to_string(),
                animated: false,
            },
            server_id: Snowflake::new(2),
            whitelisted_role_ids: Some(vec![Snowflake::new(3), Snowflake::new(4)]),
            require_colons: true,
            managed: false,
            available: true,
        };
        assert!(known.same_whitelist(Some(&[Snowflake::new(4), Snowflake::new(3)])));
        assert!(!known.same_whitelist(Some(&[Snowflake::new(4)])));
        assert!(!known.same_whitelist(None));
    }
}
