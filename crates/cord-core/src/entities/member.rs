//! Member entity - a user's membership in one server

use chrono::{DateTime, Utc};

use super::{User, CDN_BASE};
use crate::value_objects::Snowflake;

/// Server member
///
/// `role_ids` never contains the @everyone role; every member has it implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub server_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
    pub timeout_until: Option<DateTime<Utc>>,
    pub server_avatar_hash: Option<String>,
    pub pending: bool,
    pub muted: bool,
    pub deafened: bool,
    pub self_muted: bool,
    pub self_deafened: bool,
}

impl Member {
    pub fn new(server_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            server_id,
            user_id,
            nickname: None,
            role_ids: Vec::new(),
            joined_at: None,
            premium_since: None,
            timeout_until: None,
            server_avatar_hash: None,
            pending: false,
            muted: false,
            deafened: false,
            self_muted: false,
            self_deafened: false,
        }
    }

    /// Nickname if set, otherwise the user's display name
    pub fn display_name<'a>(&'a self, user: &'a User) -> &'a str {
        self.nickname.as_deref().unwrap_or_else(|| user.display_name())
    }

    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        role_id == self.server_id || self.role_ids.contains(&role_id)
    }

    /// Whether a communication timeout is active at `now`
    #[inline]
    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        self.timeout_until.is_some_and(|until| until > now)
    }

    pub fn server_avatar_url(&self) -> Option<String> {
        self.server_avatar_hash.as_ref().map(|hash| {
            format!(
                "{CDN_BASE}/guilds/{}/users/{}/avatars/{hash}.png",
                self.server_id, self.user_id
            )
        })
    }
}
