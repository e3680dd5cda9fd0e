//! REST endpoints
//!
//! Each endpoint is a path template with `{}` placeholders. Parameters
//! beyond the placeholders are appended as extra path segments, so
//! `Role` with `[server, role]` addresses a single role while `Role`
//! with `[server]` addresses the role list.

use std::fmt;
use std::time::Duration;

/// Every endpoint the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestEndpoint {
    Gateway,
    GatewayBot,
    CurrentUser,
    User,
    UserChannel,
    Channel,
    ChannelTyping,
    Message,
    MessagesBulkDelete,
    Pins,
    Reaction,
    Server,
    ServerChannel,
    ServerMember,
    ServerMemberRole,
    OwnNickname,
    ServerMembersSearch,
    Role,
    Ban,
    CustomEmoji,
    ScheduledEvents,
    ScheduledEvent,
    ScheduledEventUsers,
    AuditLog,
    ServerPrune,
    ServerInvite,
    Invite,
    Webhook,
    ChannelWebhook,
    ServerWebhook,
}

impl RestEndpoint {
    /// Path template relative to `{base}/v{version}`
    pub fn template(self) -> &'static str {
        match self {
            Self::Gateway => "/gateway",
            Self::GatewayBot => "/gateway/bot",
            Self::CurrentUser => "/users/@me",
            Self::User => "/users/{}",
            Self::UserChannel => "/users/@me/channels",
            Self::Channel => "/channels/{}",
            Self::ChannelTyping => "/channels/{}/typing",
            Self::Message => "/channels/{}/messages",
            Self::MessagesBulkDelete => "/channels/{}/messages/bulk-delete",
            Self::Pins => "/channels/{}/pins",
            Self::Reaction => "/channels/{}/messages/{}/reactions",
            Self::Server => "/guilds",
            Self::ServerChannel => "/guilds/{}/channels",
            Self::ServerMember => "/guilds/{}/members/{}",
            Self::ServerMemberRole => "/guilds/{}/members/{}/roles/{}",
            Self::OwnNickname => "/guilds/{}/members/@me/nick",
            Self::ServerMembersSearch => "/guilds/{}/members/search",
            Self::Role => "/guilds/{}/roles",
            Self::Ban => "/guilds/{}/bans",
            Self::CustomEmoji => "/guilds/{}/emojis",
            Self::ScheduledEvents => "/guilds/{}/scheduled-events",
            Self::ScheduledEvent => "/guilds/{}/scheduled-events/{}",
            Self::ScheduledEventUsers => "/guilds/{}/scheduled-events/{}/users",
            Self::AuditLog => "/guilds/{}/audit-logs",
            Self::ServerPrune => "/guilds/{}/prune",
            Self::ServerInvite => "/guilds/{}/invites",
            Self::Invite => "/invites/{}",
            Self::Webhook => "/webhooks/{}",
            Self::ChannelWebhook => "/channels/{}/webhooks",
            Self::ServerWebhook => "/guilds/{}/webhooks",
        }
    }

    /// Index of the parameter that splits rate-limit buckets
    pub fn major_param_position(self) -> Option<usize> {
        match self {
            Self::Gateway
            | Self::GatewayBot
            | Self::CurrentUser
            | Self::User
            | Self::UserChannel
            | Self::Server
            | Self::Invite => None,
            _ => Some(0),
        }
    }

    /// Limit Discord does not announce in headers
    pub fn hardcoded_ratelimit(self) -> Option<Duration> {
        match self {
            Self::Reaction => Some(Duration::from_millis(250)),
            _ => None,
        }
    }

    /// Full URL for the given parameters.
    ///
    /// Parameters are percent-encoded, which matters for unicode reaction emojis.
    pub fn url<S: AsRef<str>>(self, base: &str, version: u8, params: &[S]) -> String {
        let mut url = format!("{}/v{version}", base.trim_end_matches('/'));
        let mut params = params.iter().map(|param| encode_segment(param.as_ref()));

        let mut pieces = self.template().split("{}").peekable();
        while let Some(piece) = pieces.next() {
            url.push_str(piece);
            if pieces.peek().is_some() {
                if let Some(param) = params.next() {
                    url.push_str(&param);
                }
            }
        }
        for extra in params {
            url.push('/');
            url.push_str(&extra);
        }
        url
    }

    /// The major parameter, if the endpoint has one and it was supplied
    pub fn major_param<S: AsRef<str>>(self, params: &[S]) -> Option<String> {
        self.major_param_position()
            .and_then(|position| params.get(position))
            .map(|param| param.as_ref().to_string())
    }
}

/// Percent-encode a path segment, keeping `:` and `@` which are valid there
fn encode_segment(param: &str) -> String {
    urlencoding::encode(param)
        .replace("%3A", ":")
        .replace("%40", "@")
}

impl fmt::Display for RestEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://discord.com/api";

    #[test]
    fn test_substitutes_placeholders() {
        assert_eq!(
            RestEndpoint::ServerMemberRole.url(BASE, 10, &["1", "2", "3"]),
            "https://discord.com/api/v10/guilds/1/members/2/roles/3"
        );
        assert_eq!(
            RestEndpoint::GatewayBot.url::<&str>(BASE, 10, &[]),
            "https://discord.com/api/v10/gateway/bot"
        );
    }

    #[test]
    fn test_appends_extra_params() {
        assert_eq!(
            RestEndpoint::Role.url(BASE, 10, &["1"]),
            "https://discord.com/api/v10/guilds/1/roles"
        );
        assert_eq!(
            RestEndpoint::Role.url(BASE, 10, &["1", "2"]),
            "https://discord.com/api/v10/guilds/1/roles/2"
        );
        assert_eq!(
            RestEndpoint::Reaction.url(BASE, 9, &["1", "2", "name:5", "@me"]),
            "https://discord.com/api/v9/channels/1/messages/2/reactions/name:5/@me"
        );
    }

    #[test]
    fn test_encodes_unicode_params() {
        let url = RestEndpoint::Reaction.url(BASE, 10, &["1", "2", "👍"]);
        assert!(url.ends_with("/reactions/%F0%9F%91%8D"));
    }

    #[test]
    fn test_major_param() {
        assert_eq!(
            RestEndpoint::Message.major_param(&["10", "20"]),
            Some("10".to_string())
        );
        assert_eq!(RestEndpoint::User.major_param(&["10"]), None);
        assert_eq!(RestEndpoint::Channel.major_param::<&str>(&[]), None);
    }

    #[test]
    fn test_reaction_is_hardcoded() {
        assert_eq!(
            RestEndpoint::Reaction.hardcoded_ratelimit(),
            Some(Duration::from_millis(250))
        );
        assert!(RestEndpoint::Message.hardcoded_ratelimit().is_none());
    }
}
