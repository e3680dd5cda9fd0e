//! Typed events - produced by gateway handlers after the cache was updated
//!
//! Events carry the cache snapshots involved. For change events the old and
//! new value of the changed field travel in a [`Change`]; the snapshot is
//! the one swapped into the cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Change, ListenerScope};
use crate::entities::{
    Activity, BoostLevel, Channel, ClientStatus, DefaultMessageNotificationLevel, Embed, Emoji,
    ExplicitContentFilterLevel, KnownCustomEmoji, Member, Message, MultiFactorAuthenticationLevel,
    NsfwLevel, Role, ScheduledEvent, ScheduledEventStatus, Server, User, UserStatus,
    VerificationLevel,
};
use crate::value_objects::{OverwriteKind, PermissionOverwrite, Permissions, Snowflake};

/// All events a listener can receive
#[derive(Debug, Clone)]
pub enum Event {
    // =========================================================================
    // Connection Events
    // =========================================================================
    Ready(ReadyEvent),
    Resumed,
    LostConnection,
    Reconnect,

    // =========================================================================
    // Server Events
    // =========================================================================
    ServerBecomesAvailable(ServerEvent),
    ServerBecomesUnavailable(ServerEvent),
    ServerJoin(ServerEvent),
    ServerLeave(ServerEvent),
    ServerChange(ServerChangeEvent),

    // =========================================================================
    // Member Events
    // =========================================================================
    ServerMemberJoin(ServerMemberJoinEvent),
    ServerMemberLeave(ServerMemberLeaveEvent),
    ServerMemberBan(ServerUserEvent),
    ServerMemberUnban(ServerUserEvent),
    MemberChange(MemberChangeEvent),
    UserRoleAdd(UserRoleEvent),
    UserRoleRemove(UserRoleEvent),

    // =========================================================================
    // User Events
    // =========================================================================
    UserChange(UserChangeEvent),
    UserChangeStatus(UserChangeStatusEvent),
    UserChangeActivity(UserChangeActivityEvent),
    UserStartTyping(UserStartTypingEvent),

    // =========================================================================
    // Role Events
    // =========================================================================
    RoleCreate(RoleEvent),
    RoleDelete(RoleEvent),
    RoleChange(RoleChangeEvent),

    // =========================================================================
    // Custom Emoji Events
    // =========================================================================
    CustomEmojiCreate(CustomEmojiEvent),
    CustomEmojiDelete(CustomEmojiEvent),
    CustomEmojiChange(CustomEmojiChangeEvent),

    // =========================================================================
    // Channel Events
    // =========================================================================
    ChannelCreate(ChannelEvent),
    ChannelDelete(ChannelEvent),
    ServerChannelChange(ServerChannelChangeEvent),
    ChannelPinsUpdate(ChannelPinsUpdateEvent),
    WebhooksUpdate(WebhooksUpdateEvent),

    // =========================================================================
    // Message Events
    // =========================================================================
    MessageCreate(MessageCreateEvent),
    MessageEdit(MessageEditEvent),
    MessageDelete(MessageDeleteEvent),
    MessageBulkDelete(MessageBulkDeleteEvent),

    // =========================================================================
    // Reaction Events
    // =========================================================================
    ReactionAdd(ReactionEvent),
    ReactionRemove(ReactionEvent),
    ReactionRemoveAll(ReactionRemoveAllEvent),
    ReactionRemoveEmoji(ReactionRemoveEmojiEvent),

    // =========================================================================
    // Scheduled Event Events
    // =========================================================================
    ScheduledEventCreate(ScheduledEventEvent),
    ScheduledEventDelete(ScheduledEventEvent),
    ScheduledEventChange(ScheduledEventChangeEvent),
    ScheduledEventUserAdd(ScheduledEventUserEvent),
    ScheduledEventUserRemove(ScheduledEventUserEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Ready(_) => "READY",
            Self::Resumed => "RESUMED",
            Self::LostConnection => "LOST_CONNECTION",
            Self::Reconnect => "RECONNECT",
            Self::ServerBecomesAvailable(_) => "SERVER_BECOMES_AVAILABLE",
            Self::ServerBecomesUnavailable(_) => "SERVER_BECOMES_UNAVAILABLE",
            Self::ServerJoin(_) => "SERVER_JOIN",
            Self::ServerLeave(_) => "SERVER_LEAVE",
            Self::ServerChange(_) => "SERVER_CHANGE",
            Self::ServerMemberJoin(_) => "SERVER_MEMBER_JOIN",
            Self::ServerMemberLeave(_) => "SERVER_MEMBER_LEAVE",
            Self::ServerMemberBan(_) => "SERVER_MEMBER_BAN",
            Self::ServerMemberUnban(_) => "SERVER_MEMBER_UNBAN",
            Self::MemberChange(_) => "MEMBER_CHANGE",
            Self::UserRoleAdd(_) => "USER_ROLE_ADD",
            Self::UserRoleRemove(_) => "USER_ROLE_REMOVE",
            Self::UserChange(_) => "USER_CHANGE",
            Self::UserChangeStatus(_) => "USER_CHANGE_STATUS",
            Self::UserChangeActivity(_) => "USER_CHANGE_ACTIVITY",
            Self::UserStartTyping(_) => "USER_START_TYPING",
            Self::RoleCreate(_) => "ROLE_CREATE",
            Self::RoleDelete(_) => "ROLE_DELETE",
            Self::RoleChange(_) => "ROLE_CHANGE",
            Self::CustomEmojiCreate(_) => "CUSTOM_EMOJI_CREATE",
            Self::CustomEmojiDelete(_) => "CUSTOM_EMOJI_DELETE",
            Self::CustomEmojiChange(_) => "CUSTOM_EMOJI_CHANGE",
            Self::ChannelCreate(_) => "CHANNEL_CREATE",
            Self::ChannelDelete(_) => "CHANNEL_DELETE",
            Self::ServerChannelChange(_) => "SERVER_CHANNEL_CHANGE",
            Self::ChannelPinsUpdate(_) => "CHANNEL_PINS_UPDATE",
            Self::WebhooksUpdate(_) => "WEBHOOKS_UPDATE",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::MessageEdit(_) => "MESSAGE_EDIT",
            Self::MessageDelete(_) => "MESSAGE_DELETE",
            Self::MessageBulkDelete(_) => "MESSAGE_BULK_DELETE",
            Self::ReactionAdd(_) => "REACTION_ADD",
            Self::ReactionRemove(_) => "REACTION_REMOVE",
            Self::ReactionRemoveAll(_) => "REACTION_REMOVE_ALL",
            Self::ReactionRemoveEmoji(_) => "REACTION_REMOVE_EMOJI",
            Self::ScheduledEventCreate(_) => "SCHEDULED_EVENT_CREATE",
            Self::ScheduledEventDelete(_) => "SCHEDULED_EVENT_DELETE",
            Self::ScheduledEventChange(_) => "SCHEDULED_EVENT_CHANGE",
            Self::ScheduledEventUserAdd(_) => "SCHEDULED_EVENT_USER_ADD",
            Self::ScheduledEventUserRemove(_) => "SCHEDULED_EVENT_USER_REMOVE",
        }
    }

    /// Server whose dispatch queue runs this event; `None` means the global queue
    pub fn server_id(&self) -> Option<Snowflake> {
        match self {
            Self::Ready(_)
            | Self::Resumed
            | Self::LostConnection
            | Self::Reconnect
            | Self::UserChange(_) => None,
            Self::ServerBecomesAvailable(e)
            | Self::ServerBecomesUnavailable(e)
            | Self::ServerJoin(e)
            | Self::ServerLeave(e) => Some(e.server.id),
            Self::ServerChange(e) => Some(e.server.id),
            Self::ServerMemberJoin(e) => Some(e.server_id),
            Self::ServerMemberLeave(e) => Some(e.server_id),
            Self::ServerMemberBan(e) | Self::ServerMemberUnban(e) => Some(e.server_id),
            Self::MemberChange(e) => Some(e.server_id),
            Self::UserRoleAdd(e) | Self::UserRoleRemove(e) => Some(e.role.server_id),
            Self::UserChangeStatus(e) => e.server_id,
            Self::UserChangeActivity(e) => e.server_id,
            Self::UserStartTyping(e) => e.server_id,
            Self::RoleCreate(e) | Self::RoleDelete(e) => Some(e.role.server_id),
            Self::RoleChange(e) => Some(e.role.server_id),
            Self::CustomEmojiCreate(e) | Self::CustomEmojiDelete(e) => Some(e.emoji.server_id),
            Self::CustomEmojiChange(e) => Some(e.emoji.server_id),
            Self::ChannelCreate(e) | Self::ChannelDelete(e) => e.channel.server_id(),
            Self::ServerChannelChange(e) => e.channel.server_id(),
            Self::ChannelPinsUpdate(e) => e.server_id,
            Self::WebhooksUpdate(e) => Some(e.server_id),
            Self::MessageCreate(e) => e.message.server_id,
            Self::MessageEdit(e) => e.server_id,
            Self::MessageDelete(e) => e.server_id,
            Self::MessageBulkDelete(e) => e.server_id,
            Self::ReactionAdd(e) | Self::ReactionRemove(e) => e.server_id,
            Self::ReactionRemoveAll(e) => e.server_id,
            Self::ReactionRemoveEmoji(e) => e.server_id,
            Self::ScheduledEventCreate(e) | Self::ScheduledEventDelete(e) => {
                Some(e.event.server_id)
            }
            Self::ScheduledEventChange(e) => Some(e.event.server_id),
            Self::ScheduledEventUserAdd(e) | Self::ScheduledEventUserRemove(e) => {
                Some(e.server_id)
            }
        }
    }

    /// Scopes, besides the global one, whose listeners receive this event
    pub fn subjects(&self) -> Vec<ListenerScope> {
        use ListenerScope as S;

        let server = self.server_id().map(S::Server);
        let mut subjects: Vec<ListenerScope> = server.into_iter().collect();
        match self {
            Self::Ready(_)
            | Self::Resumed
            | Self::LostConnection
            | Self::Reconnect
            | Self::ServerBecomesAvailable(_)
            | Self::ServerBecomesUnavailable(_)
            | Self::ServerJoin(_)
            | Self::ServerLeave(_)
            | Self::ServerChange(_)
            | Self::WebhooksUpdate(_) => {}
            Self::ServerMemberJoin(e) => subjects.push(S::User(e.user.id)),
            Self::ServerMemberLeave(e) => subjects.push(S::User(e.user.id)),
            Self::ServerMemberBan(e) | Self::ServerMemberUnban(e) => {
                subjects.push(S::User(e.user.id));
            }
            Self::MemberChange(e) => subjects.push(S::User(e.user.id)),
            Self::UserRoleAdd(e) | Self::UserRoleRemove(e) => {
                subjects.extend([S::Role(e.role.id), S::User(e.user_id)]);
            }
            Self::UserChange(e) => subjects.push(S::User(e.user.id)),
            Self::UserChangeStatus(e) => subjects.push(S::User(e.user_id)),
            Self::UserChangeActivity(e) => subjects.push(S::User(e.user_id)),
            Self::UserStartTyping(e) => {
                subjects.extend([S::Channel(e.channel_id), S::User(e.user_id)]);
            }
            Self::RoleCreate(e) | Self::RoleDelete(e) => subjects.push(S::Role(e.role.id)),
            Self::RoleChange(e) => subjects.push(S::Role(e.role.id)),
            Self::CustomEmojiCreate(e) | Self::CustomEmojiDelete(e) => {
                subjects.push(S::Emoji(e.emoji.id()));
            }
            Self::CustomEmojiChange(e) => subjects.push(S::Emoji(e.emoji.id())),
            Self::ChannelCreate(e) | Self::ChannelDelete(e) => {
                subjects.push(S::Channel(e.channel.id()));
                if let Some(private) = e.channel.as_private() {
                    subjects.push(S::User(private.recipient_id));
                }
            }
            Self::ServerChannelChange(e) => {
                subjects.push(S::Channel(e.channel.id()));
                if let ServerChannelChange::OverwrittenPermissions {
                    kind, target_id, ..
                } = &e.change
                {
                    subjects.push(match kind {
                        OverwriteKind::Role => S::Role(*target_id),
                        OverwriteKind::Member => S::User(*target_id),
                    });
                }
            }
            Self::ChannelPinsUpdate(e) => subjects.push(S::Channel(e.channel_id)),
            Self::MessageCreate(e) => subjects.extend([
                S::Channel(e.message.channel_id),
                S::Message(e.message.id),
                S::User(e.message.author.id),
            ]),
            Self::MessageEdit(e) => {
                subjects.extend([S::Channel(e.channel_id), S::Message(e.message_id)]);
            }
            Self::MessageDelete(e) => {
                subjects.extend([S::Channel(e.channel_id), S::Message(e.message_id)]);
            }
            Self::MessageBulkDelete(e) => {
                subjects.push(S::Channel(e.channel_id));
                subjects.extend(e.message_ids.iter().copied().map(S::Message));
            }
            Self::ReactionAdd(e) | Self::ReactionRemove(e) => {
                subjects.extend([
                    S::Channel(e.channel_id),
                    S::Message(e.message_id),
                    S::User(e.user_id),
                ]);
                subjects.extend(e.emoji.custom_id().map(S::Emoji));
            }
            Self::ReactionRemoveAll(e) => {
                subjects.extend([S::Channel(e.channel_id), S::Message(e.message_id)]);
            }
            Self::ReactionRemoveEmoji(e) => {
                subjects.extend([S::Channel(e.channel_id), S::Message(e.message_id)]);
                subjects.extend(e.emoji.custom_id().map(S::Emoji));
            }
            Self::ScheduledEventCreate(_)
            | Self::ScheduledEventDelete(_)
            | Self::ScheduledEventChange(_) => {}
            Self::ScheduledEventUserAdd(e) | Self::ScheduledEventUserRemove(e) => {
                subjects.push(S::User(e.user_id));
            }
        }
        subjects
    }
}

// ============================================================================
// Connection
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReadyEvent {
    pub session_id: String,
    pub user: Arc<User>,
}

// ============================================================================
// Servers
// ============================================================================

#[derive(Debug, Clone)]
pub struct ServerEvent {
    pub server: Arc<Server>,
}

#[derive(Debug, Clone)]
pub struct ServerChangeEvent {
    /// Snapshot after the update
    pub server: Arc<Server>,
    pub change: ServerChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerChange {
    Name(Change<String>),
    Icon(Change<Option<String>>),
    Splash(Change<Option<String>>),
    DiscoverySplash(Change<Option<String>>),
    VerificationLevel(Change<VerificationLevel>),
    Region(Change<Option<String>>),
    DefaultMessageNotificationLevel(Change<DefaultMessageNotificationLevel>),
    Owner(Change<Snowflake>),
    SystemChannel(Change<Option<Snowflake>>),
    AfkChannel(Change<Option<Snowflake>>),
    AfkTimeout(Change<u32>),
    ExplicitContentFilterLevel(Change<ExplicitContentFilterLevel>),
    MultiFactorAuthenticationLevel(Change<MultiFactorAuthenticationLevel>),
    RulesChannel(Change<Option<Snowflake>>),
    ModeratorsOnlyChannel(Change<Option<Snowflake>>),
    BoostLevel(Change<BoostLevel>),
    NsfwLevel(Change<NsfwLevel>),
    PreferredLocale(Change<String>),
    BoostCount(Change<u32>),
    Description(Change<Option<String>>),
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone)]
pub struct ServerMemberJoinEvent {
    pub server_id: Snowflake,
    pub user: Arc<User>,
    pub member: Arc<Member>,
}

#[derive(Debug, Clone)]
pub struct ServerMemberLeaveEvent {
    pub server_id: Snowflake,
    pub user: Arc<User>,
    /// Last cached membership, if any
    pub member: Option<Arc<Member>>,
}

/// Ban or unban
#[derive(Debug, Clone)]
pub struct ServerUserEvent {
    pub server_id: Snowflake,
    pub user: Arc<User>,
}

#[derive(Debug, Clone)]
pub struct MemberChangeEvent {
    pub server_id: Snowflake,
    pub user: Arc<User>,
    pub member: Arc<Member>,
    pub change: MemberChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberChange {
    Nickname(Change<Option<String>>),
    Timeout(Change<Option<DateTime<Utc>>>),
    ServerAvatar(Change<Option<String>>),
    Pending(Change<bool>),
}

#[derive(Debug, Clone)]
pub struct UserRoleEvent {
    pub user_id: Snowflake,
    pub role: Arc<Role>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone)]
pub struct UserChangeEvent {
    pub user: Arc<User>,
    pub change: UserChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChange {
    Name(Change<String>),
    Discriminator(Change<String>),
    Avatar(Change<Option<String>>),
    GlobalName(Change<Option<String>>),
}

#[derive(Debug, Clone)]
pub struct UserChangeStatusEvent {
    pub user_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub status: Change<UserStatus>,
    pub client_status: Change<ClientStatus>,
}

#[derive(Debug, Clone)]
pub struct UserChangeActivityEvent {
    pub user_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub activities: Change<Vec<Activity>>,
}

#[derive(Debug, Clone)]
pub struct UserStartTypingEvent {
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub member: Option<Arc<Member>>,
}

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Clone)]
pub struct RoleEvent {
    pub role: Arc<Role>,
}

#[derive(Debug, Clone)]
pub struct RoleChangeEvent {
    pub role: Arc<Role>,
    pub change: RoleChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChange {
    Color(Change<u32>),
    Hoist(Change<bool>),
    Mentionable(Change<bool>),
    Name(Change<String>),
    Permissions(Change<Permissions>),
    /// Raw position from Discord and the index in the sorted role list
    Position {
        raw_position: Change<i32>,
        position: Change<usize>,
    },
}

// ============================================================================
// Custom Emojis
// ============================================================================

#[derive(Debug, Clone)]
pub struct CustomEmojiEvent {
    pub emoji: Arc<KnownCustomEmoji>,
}

#[derive(Debug, Clone)]
pub struct CustomEmojiChangeEvent {
    pub emoji: Arc<KnownCustomEmoji>,
    pub change: CustomEmojiChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomEmojiChange {
    Name(Change<String>),
    /// `None` means every member may use the emoji
    WhitelistedRoles(Change<Option<Vec<Snowflake>>>),
}

// ============================================================================
// Channels
// ============================================================================

#[derive(Debug, Clone)]
pub struct ChannelEvent {
    pub channel: Arc<Channel>,
}

#[derive(Debug, Clone)]
pub struct ServerChannelChangeEvent {
    pub channel: Arc<Channel>,
    pub change: ServerChannelChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerChannelChange {
    Name(Change<String>),
    Position {
        raw_position: Change<i32>,
        parent_id: Change<Option<Snowflake>>,
    },
    OverwrittenPermissions {
        kind: OverwriteKind,
        target_id: Snowflake,
        overwrite: Change<PermissionOverwrite>,
    },
    Nsfw(Change<bool>),
    Topic(Change<String>),
    Slowmode(Change<u32>),
    Bitrate(Change<u32>),
    UserLimit(Change<u32>),
}

#[derive(Debug, Clone)]
pub struct ChannelPinsUpdateEvent {
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub last_pin_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct WebhooksUpdateEvent {
    pub server_id: Snowflake,
    pub channel_id: Snowflake,
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
pub struct MessageCreateEvent {
    pub message: Arc<Message>,
}

#[derive(Debug, Clone)]
pub struct MessageEditEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    /// Old side is `None` when the message was not cached
    pub content: Change<Option<String>>,
    pub embeds: Change<Option<Vec<Embed>>>,
    /// Cached message after the edit
    pub message: Option<Arc<Message>>,
}

#[derive(Debug, Clone)]
pub struct MessageDeleteEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub message: Option<Arc<Message>>,
}

#[derive(Debug, Clone)]
pub struct MessageBulkDeleteEvent {
    pub message_ids: Vec<Snowflake>,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    /// The deleted messages that were cached
    pub messages: Vec<Arc<Message>>,
}

// ============================================================================
// Reactions
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub user_id: Snowflake,
    pub emoji: Emoji,
    pub member: Option<Arc<Member>>,
    /// Super reaction
    pub burst: bool,
    pub burst_colors: Vec<String>,
    pub message: Option<Arc<Message>>,
}

#[derive(Debug, Clone)]
pub struct ReactionRemoveAllEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub message: Option<Arc<Message>>,
}

#[derive(Debug, Clone)]
pub struct ReactionRemoveEmojiEvent {
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub server_id: Option<Snowflake>,
    pub emoji: Emoji,
    pub message: Option<Arc<Message>>,
}

// ============================================================================
// Scheduled Events
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScheduledEventEvent {
    pub event: Arc<ScheduledEvent>,
}

#[derive(Debug, Clone)]
pub struct ScheduledEventChangeEvent {
    pub event: Arc<ScheduledEvent>,
    pub change: ScheduledEventChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledEventChange {
    Name(Change<String>),
    Description(Change<Option<String>>),
    StartTime(Change<DateTime<Utc>>),
    EndTime(Change<Option<DateTime<Utc>>>),
    Status(Change<ScheduledEventStatus>),
    Location(Change<Option<String>>),
}

#[derive(Debug, Clone)]
pub struct ScheduledEventUserEvent {
    pub event_id: Snowflake,
    pub server_id: Snowflake,
    pub user_id: Snowflake,
}
