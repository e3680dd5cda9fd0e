//! WebSocket close codes

/// Reasons a gateway connection closes
///
/// `CommandedReconnect` and `HeartbeatNotProperlyAnswered` are sent by the
/// client itself; both use 4999 on the wire so Discord keeps the session
/// resumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    Normal,
    UnknownError,
    UnknownOpcode,
    DecodeError,
    NotAuthenticated,
    AuthenticationFailed,
    AlreadyAuthenticated,
    InvalidSequence,
    RateLimited,
    SessionTimeout,
    InvalidShard,
    ShardingRequired,
    InvalidApiVersion,
    InvalidIntents,
    DisallowedIntents,
    CommandedReconnect,
    HeartbeatNotProperlyAnswered,
}

impl CloseCode {
    /// Map a received close code; 4999 always reads as `CommandedReconnect`
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1000 => Some(Self::Normal),
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4007 => Some(Self::InvalidSequence),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimeout),
            4010 => Some(Self::InvalidShard),
            4011 => Some(Self::ShardingRequired),
            4012 => Some(Self::InvalidApiVersion),
            4013 => Some(Self::InvalidIntents),
            4014 => Some(Self::DisallowedIntents),
            4999 => Some(Self::CommandedReconnect),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::UnknownError => 4000,
            Self::UnknownOpcode => 4001,
            Self::DecodeError => 4002,
            Self::NotAuthenticated => 4003,
            Self::AuthenticationFailed => 4004,
            Self::AlreadyAuthenticated => 4005,
            Self::InvalidSequence => 4007,
            Self::RateLimited => 4008,
            Self::SessionTimeout => 4009,
            Self::InvalidShard => 4010,
            Self::ShardingRequired => 4011,
            Self::InvalidApiVersion => 4012,
            Self::InvalidIntents => 4013,
            Self::DisallowedIntents => 4014,
            Self::CommandedReconnect | Self::HeartbeatNotProperlyAnswered => 4999,
        }
    }

    /// Whether reconnecting can help after this close
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        !matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }

    /// Whether the session survives the close and can be resumed
    #[must_use]
    pub const fn keeps_session(self) -> bool {
        !matches!(
            self,
            Self::Normal | Self::InvalidSequence | Self::SessionTimeout
        )
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Normal closure",
            Self::UnknownError => "Unknown error",
            Self::UnknownOpcode => "Invalid opcode or invalid payload for an opcode was sent",
            Self::DecodeError => "An invalid payload was sent",
            Self::NotAuthenticated => "A payload was sent prior to identifying",
            Self::AuthenticationFailed => "The account token sent with the identify payload is incorrect",
            Self::AlreadyAuthenticated => "More than one identify payload was sent",
            Self::InvalidSequence => "The sequence sent when resuming the session was invalid",
            Self::RateLimited => "Payloads were sent too quickly",
            Self::SessionTimeout => "The session timed out",
            Self::InvalidShard => "An invalid shard was sent when identifying",
            Self::ShardingRequired => "The session would have handled too many servers",
            Self::InvalidApiVersion => "An invalid version for the gateway was sent",
            Self::InvalidIntents => "An invalid intent was sent",
            Self::DisallowedIntents => "A disallowed intent was sent",
            Self::CommandedReconnect => "Discord commanded a reconnect",
            Self::HeartbeatNotProperlyAnswered => "Heartbeat was not acknowledged",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::UnknownError => "UnknownError",
            Self::UnknownOpcode => "UnknownOpcode",
            Self::DecodeError => "DecodeError",
            Self::NotAuthenticated => "NotAuthenticated",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::AlreadyAuthenticated => "AlreadyAuthenticated",
            Self::InvalidSequence => "InvalidSequence",
            Self::RateLimited => "RateLimited",
            Self::SessionTimeout => "SessionTimeout",
            Self::InvalidShard => "InvalidShard",
            Self::ShardingRequired => "ShardingRequired",
            Self::InvalidApiVersion => "InvalidApiVersion",
            Self::InvalidIntents => "InvalidIntents",
            Self::DisallowedIntents => "DisallowedIntents",
            Self::CommandedReconnect => "CommandedReconnect",
            Self::HeartbeatNotProperlyAnswered => "HeartbeatNotProperlyAnswered",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
