//! Permission computation over cached roles, members and overwrites

use std::collections::HashSet;

use cord_core::{Channel, PermissionOverwrite, Permissions, Snowflake};

use super::Cache;

impl Cache {
    /// Server-wide permissions of a user.
    ///
    /// The owner and administrators get everything; otherwise the @everyone
    /// role is combined with the member's roles.
    pub fn server_permissions(&self, server_id: Snowflake, user_id: Snowflake) -> Permissions {
        let Some(server) = self.server(server_id) else {
            return Permissions::empty();
        };
        if server.owner_id == user_id {
            return Permissions::all();
        }

        let everyone = self
            .role(server_id)
            .map(|role| role.permissions)
            .unwrap_or_default();
        let roles = self
            .member(server_id, user_id)
            .map(|member| {
                member
                    .role_ids
                    .iter()
                    .filter_map(|id| self.role(*id))
                    .map(|role| role.permissions)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let permissions = Permissions::combine(std::iter::once(everyone).chain(roles));
        if permissions.contains(Permissions::ADMINISTRATOR) {
            Permissions::all()
        } else {
            permissions
        }
    }

    /// Effective permissions of a user in a channel.
    ///
    /// Overwrites apply in order: @everyone, then all of the member's roles
    /// aggregated, then the member itself. Private channels grant everything.
    pub fn channel_permissions(&self, channel_id: Snowflake, user_id: Snowflake) -> Permissions {
        let Some(channel) = self.channel(channel_id) else {
            return Permissions::empty();
        };
        let channel = match channel.as_ref() {
            Channel::Private(_) => return Permissions::all(),
            Channel::Server(channel) => channel,
        };

        let base = self.server_permissions(channel.server_id, user_id);
        if base.contains(Permissions::ADMINISTRATOR) {
            return Permissions::all();
        }

        let mut permissions = channel.role_overwrite(channel.server_id).apply(base);

        if let Some(member) = self.member(channel.server_id, user_id) {
            let roles = member
                .role_ids
                .iter()
                .map(|id| channel.role_overwrite(*id))
                .fold(PermissionOverwrite::EMPTY, |acc, overwrite| {
                    PermissionOverwrite::new(
                        acc.allowed | overwrite.allowed,
                        acc.denied | overwrite.denied,
                    )
                });
            permissions = roles.apply(permissions);
        }

        channel.member_overwrite(user_id).apply(permissions)
    }

    pub fn can_see(&self, channel_id: Snowflake, user_id: Snowflake) -> bool {
        self.channel_permissions(channel_id, user_id)
            .contains(Permissions::VIEW_CHANNEL)
    }

    /// Whether the connected account can see a channel; `false` before READY
    pub fn can_you_see(&self, channel_id: Snowflake) -> bool {
        self.yourself_id()
            .is_some_and(|you| self.can_see(channel_id, you))
    }

    /// Channels of a server the connected account cannot see
    pub fn unreadable_channels_for_yourself(&self, server_id: Snowflake) -> HashSet<Snowflake> {
        self.server_channels(server_id)
            .iter()
            .map(|channel| channel.id())
            .filter(|id| !self.can_you_see(*id))
            .collect()
    }

    /// Drop message caches of channels in `server_id` the connected account lost sight of
    pub fn evict_unreadable_messages(&self, server_id: Snowflake) -> usize {
        let unreadable = self.unreadable_channels_for_yourself(server_id);
        if unreadable.is_empty() {
            return 0;
        }
        self.evict_messages_where(|channel_id| unreadable.contains(&channel_id))
    }
}
