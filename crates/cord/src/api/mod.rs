//! The connected client
//!
//! Reads come from the cache the gateway keeps in sync. Writes go through
//! REST and come back as entities parsed from Discord's response; the cache
//! itself only changes once the matching gateway event arrives.

mod channels;
mod emojis;
mod members;
mod messages;
mod roles;
mod scheduled_events;
mod users;

use std::sync::Arc;
use std::time::Duration;

use cord_cache::SharedCache;
use cord_core::entities::{Activity, UserStatus};
use cord_core::{
    Channel, KnownCustomEmoji, ListenerScope, Member, Message, Role, ScheduledEvent, Server, Snowflake, User,
};
use cord_gateway::{EventDispatcher, EventListener, GatewayHandle, ListenerId};
use cord_rest::RestClient;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::maintenance;

pub use members::MAX_BAN_DELETE_MESSAGE_SECONDS;
pub use messages::{bulk_delete_plan, BulkDeletePlan, BULK_DELETE_LIMIT};

struct Inner {
    cache: SharedCache,
    rest: RestClient,
    dispatcher: Arc<EventDispatcher>,
    gateway: GatewayHandle,
    maintenance: JoinHandle<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.maintenance.abort();
    }
}

/// Handle to a logged in account. Clones share the same connection.
#[derive(Clone)]
pub struct DiscordApi {
    inner: Arc<Inner>,
}

impl DiscordApi {
    pub(crate) fn new(
        cache: SharedCache,
        rest: RestClient,
        dispatcher: Arc<EventDispatcher>,
        gateway: GatewayHandle,
    ) -> Self {
        let maintenance = maintenance::spawn(
            Arc::clone(&cache),
            Arc::clone(&dispatcher),
            Arc::clone(gateway.client()),
        );
        Self {
            inner: Arc::new(Inner {
                cache,
                rest,
                dispatcher,
                gateway,
                maintenance,
            }),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.inner.cache
    }

    pub fn rest(&self) -> &RestClient {
        &self.inner.rest
    }

    /// Id of the current gateway session, if one was established
    pub fn session_id(&self) -> Option<String> {
        self.inner.gateway.session_id()
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// The connected account
    pub fn yourself(&self) -> Option<Arc<User>> {
        self.inner.cache.yourself()
    }

    pub fn server(&self, id: Snowflake) -> Option<Arc<Server>> {
        self.inner.cache.server(id)
    }

    pub fn servers(&self) -> Vec<Arc<Server>> {
        self.inner.cache.servers()
    }

    pub fn channel(&self, id: Snowflake) -> Option<Arc<Channel>> {
        self.inner.cache.channel(id)
    }

    pub fn role(&self, id: Snowflake) -> Option<Arc<Role>> {
        self.inner.cache.role(id)
    }

    pub fn user(&self, id: Snowflake) -> Option<Arc<User>> {
        self.inner.cache.user(id)
    }

    pub fn member(&self, server_id: Snowflake, user_id: Snowflake) -> Option<Arc<Member>> {
        self.inner.cache.member(server_id, user_id)
    }

    pub fn custom_emoji(&self, id: Snowflake) -> Option<Arc<KnownCustomEmoji>> {
        self.inner.cache.emoji(id)
    }

    pub fn scheduled_event(&self, id: Snowflake) -> Option<Arc<ScheduledEvent>> {
        self.inner.cache.scheduled_event(id)
    }

    pub fn cached_message(&self, id: Snowflake) -> Option<Arc<Message>> {
        self.inner.cache.cached_message(id)
    }

    /// Roles of a server, lowest position first
    pub fn server_roles(&self, server_id: Snowflake) -> Vec<Arc<Role>> {
        self.inner.cache.server_roles(server_id)
    }

    pub fn server_channels(&self, server_id: Snowflake) -> Vec<Arc<Channel>> {
        self.inner.cache.server_channels(server_id)
    }

    pub fn server_members(&self, server_id: Snowflake) -> Vec<Arc<Member>> {
        self.inner.cache.server_members(server_id)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn add_listener(&self, scope: ListenerScope, listener: Arc<dyn EventListener>) -> ListenerId {
        self.inner.dispatcher.listeners().add(scope, listener)
    }

    /// Returns false if the listener was already removed
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.dispatcher.listeners().remove(id)
    }

    // =========================================================================
    // Gateway
    // =========================================================================

    pub fn update_presence(&self, status: UserStatus, activity: Option<Activity>) -> Result<()> {
        self.inner.gateway.update_presence(status, activity)?;
        Ok(())
    }

    /// Ask the gateway for the full member lists of these servers
    pub fn request_members(&self, server_ids: &[Snowflake], presences: bool) -> Result<()> {
        self.inner.gateway.request_guild_members(server_ids, presences)?;
        Ok(())
    }

    pub fn latency(&self) -> Option<Duration> {
        self.inner.gateway.latency()
    }

    /// Close the connection; the client does not reconnect afterwards
    pub fn disconnect(&self) {
        tracing::info!("Disconnecting");
        self.inner.gateway.disconnect();
    }

    /// Resolves once the gateway task has stopped
    pub async fn join(&self) -> Result<()> {
        self.inner.gateway.join().await?;
        Ok(())
    }
}

impl std::fmt::Debug for DiscordApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordApi")
            .field("yourself", &self.inner.cache.yourself_id())
            .field("servers", &self.inner.cache.server_count())
            .finish_non_exhaustive()
    }
}
