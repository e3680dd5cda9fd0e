//! Gateway client
//!
//! One task per connection reads frames and runs the packet handlers.
//! A writer task owns the socket sink and a heartbeat task keeps the
//! connection alive. When a connection ends the client reconnects with
//! exponential backoff and resumes the session when Discord allows it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cord_core::entities::{Activity, UserStatus};
use cord_core::{Event, Snowflake};
use cord_rest::{RestClient, RestEndpoint, RestRequest};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use parking_lot::Mutex;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::heartbeat::{self, HeartbeatState};
use super::{GatewayConfig, Outgoing, SessionState};
use crate::error::{GatewayError, GatewayResult};
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::protocol::{
    CloseCode, GatewayMessage, HelloPayload, IdentifyPayload, OpCode, PresenceUpdatePayload,
    ReadyPayload, RequestGuildMembersPayload,
};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;
type SocketStream = SplitStream<Socket>;

/// How often the reader checks for a stalled startup
const STARTUP_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Time the writer gets to flush its close frame
const WRITER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// What the reader does after a frame
enum Flow {
    Continue,
    Reconnect,
}

#[derive(Debug, Deserialize)]
struct GatewayBotResponse {
    url: String,
}

/// Connection to Discord's gateway for one shard
pub struct GatewayClient {
    config: GatewayConfig,
    rest: RestClient,
    context: Arc<HandlerContext>,
    registry: HandlerRegistry,
    session: Arc<SessionState>,
    heartbeat: Arc<HeartbeatState>,
    identify_limiter: DirectLimiter,
    presence: Mutex<Option<PresenceUpdatePayload>>,
    gateway_url: Mutex<Option<String>>,
    outgoing: Mutex<Option<mpsc::UnboundedSender<Outgoing>>>,
    attempts: AtomicU32,
    stop: watch::Sender<bool>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig, rest: RestClient, context: Arc<HandlerContext>) -> Self {
        Self::with_registry(config, rest, context, HandlerRegistry::with_defaults())
    }

    pub fn with_registry(
        config: GatewayConfig,
        rest: RestClient,
        context: Arc<HandlerContext>,
        registry: HandlerRegistry,
    ) -> Self {
        let identify_quota = Quota::with_period(config.identify_interval)
            .unwrap_or_else(|| Quota::per_second(std::num::NonZeroU32::MIN));
        let (stop, _) = watch::channel(false);
        Self {
            presence: Mutex::new(config.presence.clone()),
            config,
            rest,
            context,
            registry,
            session: Arc::new(SessionState::new()),
            heartbeat: Arc::new(HeartbeatState::default()),
            identify_limiter: RateLimiter::direct(identify_quota),
            gateway_url: Mutex::new(None),
            outgoing: Mutex::new(None),
            attempts: AtomicU32::new(0),
            stop,
        }
    }

    /// Spawn the reconnect loop
    pub fn start(self: Arc<Self>) -> GatewayHandle {
        let task = tokio::spawn(Arc::clone(&self).run());
        GatewayHandle {
            client: self,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    pub fn context(&self) -> &Arc<HandlerContext> {
        &self.context
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn latency(&self) -> Option<Duration> {
        self.heartbeat.latency()
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.outgoing.lock().is_some()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Queue a frame on the current connection
    pub fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        let outgoing = self.outgoing.lock();
        let sender = outgoing.as_ref().ok_or(GatewayError::NotConnected)?;
        sender
            .send(Outgoing::Frame(message))
            .map_err(|_| GatewayError::NotConnected)
    }

    /// Change the bot's status; also used for future identifies
    pub fn update_presence(&self, status: UserStatus, activity: Option<Activity>) -> GatewayResult<()> {
        let presence = PresenceUpdatePayload::new(status, activity);
        *self.presence.lock() = Some(presence.clone());
        self.send(GatewayMessage::presence_update(&presence))
    }

    /// Ask for the full member lists; answered with GUILD_MEMBERS_CHUNK
    pub fn request_guild_members(&self, server_ids: &[Snowflake], presences: bool) -> GatewayResult<()> {
        for request in RequestGuildMembersPayload::batched(server_ids, presences) {
            self.send(GatewayMessage::request_guild_members(&request))?;
        }
        Ok(())
    }

    /// Close with a normal close code and stop reconnecting
    pub fn disconnect(&self) {
        tracing::info!(shard = self.config.shard, "Disconnecting from gateway");
        self.stop.send_replace(true);
        if let Some(outgoing) = self.outgoing.lock().as_ref() {
            let _ = outgoing.send(Outgoing::Close(CloseCode::Normal));
        }
    }

    // =========================================================================
    // Reconnect loop
    // =========================================================================

    /// Connect, and reconnect until stopped or a close code forbids it
    pub async fn run(self: Arc<Self>) -> GatewayResult<()> {
        let mut stop = self.stop.subscribe();
        loop {
            if self.is_stopped() {
                return Ok(());
            }

            let result = self.run_session().await;
            self.outgoing.lock().take();
            if self.is_stopped() {
                return Ok(());
            }

            self.context.dispatcher().dispatch(Event::LostConnection);
            match result {
                Err(e) if !e.is_recoverable() => {
                    tracing::error!(error = %e, code = e.code(), "Gateway connection failed for good");
                    return Err(e);
                }
                Err(e) => tracing::warn!(error = %e, code = e.code(), "Gateway connection lost"),
                Ok(()) => tracing::info!("Gateway connection closed"),
            }

            let attempt = self.attempts.fetch_add(1, Ordering::AcqRel);
            let delay = self.config.reconnect_delay(attempt);
            tracing::warn!(
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting to gateway"
            );
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = stop.changed() => return Ok(()),
            }
        }
    }

    async fn run_session(&self) -> GatewayResult<()> {
        let mut stop = self.stop.subscribe();
        let url = self.session_url().await?;
        tracing::info!(url = %url, shard = self.config.shard, "Connecting to gateway");

        let (socket, _) = connect_async(url.as_str()).await?;
        let (sink, mut stream) = socket.split();
        let interval = read_hello(&mut stream).await?;
        tracing::debug!(interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX), "Received HELLO");

        let (tx, rx) = mpsc::unbounded_channel();
        let limiter = RateLimiter::direct(Quota::per_minute(heartbeat::frame_budget(interval)));
        let mut writer = tokio::spawn(write_loop(sink, rx, limiter, Arc::clone(&self.session)));
        self.heartbeat.reset();
        let beats = tokio::spawn(heartbeat::run(interval, Arc::clone(&self.heartbeat), tx.clone()));
        *self.outgoing.lock() = Some(tx.clone());

        let result = match self.authenticate(&tx).await {
            Ok(()) => self.read_loop(&mut stream, &tx, &mut writer, &mut stop).await,
            Err(e) => Err(e),
        };

        // 4999 keeps the session resumable
        let _ = tx.send(Outgoing::Close(CloseCode::CommandedReconnect));
        beats.abort();
        drop(tx);
        if !writer.is_finished() && tokio::time::timeout(WRITER_SHUTDOWN_TIMEOUT, &mut writer).await.is_err() {
            writer.abort();
        }
        result
    }

    async fn read_loop(
        &self,
        stream: &mut SocketStream,
        outgoing: &mpsc::UnboundedSender<Outgoing>,
        writer: &mut JoinHandle<()>,
        stop: &mut watch::Receiver<bool>,
    ) -> GatewayResult<()> {
        let mut startup_check = tokio::time::interval(STARTUP_CHECK_INTERVAL);
        if *stop.borrow_and_update() {
            return Err(GatewayError::Stopped);
        }

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    None => return Ok(()),
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(Message::Text(text))) => {
                        if let Flow::Reconnect = self.handle_frame(&text, outgoing).await? {
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Close(frame))) => return Err(self.close_error(frame)),
                    Some(Ok(_)) => {}
                },
                _ = &mut *writer => return Ok(()),
                _ = startup_check.tick() => self.check_startup(),
                _ = stop.changed() => {
                    let _ = outgoing.send(Outgoing::Close(CloseCode::Normal));
                    return Err(GatewayError::Stopped);
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str, outgoing: &mpsc::UnboundedSender<Outgoing>) -> GatewayResult<Flow> {
        let message = match GatewayMessage::from_json(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable gateway frame");
                return Ok(Flow::Continue);
            }
        };

        match message.op {
            OpCode::Dispatch => {
                if let Some(sequence) = message.s {
                    self.session.set_sequence(sequence);
                }
                if let Some(packet_type) = message.t {
                    self.on_dispatch(&packet_type, message.d);
                }
            }
            OpCode::Heartbeat => {
                let _ = outgoing.send(Outgoing::Heartbeat);
            }
            OpCode::HeartbeatAck => {
                if let Some(latency) = self.heartbeat.ack() {
                    tracing::trace!(latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX), "Heartbeat acknowledged");
                }
            }
            OpCode::Reconnect => {
                tracing::info!("Gateway requested a reconnect");
                let _ = outgoing.send(Outgoing::Close(CloseCode::CommandedReconnect));
                return Ok(Flow::Reconnect);
            }
            OpCode::InvalidSession => {
                let resumable = message.d.as_bool().unwrap_or(false);
                if !resumable {
                    self.session.clear();
                }
                let delay = Duration::from_millis(rand::thread_rng().gen_range(1000..=5000));
                tracing::warn!(resumable, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "Session invalidated");
                tokio::time::sleep(delay).await;
                self.authenticate(outgoing).await?;
            }
            other => tracing::debug!(op = other.name(), "Unexpected opcode"),
        }
        Ok(Flow::Continue)
    }

    fn on_dispatch(&self, packet_type: &str, data: Value) {
        match packet_type {
            "READY" => match serde_json::from_value::<ReadyPayload>(data.clone()) {
                Ok(ready) => {
                    self.session.store_ready(ready);
                    self.attempts.store(0, Ordering::Release);
                }
                Err(e) => tracing::warn!(error = %e, "READY without session"),
            },
            "RESUMED" => {
                self.attempts.store(0, Ordering::Release);
                tracing::info!(session_id = ?self.session.session_id(), "Session resumed");
            }
            _ => {}
        }
        self.registry.handle(&self.context, packet_type, data);
    }

    /// Resume when there is a session, identify otherwise
    async fn authenticate(&self, outgoing: &mpsc::UnboundedSender<Outgoing>) -> GatewayResult<()> {
        let frame = match self.session.resume_payload(&self.config.token) {
            Some(resume) => {
                tracing::info!(session_id = %resume.session_id, seq = resume.seq, "Resuming session");
                GatewayMessage::resume(&resume)
            }
            None => {
                self.identify_limiter.until_ready().await;
                tracing::info!(
                    shard = self.config.shard,
                    total_shards = self.config.total_shards,
                    "Identifying"
                );
                GatewayMessage::identify(&self.identify_payload())
            }
        };
        outgoing
            .send(Outgoing::Frame(frame))
            .map_err(|_| GatewayError::NotConnected)
    }

    fn identify_payload(&self) -> IdentifyPayload {
        let identify = IdentifyPayload::new(
            self.config.token.clone(),
            self.config.intents,
            self.config.shard,
            self.config.total_shards,
        );
        match self.presence.lock().clone() {
            Some(presence) => identify.with_presence(presence),
            None => identify,
        }
    }

    /// Give up on servers that never arrived after READY
    fn check_startup(&self) {
        let Some(stalled) = self.context.stalled_for() else {
            return;
        };
        if stalled >= self.config.startup_timeout {
            let events = self.context.finish_startup();
            self.context.emit(events, false);
        }
    }

    fn close_error(&self, frame: Option<CloseFrame>) -> GatewayError {
        let Some(frame) = frame else {
            return GatewayError::ClosedUnknown {
                code: 1005,
                reason: String::new(),
            };
        };
        let code = u16::from(frame.code);
        match CloseCode::from_u16(code) {
            Some(close) => {
                if !close.keeps_session() {
                    self.session.clear();
                }
                tracing::warn!(code, reason = %frame.reason, description = close.description(), "Gateway closed the connection");
                GatewayError::Closed(close)
            }
            None => GatewayError::ClosedUnknown {
                code,
                reason: frame.reason.to_string(),
            },
        }
    }

    // =========================================================================
    // Gateway url
    // =========================================================================

    async fn session_url(&self) -> GatewayResult<String> {
        let base = match self.session.resume_url() {
            Some(url) if self.session.is_resumable() => url,
            _ => self.gateway_url().await?,
        };
        Ok(self.config.connect_url(&base))
    }

    /// Configured url, else GATEWAY_BOT (fetched once)
    async fn gateway_url(&self) -> GatewayResult<String> {
        if let Some(url) = &self.config.gateway_url {
            return Ok(url.clone());
        }
        if let Some(url) = self.gateway_url.lock().clone() {
            return Ok(url);
        }

        let response = RestRequest::get(RestEndpoint::GatewayBot)
            .execute(&self.rest)
            .await?;
        let bot: GatewayBotResponse = response.json()?;
        *self.gateway_url.lock() = Some(bot.url.clone());
        Ok(bot.url)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("shard", &self.config.shard)
            .field("session", &self.session)
            .field("connected", &self.is_connected())
            .field("attempts", &self.attempts.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Wait for HELLO, the first frame of every connection
async fn read_hello(stream: &mut SocketStream) -> GatewayResult<Duration> {
    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => {
                let message = GatewayMessage::from_json(&text)?;
                if message.op != OpCode::Hello {
                    return Err(GatewayError::MissingHello(message.op.as_u8()));
                }
                let hello: HelloPayload = serde_json::from_value(message.d)?;
                return Ok(Duration::from_millis(hello.heartbeat_interval));
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(GatewayError::NotConnected)
}

/// Own the sink; frames pass the rate limiter, heartbeats skip it
async fn write_loop(
    mut sink: SocketSink,
    mut rx: mpsc::UnboundedReceiver<Outgoing>,
    limiter: DirectLimiter,
    session: Arc<SessionState>,
) {
    while let Some(outgoing) = rx.recv().await {
        let encoded = match outgoing {
            Outgoing::Frame(frame) => {
                limiter.until_ready().await;
                frame.to_json()
            }
            Outgoing::Heartbeat => GatewayMessage::heartbeat(session.sequence()).to_json(),
            Outgoing::Close(code) => {
                tracing::debug!(code = code.as_u16(), reason = code.name(), "Closing gateway connection");
                let frame = CloseFrame {
                    code: code.as_u16().into(),
                    reason: code.description().into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
        };

        match encoded {
            Ok(json) => {
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    tracing::warn!(error = %e, "Failed to write to gateway");
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode gateway frame"),
        }
    }
    let _ = sink.close().await;
}

/// Control handle for a running [`GatewayClient`]
#[derive(Clone)]
pub struct GatewayHandle {
    client: Arc<GatewayClient>,
    task: Arc<Mutex<Option<JoinHandle<GatewayResult<()>>>>>,
}

impl GatewayHandle {
    pub fn client(&self) -> &Arc<GatewayClient> {
        &self.client
    }

    pub fn update_presence(&self, status: UserStatus, activity: Option<Activity>) -> GatewayResult<()> {
        self.client.update_presence(status, activity)
    }

    pub fn request_guild_members(&self, server_ids: &[Snowflake], presences: bool) -> GatewayResult<()> {
        self.client.request_guild_members(server_ids, presences)
    }

    /// Round trip of the last acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        self.client.latency()
    }

    pub fn session_id(&self) -> Option<String> {
        self.client.session().session_id()
    }

    pub fn disconnect(&self) {
        self.client.disconnect();
    }

    /// Resolve after the first completed startup.
    ///
    /// Fails with the loop's error if it gives up before that.
    pub async fn wait_until_ready(&self) -> GatewayResult<()> {
        let mut ready = self.client.context().subscribe_ready();
        let Some(mut task) = self.task.lock().take() else {
            return Err(GatewayError::Stopped);
        };

        loop {
            if *ready.borrow_and_update() > 0 {
                break;
            }
            tokio::select! {
                changed = ready.changed() => {
                    if changed.is_err() {
                        return Err(GatewayError::Stopped);
                    }
                }
                result = &mut task => return Err(join_error(result)),
            }
        }

        *self.task.lock() = Some(task);
        Ok(())
    }

    /// Wait for the reconnect loop to end
    pub async fn join(&self) -> GatewayResult<()> {
        let task = self.task.lock().take();
        match task {
            Some(task) => match task.await {
                Ok(result) => result,
                Err(e) => Err(join_error(Err(e))),
            },
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for GatewayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayHandle")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

fn join_error(result: Result<GatewayResult<()>, tokio::task::JoinError>) -> GatewayError {
    match result {
        Ok(Ok(())) => GatewayError::Stopped,
        Ok(Err(e)) => e,
        Err(e) => {
            tracing::error!(error = %e, "Gateway task panicked");
            GatewayError::Stopped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{EventDispatcher, EventDispatcherConfig, ListenerManager};
    use cord_cache::Cache;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;

    fn client() -> GatewayClient {
        let dispatcher = Arc::new(EventDispatcher::new(
            ListenerManager::new_shared(),
            EventDispatcherConfig::default(),
        ));
        let context = Arc::new(HandlerContext::new(Cache::new_shared(50, 3600), dispatcher, true));
        let rest = RestClient::new("token", "http://127.0.0.1:1/api", 10).unwrap();
        let mut config = GatewayConfig::new("token");
        config.gateway_url = Some("ws://127.0.0.1:1".to_string());
        GatewayClient::new(config, rest, context)
    }

    fn frame(code: u16) -> Option<CloseFrame<'static>> {
        Some(CloseFrame {
            code: WsCloseCode::from(code),
            reason: "bye".into(),
        })
    }

    #[test]
    fn test_close_codes() {
        let client = client();
        client.session.store_ready(ReadyPayload {
            session_id: "abc".to_string(),
            resume_gateway_url: None,
        });
        client.session.set_sequence(3);

        let error = client.close_error(frame(4004));
        assert!(matches!(error, GatewayError::Closed(CloseCode::AuthenticationFailed)));
        assert!(!error.is_recoverable());
        assert!(client.session.is_resumable());

        let error = client.close_error(frame(4009));
        assert!(error.is_recoverable());
        assert!(!client.session.is_resumable());

        assert!(matches!(
            client.close_error(frame(4321)),
            GatewayError::ClosedUnknown { code: 4321, .. }
        ));
    }

    #[test]
    fn test_commands_need_a_connection() {
        let client = client();
        assert!(matches!(
            client.update_presence(UserStatus::Idle, None),
            Err(GatewayError::NotConnected)
        ));
        assert!(client.request_guild_members(&[], false).is_ok());
    }

    #[tokio::test]
    async fn test_configured_url_skips_lookup() {
        let client = client();
        assert_eq!(
            client.session_url().await.unwrap(),
            "ws://127.0.0.1:1/?encoding=json&v=10"
        );
    }

    #[tokio::test]
    async fn test_disconnect_before_start() {
        let client = Arc::new(client());
        client.disconnect();
        let handle = Arc::clone(&client).start();
        assert!(handle.join().await.is_ok());
        assert!(client.is_stopped());
    }
}
