//! Client lifecycle against the mock gateway and mock API
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::http::Method;
use chrono::Utc;
use cord::builders::{MemberUpdater, MessageBuilder};
use cord::{listener_fn, DiscordApi, DiscordApiBuilder, Event, ListenerScope, Snowflake};
use cord_gateway::protocol::{CloseCode, GatewayMessage, OpCode};
use cord_gateway::GatewayError;
use integration_tests::mock_gateway::SETTLE;
use integration_tests::mock_rest::MockResponse;
use integration_tests::{
    guild_create, message, ready, user, MockConnection, MockGateway, MockRest, BOT_ID, CHANNEL_ID,
    OWNER_ID, SERVER_ID, TEST_TIMEOUT,
};
use serde_json::json;
use tokio::sync::mpsc;

const TOKEN: &str = "test-token";
const SESSION_ID: &str = "session-1";

struct Harness {
    api: DiscordApi,
    gateway: MockGateway,
    connection: MockConnection,
    rest: MockRest,
    events: mpsc::UnboundedReceiver<Event>,
}

/// Log in through the mocks, playing READY and one GUILD_CREATE
async fn connect(heartbeat_interval_ms: u64) -> Result<Harness> {
    let mut gateway = MockGateway::start(heartbeat_interval_ms).await?;
    let rest = MockRest::start().await?;
    let (tx, events) = mpsc::unbounded_channel();

    let builder = DiscordApiBuilder::new()
        .token(TOKEN)
        .gateway_url(gateway.url())
        .rest_base_url(rest.base_url())
        .add_listener(
            ListenerScope::Global,
            listener_fn(move |event: Event| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(event);
                }
            }),
        );
    let login = tokio::spawn(builder.login());

    let mut connection = gateway.accept().await?;
    let identify = connection.expect_op(OpCode::Identify).await?;
    assert_eq!(identify.d["token"], TOKEN);

    connection.dispatch("READY", ready(SESSION_ID, &gateway.url(), &[SERVER_ID]))?;
    connection.dispatch("GUILD_CREATE", guild_create(SERVER_ID))?;

    let api = tokio::time::timeout(TEST_TIMEOUT, login).await???;
    Ok(Harness {
        api,
        gateway,
        connection,
        rest,
        events,
    })
}

/// Wait for the first event `pick` accepts
async fn next_event<T>(
    events: &mut mpsc::UnboundedReceiver<Event>,
    mut pick: impl FnMut(&Event) -> Option<T>,
) -> Result<T> {
    tokio::time::timeout(TEST_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            if let Some(found) = pick(&event) {
                return Ok(found);
            }
        }
        Err(anyhow!("listener channel closed"))
    })
    .await
    .map_err(|_| anyhow!("event did not arrive"))?
}

// ============================================================================
// Gateway Tests
// ============================================================================

#[tokio::test]
async fn test_login_fills_cache_and_fires_ready() -> Result<()> {
    let mut h = connect(45_000).await?;

    let session = next_event(&mut h.events, |event| match event {
        Event::Ready(ready) => Some(ready.session_id.clone()),
        _ => None,
    })
    .await?;
    assert_eq!(session, SESSION_ID);

    let server_id = Snowflake::new(SERVER_ID);
    assert_eq!(h.api.yourself().map(|u| u.id), Some(Snowflake::new(BOT_ID)));
    assert_eq!(h.api.server(server_id).map(|s| s.name.clone()).as_deref(), Some("Test Server"));
    assert!(h.api.channel(Snowflake::new(CHANNEL_ID)).is_some());
    assert_eq!(h.api.server_members(server_id).len(), 2);
    assert_eq!(h.api.server_roles(server_id).len(), 1);
    assert_eq!(h.api.session_id().as_deref(), Some(SESSION_ID));
    Ok(())
}

#[tokio::test]
async fn test_message_create_reaches_listener_and_cache() -> Result<()> {
    let mut h = connect(45_000).await?;

    h.connection
        .dispatch("MESSAGE_CREATE", message(500, user(OWNER_ID, "owner"), "!ping"))?;
    let content = next_event(&mut h.events, |event| match event {
        Event::MessageCreate(e) => Some(e.message.content.clone()),
        _ => None,
    })
    .await?;
    assert_eq!(content, "!ping");

    let cached = h.api.cached_message(Snowflake::new(500)).expect("message cached");
    assert_eq!(cached.author.id, Snowflake::new(OWNER_ID));
    Ok(())
}

#[tokio::test]
async fn test_heartbeats_are_acknowledged() -> Result<()> {
    let h = connect(1_000).await?;

    tokio::time::timeout(TEST_TIMEOUT, async {
        while h.connection.heartbeats() == 0 || h.api.latency().is_none() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .map_err(|_| anyhow!("no acknowledged heartbeat"))?;
    Ok(())
}

#[tokio::test]
async fn test_reconnect_request_resumes_session() -> Result<()> {
    let mut h = connect(45_000).await?;

    h.connection.send(&GatewayMessage::reconnect())?;
    assert_eq!(h.connection.expect_close().await?, Some(4999));

    let mut resumed = h.gateway.accept().await?;
    let resume = resumed.expect_op(OpCode::Resume).await?;
    assert_eq!(resume.d["session_id"], SESSION_ID);
    assert_eq!(resume.d["seq"], 2);
    assert_eq!(resume.d["token"], TOKEN);

    resumed.set_sequence(2);
    resumed.dispatch("RESUMED", json!({}))?;
    next_event(&mut h.events, |event| matches!(event, Event::LostConnection).then_some(())).await?;
    next_event(&mut h.events, |event| matches!(event, Event::Resumed).then_some(())).await?;

    // the resumed connection keeps delivering
    resumed.dispatch("MESSAGE_CREATE", message(501, user(OWNER_ID, "owner"), "back"))?;
    next_event(&mut h.events, |event| match event {
        Event::MessageCreate(e) if e.message.content == "back" => Some(()),
        _ => None,
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn test_authentication_failure_fails_login() -> Result<()> {
    let mut gateway = MockGateway::start(45_000).await?;
    let login = tokio::spawn(
        DiscordApiBuilder::new()
            .token("bad-token")
            .gateway_url(gateway.url())
            .login(),
    );

    let mut connection = gateway.accept().await?;
    connection.expect_op(OpCode::Identify).await?;
    connection.close(4004, "Authentication failed.")?;

    let result = tokio::time::timeout(TEST_TIMEOUT, login).await??;
    let err = result.expect_err("login must fail");
    assert!(matches!(
        err,
        cord::Error::Gateway(GatewayError::Closed(CloseCode::AuthenticationFailed))
    ));

    // no reconnect after a fatal close
    assert!(tokio::time::timeout(SETTLE * 5, gateway.accept()).await.map_or(true, |accepted| accepted.is_err()));
    Ok(())
}

#[tokio::test]
async fn test_disconnect_closes_normally() -> Result<()> {
    let mut h = connect(45_000).await?;

    h.api.disconnect();
    assert_eq!(h.connection.expect_close().await?, Some(1000));
    tokio::time::timeout(TEST_TIMEOUT, h.api.join()).await??;
    Ok(())
}

#[tokio::test]
async fn test_presence_update_is_sent() -> Result<()> {
    let mut h = connect(45_000).await?;

    h.api
        .update_presence(cord_core::entities::UserStatus::DoNotDisturb, None)?;
    let presence = h.connection.expect_op(OpCode::PresenceUpdate).await?;
    assert_eq!(presence.d["status"], "dnd");

    h.api.request_members(&[Snowflake::new(SERVER_ID)], false)?;
    let request = h.connection.expect_op(OpCode::RequestGuildMembers).await?;
    assert_eq!(request.d["guild_id"], json!([SERVER_ID.to_string()]));
    Ok(())
}

// ============================================================================
// REST Facade Tests
// ============================================================================

#[tokio::test]
async fn test_send_message_returns_entity() -> Result<()> {
    let h = connect(45_000).await?;
    let path = format!("/channels/{CHANNEL_ID}/messages");
    h.rest.respond(
        Method::POST,
        &path,
        MockResponse::json(200, message(600, user(BOT_ID, "cord-bot"), "Pong!")),
    );

    let sent = h
        .api
        .send_message(Snowflake::new(CHANNEL_ID), &MessageBuilder::new().content("Pong!"))
        .await?;
    assert_eq!(sent.id, Snowflake::new(600));
    assert_eq!(sent.content, "Pong!");

    let request = &h.rest.requests_to(&Method::POST, &path)[0];
    assert_eq!(request.body.as_ref().map(|b| b["content"].clone()), Some(json!("Pong!")));
    Ok(())
}

#[tokio::test]
async fn test_open_private_channel_is_cached() -> Result<()> {
    let h = connect(45_000).await?;
    h.rest.respond(
        Method::POST,
        "/users/@me/channels",
        MockResponse::json(200, json!({"id": "77", "type": 1, "recipients": [user(OWNER_ID, "owner")]})),
    );

    let channel = h.api.open_private_channel(Snowflake::new(OWNER_ID)).await?;
    assert_eq!(channel.id(), Snowflake::new(77));
    let again = h.api.open_private_channel(Snowflake::new(OWNER_ID)).await?;
    assert_eq!(again.id(), Snowflake::new(77));

    let requests = h.rest.requests_to(&Method::POST, "/users/@me/channels");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body.as_ref().map(|b| b["recipient_id"].clone()), Some(json!(OWNER_ID.to_string())));
    Ok(())
}

#[tokio::test]
async fn test_bulk_delete_splits_old_messages() -> Result<()> {
    let h = connect(45_000).await?;
    let base = Snowflake::from_timestamp(Utc::now()).into_inner();
    let recent: Vec<_> = (1..=3).map(|i| Snowflake::new(base + i)).collect();
    let old = Snowflake::from_timestamp(Utc::now() - chrono::Duration::days(20));

    h.rest.respond(
        Method::POST,
        &format!("/channels/{CHANNEL_ID}/messages/bulk-delete"),
        MockResponse::no_content(),
    );
    h.rest.respond(
        Method::DELETE,
        &format!("/channels/{CHANNEL_ID}/messages/{old}"),
        MockResponse::no_content(),
    );

    let mut ids = recent.clone();
    ids.push(old);
    h.api.bulk_delete(Snowflake::new(CHANNEL_ID), &ids).await?;

    let bulk = h
        .rest
        .requests_to(&Method::POST, &format!("/channels/{CHANNEL_ID}/messages/bulk-delete"));
    assert_eq!(bulk.len(), 1);
    assert_eq!(bulk[0].body.as_ref().map(|b| b["messages"].as_array().map(Vec::len)), Some(Some(3)));
    assert_eq!(
        h.rest
            .requests_to(&Method::DELETE, &format!("/channels/{CHANNEL_ID}/messages/{old}"))
            .len(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_own_nickname_uses_dedicated_route() -> Result<()> {
    let h = connect(45_000).await?;
    h.rest.respond(
        Method::PATCH,
        &format!("/guilds/{SERVER_ID}/members/@me/nick"),
        MockResponse::json(200, json!({"nick": "cord"})),
    );

    let updated = h
        .api
        .update_member(
            Snowflake::new(SERVER_ID),
            Snowflake::new(BOT_ID),
            &MemberUpdater::new().nickname("cord"),
        )
        .await?;
    assert!(updated.is_none());

    let requests = h.rest.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body.as_ref().map(|b| b["nick"].clone()), Some(json!("cord")));
    Ok(())
}

#[tokio::test]
async fn test_ban_rejects_long_message_deletion() -> Result<()> {
    let h = connect(45_000).await?;

    let err = h
        .api
        .ban(Snowflake::new(SERVER_ID), Snowflake::new(OWNER_ID), 700_000, None)
        .await
        .unwrap_err();
    assert!(matches!(err, cord::Error::Domain(_)));
    assert!(h.rest.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rest_errors_surface_through_facade() -> Result<()> {
    let h = connect(45_000).await?;
    h.rest.respond(
        Method::GET,
        &format!("/channels/{CHANNEL_ID}/messages/999"),
        MockResponse::json(404, json!({"code": 10008, "message": "Unknown Message"})),
    );

    let err = h
        .api
        .fetch_message(Snowflake::new(CHANNEL_ID), Snowflake::new(999))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DISCORD_ERROR");
    assert!(matches!(err, cord::Error::Rest(ref e) if e.is_not_found()));
    Ok(())
}

#[tokio::test]
async fn test_unknown_channel_messages_are_dropped() -> Result<()> {
    let mut h = connect(45_000).await?;

    let mut stray = message(700, user(OWNER_ID, "owner"), "lost");
    stray["channel_id"] = json!("12345");
    h.connection.dispatch("MESSAGE_CREATE", stray)?;
    h.connection
        .dispatch("MESSAGE_CREATE", message(701, user(OWNER_ID, "owner"), "found"))?;

    let content = next_event(&mut h.events, |event| match event {
        Event::MessageCreate(e) => Some(e.message.content.clone()),
        _ => None,
    })
    .await?;
    assert_eq!(content, "found");
    assert!(h.api.cached_message(Snowflake::new(700)).is_none());
    assert!(h.api.cached_message(Snowflake::new(701)).is_some());
    Ok(())
}
