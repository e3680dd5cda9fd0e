//! REST client against the mock API
//!
//! Run with: cargo test -p integration-tests --test rest_tests

use std::time::Duration;

use axum::http::Method;
use cord_core::Snowflake;
use cord_rest::builders::MessageBuilder;
use cord_rest::{RestClient, RestEndpoint, RestError, RestErrorCode, RestRequest};
use integration_tests::mock_rest::MockResponse;
use integration_tests::{discord_error, message, user, MockRest, CHANNEL_ID, OWNER_ID};
use serde_json::json;

fn client(rest: &MockRest) -> RestClient {
    RestClient::new("test-token", rest.base_url(), 10)
        .expect("client")
        .max_retries(3)
}

fn get_user(id: u64) -> RestRequest {
    RestRequest::get(RestEndpoint::User).url_param(id)
}

// ============================================================================
// Rate Limit Tests
// ============================================================================

#[tokio::test]
async fn test_exhausted_bucket_waits_for_reset() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(
        Method::GET,
        "/users/5",
        MockResponse::json(200, user(5, "someone")).exhausted_for(0.4),
    );
    let client = client(&rest);

    get_user(5).execute(&client).await.unwrap();
    get_user(5).execute(&client).await.unwrap();

    let requests = rest.requests_to(&Method::GET, "/users/5");
    assert_eq!(requests.len(), 2);
    let gap = requests[1].received_at - requests[0].received_at;
    assert!(gap >= Duration::from_millis(350), "second request came after {gap:?}");
}

#[tokio::test]
async fn test_separate_buckets_do_not_wait() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(
        Method::GET,
        &format!("/channels/{CHANNEL_ID}/messages/1"),
        MockResponse::json(200, message(1, user(OWNER_ID, "owner"), "a")).exhausted_for(5.0),
    );
    rest.respond(
        Method::GET,
        "/channels/11/messages/2",
        MockResponse::json(200, message(2, user(OWNER_ID, "owner"), "b")),
    );
    let client = client(&rest);

    RestRequest::get(RestEndpoint::Message)
        .url_params([CHANNEL_ID, 1])
        .execute(&client)
        .await
        .unwrap();
    let started = std::time::Instant::now();
    RestRequest::get(RestEndpoint::Message)
        .url_params([11, 2])
        .execute(&client)
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_429_is_retried_after_delay() {
    let rest = MockRest::start().await.unwrap();
    let path = format!("/channels/{CHANNEL_ID}/messages");
    rest.respond(
        Method::POST,
        &path,
        MockResponse::json(
            429,
            json!({"message": "You are being rate limited.", "retry_after": 0.25, "global": false}),
        )
        .header("retry-after", 0.25),
    );
    rest.respond(
        Method::POST,
        &path,
        MockResponse::json(200, message(50, user(100, "cord-bot"), "hello")),
    );
    let client = client(&rest);

    let response = MessageBuilder::new()
        .content("hello")
        .to_request(Snowflake::new(CHANNEL_ID))
        .unwrap()
        .execute(&client)
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 200);

    let requests = rest.requests_to(&Method::POST, &path);
    assert_eq!(requests.len(), 2);
    assert!(requests[1].received_at - requests[0].received_at >= Duration::from_millis(200));
    assert_eq!(requests[1].body.as_ref().unwrap()["content"], "hello");
}

#[tokio::test]
async fn test_429_gives_up_after_max_retries() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(
        Method::GET,
        "/users/5",
        MockResponse::json(429, json!({"message": "slow down", "retry_after": 0.05, "global": false})),
    );
    let client = client(&rest).max_retries(2);

    let err = get_user(5).execute(&client).await.unwrap_err();
    assert!(matches!(err, RestError::RateLimited { .. }));
    assert_eq!(rest.requests_to(&Method::GET, "/users/5").len(), 3);
}

// ============================================================================
// Error Mapping Tests
// ============================================================================

#[tokio::test]
async fn test_discord_code_wins_over_status() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(
        Method::GET,
        "/channels/10/messages/5",
        MockResponse::json(404, discord_error(10008, "Unknown Message")),
    );
    let client = client(&rest);

    let err = RestRequest::get(RestEndpoint::Message)
        .url_params([10, 5])
        .execute(&client)
        .await
        .unwrap_err();
    assert_eq!(err.discord_code(), Some(RestErrorCode::UnknownMessage));
    assert!(err.is_not_found());
    assert_eq!(err.code(), "DISCORD_ERROR");
}

#[tokio::test]
async fn test_status_fallbacks() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(Method::DELETE, "/guilds/1/members/2", MockResponse::json(403, json!({"message": "Forbidden"})));
    rest.respond(Method::GET, "/users/3", MockResponse::json(401, json!({"message": "401: Unauthorized"})));
    rest.respond(Method::GET, "/users/4", MockResponse::json(500, json!({"message": "oops"})));
    let client = client(&rest);

    let err = RestRequest::delete(RestEndpoint::ServerMember)
        .url_params([1, 2])
        .execute(&client)
        .await
        .unwrap_err();
    assert!(matches!(err, RestError::MissingPermissions(ref message) if message == "Forbidden"));

    let err = get_user(3).execute(&client).await.unwrap_err();
    assert!(matches!(err, RestError::Unauthorized));

    let err = get_user(4).execute(&client).await.unwrap_err();
    assert_eq!(err.code(), "SERVER_ERROR");

    // unknown route: 404 with code 0 falls back to the status
    let err = get_user(99).execute(&client).await.unwrap_err();
    assert!(matches!(err, RestError::NotFound(_)));
}

// ============================================================================
// Request Shape Tests
// ============================================================================

#[tokio::test]
async fn test_authorization_and_audit_log_headers() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(Method::DELETE, "/guilds/1/members/2", MockResponse::no_content());
    let client = client(&rest);

    let response = RestRequest::delete(RestEndpoint::ServerMember)
        .url_params([1, 2])
        .audit_log_reason(Some("spam bot"))
        .execute(&client)
        .await
        .unwrap();
    assert!(response.is_empty());

    let request = &rest.requests_to(&Method::DELETE, "/guilds/1/members/2")[0];
    assert_eq!(request.headers.get("authorization").unwrap(), "Bot test-token");
    assert_eq!(request.headers.get("x-audit-log-reason").unwrap(), "spam%20bot");
}

#[tokio::test]
async fn test_unicode_reaction_is_percent_encoded() {
    let rest = MockRest::start().await.unwrap();
    rest.respond(
        Method::PUT,
        "/channels/10/messages/5/reactions/%F0%9F%91%8D/@me",
        MockResponse::no_content(),
    );
    let client = client(&rest);

    RestRequest::put(RestEndpoint::Reaction)
        .url_params(["10", "5", "👍", "@me"])
        .execute(&client)
        .await
        .unwrap();
    assert_eq!(rest.requests().len(), 1);
}
