//! REST client
//!
//! Thin wrapper around `reqwest` that adds authorization, rate limiting,
//! the 429 retry loop and error mapping.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{RestError, RestResult};
use crate::ratelimit::{RatelimitHeaders, RatelimitManager};
use crate::request::{RestRequest, RestResponse};

const DEFAULT_BASE_URL: &str = "https://discord.com/api";
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Authenticated client for Discord's HTTP API
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
    api_version: u8,
    max_retries: u32,
    ratelimits: Arc<RatelimitManager>,
}

impl RestClient {
    /// Create a client for a bot token
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(token: impl Into<String>, base_url: impl Into<String>, api_version: u8) -> RestResult<Self> {
        let user_agent = format!("DiscordBot (https://crates.io/crates/cord, {})", env!("CARGO_PKG_VERSION"));
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version,
            max_retries: DEFAULT_MAX_RETRIES,
            ratelimits: RatelimitManager::new_shared(),
        })
    }

    /// Client against Discord's production API
    pub fn with_token(token: impl Into<String>, api_version: u8) -> RestResult<Self> {
        Self::new(token, DEFAULT_BASE_URL, api_version)
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> u8 {
        self.api_version
    }

    pub fn ratelimits(&self) -> &RatelimitManager {
        &self.ratelimits
    }

    /// Send a request, waiting for rate limits and retrying 429 responses.
    ///
    /// # Errors
    /// Returns the mapped Discord error for non-success responses and
    /// `RateLimited` once `max_retries` is exceeded.
    pub async fn execute(&self, request: RestRequest) -> RestResult<RestResponse> {
        let key = request.bucket_key();
        let url = request.url(&self.base_url, self.api_version);
        let mut retries = 0;

        loop {
            let mut bucket = self.ratelimits.acquire(&key).await;

            tracing::debug!(method = %request.method, url = %url, "Sending request");
            let response = self.send(&request, &url).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = Self::read_body(response, status).await?;
            let ratelimit = RatelimitHeaders::parse(&headers, body.as_ref());
            self.ratelimits.update(&mut bucket, status, &ratelimit);
            drop(bucket);

            if let Some(body) = &body {
                tracing::trace!(status = %status, body = %body, "Received response");
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > self.max_retries {
                    return Err(RestError::RateLimited {
                        retry_after: ratelimit.retry_after.unwrap_or_default(),
                    });
                }
                tracing::debug!(
                    url = %url,
                    retry = retries,
                    global = ratelimit.global,
                    "Received 429, retrying"
                );
                continue;
            }

            if !status.is_success() {
                return Err(RestError::from_response(status, body.as_ref()));
            }

            return Ok(RestResponse {
                status,
                body,
                ratelimit,
            });
        }
    }

    async fn send(&self, request: &RestRequest, url: &str) -> RestResult<reqwest::Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(self.headers(request));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    fn headers(&self, request: &RestRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if request.include_authorization {
            if let Ok(value) = HeaderValue::from_str(&format!("Bot {}", self.token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        if let Some(reason) = &request.audit_log_reason {
            if let Ok(value) = HeaderValue::from_str(&urlencoding::encode(reason)) {
                headers.insert("x-audit-log-reason", value);
            }
        }
        headers
    }

    /// Empty bodies are `None`; error bodies that are not JSON are dropped
    async fn read_body(response: reqwest::Response, status: StatusCode) -> RestResult<Option<Value>> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        if status.is_success() {
            Ok(Some(serde_json::from_str(&text)?))
        } else {
            Ok(serde_json::from_str(&text).ok())
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("max_retries", &self.max_retries)
            .field("ratelimits", &self.ratelimits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::RestEndpoint;

    #[test]
    fn test_new_trims_base_url() {
        let client = RestClient::new("token", "http://127.0.0.1:1/api/", 10).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:1/api");
        assert_eq!(client.api_version(), 10);
    }

    #[test]
    fn test_headers() {
        let client = RestClient::new("secret", DEFAULT_BASE_URL, 10).unwrap();
        let request = RestRequest::delete(RestEndpoint::Role)
            .url_params([1, 2])
            .audit_log_reason(Some("spring cleaning"));
        let headers = client.headers(&request);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bot secret");
        assert_eq!(headers.get("x-audit-log-reason").unwrap(), "spring%20cleaning");

        let anonymous = client.headers(&RestRequest::get(RestEndpoint::Gateway).without_authorization());
        assert!(anonymous.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = RestClient::new("super-secret", DEFAULT_BASE_URL, 10).unwrap();
        let output = format!("{client:?}");
        assert!(!output.contains("super-secret"));
    }
}
