//! REST requests and responses

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::RestClient;
use crate::endpoint::RestEndpoint;
use crate::error::RestResult;
use crate::ratelimit::{BucketKey, RatelimitHeaders};

/// A request to one endpoint, built fluently
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    pub endpoint: RestEndpoint,
    pub url_params: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub audit_log_reason: Option<String>,
    pub include_authorization: bool,
}

impl RestRequest {
    pub fn new(method: Method, endpoint: RestEndpoint) -> Self {
        Self {
            method,
            endpoint,
            url_params: Vec::new(),
            query: Vec::new(),
            body: None,
            audit_log_reason: None,
            include_authorization: true,
        }
    }

    pub fn get(endpoint: RestEndpoint) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: RestEndpoint) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: RestEndpoint) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: RestEndpoint) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: RestEndpoint) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    #[must_use]
    pub fn url_param(mut self, param: impl ToString) -> Self {
        self.url_params.push(param.to_string());
        self
    }

    #[must_use]
    pub fn url_params<I, P>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: ToString,
    {
        self.url_params
            .extend(params.into_iter().map(|param| param.to_string()));
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn audit_log_reason(mut self, reason: Option<impl Into<String>>) -> Self {
        self.audit_log_reason = reason.map(Into::into);
        self
    }

    /// Send without the bot token, for endpoints like GATEWAY
    #[must_use]
    pub fn without_authorization(mut self) -> Self {
        self.include_authorization = false;
        self
    }

    pub fn bucket_key(&self) -> BucketKey {
        BucketKey::new(
            Some(self.endpoint),
            self.endpoint.major_param(&self.url_params),
        )
    }

    pub fn url(&self, base: &str, version: u8) -> String {
        self.endpoint.url(base, version, &self.url_params)
    }

    /// Send through the client's rate limiter and retry loop
    pub async fn execute(self, client: &RestClient) -> RestResult<RestResponse> {
        client.execute(self).await
    }
}

/// A successful response
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: StatusCode,
    /// `None` for empty bodies such as 204 No Content
    pub body: Option<Value>,
    pub ratelimit: RatelimitHeaders,
}

impl RestResponse {
    /// Deserialize the body; an empty body deserializes from `null`
    pub fn json<T: DeserializeOwned>(&self) -> RestResult<T> {
        let body = self.body.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fluent_request() {
        let request = RestRequest::patch(RestEndpoint::Role)
            .url_param(1u64)
            .url_param("2")
            .query("with_counts", true)
            .body(json!({"name": "mods"}))
            .audit_log_reason(Some("cleanup"));

        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.url_params, vec!["1", "2"]);
        assert_eq!(request.query, vec![("with_counts".to_string(), "true".to_string())]);
        assert_eq!(request.audit_log_reason.as_deref(), Some("cleanup"));
        assert!(request.include_authorization);
        assert_eq!(
            request.url("https://discord.com/api", 10),
            "https://discord.com/api/v10/guilds/1/roles/2"
        );
    }

    #[test]
    fn test_bucket_key_uses_major_param() {
        let a = RestRequest::get(RestEndpoint::Message).url_params([5, 6]);
        let b = RestRequest::get(RestEndpoint::Message).url_params([5, 7]);
        assert_eq!(a.bucket_key(), b.bucket_key());
        assert_eq!(a.bucket_key().major_param.as_deref(), Some("5"));
    }

    #[test]
    fn test_without_authorization() {
        let request = RestRequest::get(RestEndpoint::Gateway).without_authorization();
        assert!(!request.include_authorization);
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Deserialize)]
        struct Gateway {
            url: String,
        }

        let response = RestResponse {
            status: StatusCode::OK,
            body: Some(json!({"url": "wss://gateway.discord.gg"})),
            ratelimit: RatelimitHeaders::default(),
        };
        let gateway: Gateway = response.json().unwrap();
        assert_eq!(gateway.url, "wss://gateway.discord.gg");

        let empty = RestResponse {
            status: StatusCode::NO_CONTENT,
            body: None,
            ratelimit: RatelimitHeaders::default(),
        };
        assert!(empty.is_empty());
        let unit: Option<Gateway> = empty.json().unwrap();
        assert!(unit.is_none());
    }
}
