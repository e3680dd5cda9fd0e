//! Mock of Discord's REST API
//!
//! Responses are queued per method and path. The last queued response of
//! a route is repeated; unknown routes answer 404 with Discord's body.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A canned response
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl ToString) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Bucket exhausted until `reset_in_secs` from now
    #[must_use]
    pub fn exhausted_for(self, reset_in_secs: f64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        self.header("x-ratelimit-limit", 1)
            .header("x-ratelimit-remaining", 0)
            .header("x-ratelimit-reset", format!("{:.3}", now + reset_in_secs))
            .header("x-ratelimit-reset-after", reset_in_secs)
    }

    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        match self.body {
            Some(body) => (self.status, headers, axum::Json(body)).into_response(),
            None => (self.status, headers).into_response(),
        }
    }
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub received_at: Instant,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Running mock REST server
pub struct MockRest {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    _handle: JoinHandle<()>,
}

impl MockRest {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Value for `rest_base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Queue a response for `method` on `path` (below `/api/v10`)
    pub fn respond(&self, method: Method, path: &str, response: MockResponse) {
        self.state
            .routes
            .lock()
            .entry((method, format!("/api/v10{path}")))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Requests received on one route
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        let path = format!("/api/v10{path}");
        self.requests()
            .into_iter()
            .filter(|request| request.method == *method && request.path == path)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body: serde_json::from_slice(&body).ok(),
        received_at: Instant::now(),
    });

    let response = {
        let mut routes = state.routes.lock();
        routes.get_mut(&(method, path)).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    response
        .unwrap_or_else(|| MockResponse::json(404, serde_json::json!({"message": "404: Not Found", "code": 0})))
        .into_response()
}
