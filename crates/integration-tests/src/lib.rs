//! Integration tests for the Stealth Commerce storefront client.
//!
//! The tests drive the real client against [`FakeBackend`], an in-process
//! `axum` server on an ephemeral port that answers from a script of canned
//! responses and records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stealth-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = FakeBackend::start().await;
//! backend.on_json(Method::GET, "/products", 200, json!([]));
//! let mut store = backend.storefront();
//! assert!(store.load_products().await.unwrap().is_empty());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use stealth_client::{ClientConfig, MemorySessionStore, SessionStore, Storefront};
use tokio::net::TcpListener;
use url::form_urlencoded;

pub use axum::http::Method;

/// Path prefix the client's base URL carries.
const API_PREFIX: &str = "/api";

/// A request as the fake backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path without the `/api` prefix, e.g. `/orders`.
    pub path: String,
    /// Decoded query pairs in order.
    pub query: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

#[derive(Debug, Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<(Method, String), VecDeque<Canned>>,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<Script>>;

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted in-process backend.
///
/// Responses queued for the same method and path are served in order; the
/// last one keeps being served once the others are used up. Unscripted
/// requests get `404 {"error": "Not found"}`.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    base_url: String,
    script: Shared,
}

impl FakeBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let script = Shared::default();
        let app = Router::new().fallback(handle).with_state(script.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake backend");
        let addr = listener.local_addr().expect("listener has no address");

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Self {
            base_url: format!("http://{addr}{API_PREFIX}"),
            script,
        }
    }

    /// Base URL including the `/api` prefix.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue a raw response for `method path` (path without `/api`).
    pub fn on(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.queue(method, path, status, body.into(), None);
    }

    /// Queue a JSON response.
    pub fn on_json(&self, method: Method, path: &str, status: u16, body: Value) {
        self.queue(method, path, status, body.to_string(), None);
    }

    /// Queue a JSON response that is sent only after `delay`.
    pub fn on_delayed(&self, method: Method, path: &str, delay: Duration, body: Value) {
        self.queue(method, path, 200, body.to_string(), Some(delay));
    }

    fn queue(&self, method: Method, path: &str, status: u16, body: String, delay: Option<Duration>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        lock(&self.script)
            .responses
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Canned { status, body, delay });
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.script).requests.clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse (it always does).
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url).expect("fake backend URL is valid")
    }

    /// A storefront pointing at this backend with an in-memory session.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with(Arc::new(MemorySessionStore::new()))
    }

    /// A storefront pointing at this backend with the given session store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn storefront_with(&self, session: Arc<dyn SessionStore>) -> Storefront {
        Storefront::new(&self.config(), session).expect("failed to build storefront")
    }
}

async fn handle(State(script): State<Shared>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or_else(|| uri.path())
        .to_string();
    let query = uri
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let canned = {
        let mut script = lock(&script);
        script.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query,
            body: body.to_vec(),
        });
        script
            .responses
            .get_mut(&(method, path))
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
    };

    let Some(canned) = canned else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"Not found"}"#,
        )
            .into_response();
    };

    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }
    (
        canned.status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response()
}
