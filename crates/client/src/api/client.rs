//! HTTP client implementation.
//!
//! Uses `reqwest` for transport and `serde_json` for bodies. Bodies are
//! encoded by hand rather than through `RequestBuilder::json` so that an
//! encoding failure surfaces as [`ApiError::Encoding`] instead of being folded
//! into a transport error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;

use super::error::{ApiError, error_message};

/// Timeout for the reachability probe.
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of body characters written to logs.
const LOG_BODY_CHARS: usize = 500;

// =============================================================================
// ApiRequest
// =============================================================================

/// A single request against the backend, relative to the base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Build a request for `method` against the given path segments.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `GET` request.
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    /// `POST` request.
    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    /// `PUT` request.
    pub fn put<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::PUT, segments)
    }

    /// `DELETE` request.
    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a header, replacing any default with the same name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encoding`] if the body cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(body).map_err(ApiError::Encoding)?);
        Ok(self)
    }

    /// HTTP method of this request.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path of this request relative to the base URL (for logging).
    #[must_use]
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

// =============================================================================
// RawResponse
// =============================================================================

/// A successful (status < 400) response with its undecoded body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the body is empty or only whitespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Decode the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::EmptyBody`] for an empty body and
    /// [`ApiError::Decoding`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.is_empty() {
            return Err(ApiError::EmptyBody);
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            warn!(
                error = %e,
                body = %preview(&self.body),
                "Failed to decode response body"
            );
            ApiError::Decoding(e)
        })
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the underlying HTTP client cannot be
    /// built (e.g., no TLS backend available).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a request's path segments and query into an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if a segment is empty or the base
    /// URL cannot carry a path.
    pub fn endpoint(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        if request.segments.is_empty() {
            return Err(ApiError::InvalidEndpoint("no path segments".to_string()));
        }
        if let Some(position) = request.segments.iter().position(|s| s.trim().is_empty()) {
            return Err(ApiError::InvalidEndpoint(format!(
                "empty path segment at position {position} in {:?}",
                request.path()
            )));
        }

        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::InvalidEndpoint(format!(
                    "base URL {} cannot carry a path",
                    self.inner.base_url
                ))
            })?
            .pop_if_empty()
            .extend(&request.segments);

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        Ok(url)
    }

    /// Send a request and return the raw body of a successful response.
    ///
    /// Status codes >= 400 are returned as [`ApiError::Server`], carrying the
    /// message from an `{"error": "..."}` body when one can be decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the request fails in transit,
    /// or the server reports an error status.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let url = self.endpoint(&request)?;

        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(body) = request.body {
            debug!(body = %preview(&body), "Request body");
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, timeout = e.is_timeout(), "Request failed in transit");
            ApiError::Transport(e)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(
            status,
            bytes = body.len(),
            body = %preview(&body),
            "Response received"
        );

        if status >= 400 {
            let message = error_message(status, &body);
            warn!(status, message = ?message, "Server returned error status");
            return Err(ApiError::Server { status, message });
        }

        Ok(RawResponse { status, body })
    }

    /// Send a request and decode the response body as `T`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::execute`], [`ApiError::EmptyBody`] for an
    /// empty success body, or [`ApiError::Decoding`] on a shape mismatch.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.execute(request).await?.decode()
    }

    /// Send a request whose success body is irrelevant (e.g., `DELETE`).
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::execute`].
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await.map(|_| ())
    }

    /// Check that the base URL answers with a success status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the server cannot be reached within
    /// ten seconds, or [`ApiError::Server`] for a non-success status.
    #[instrument(skip(self), fields(base_url = %self.inner.base_url))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .get(self.inner.base_url.clone())
            .timeout(PING_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Server reachable");
            Ok(())
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                message: Some(format!("Server returned status code: {}", status.as_u16())),
            })
        }
    }
}

/// Truncated, lossy UTF-8 rendering of a body for logs.
fn preview(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(LOG_BODY_CHARS)
        .collect()
}
