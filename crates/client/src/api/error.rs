//! Error types for the storefront API client.

use thiserror::Error;

/// Message reported for a 418 response that carries no error body.
pub(crate) const TEAPOT_MESSAGE: &str = "I'm a teapot";

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint URL could not be built.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The request never produced a response (connectivity, DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered successfully but with no body to decode.
    #[error("empty response body")]
    EmptyBody,

    /// The response body did not match any accepted shape.
    #[error("failed to decode response: {0}")]
    Decoding(#[source] serde_json::Error),

    /// The server answered with a status code >= 400.
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from an `{"error": "..."}` body, if any.
        message: Option<String>,
    },
}

impl ApiError {
    /// HTTP status code, for server-reported errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }

    /// Whether the request hit the timeout ceiling.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Message the server attached to an error response.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// A message suitable for showing to a shopper.
    ///
    /// Server-provided messages are passed through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Server {
                status,
                message: None,
            } => format!("Server error: {status}"),
            Self::Transport(_) if self.is_timeout() => {
                "Request timed out. Please try again.".to_string()
            }
            Self::Transport(_) => "Could not reach the server. Check your connection.".to_string(),
            Self::EmptyBody => "No data received from server".to_string(),
            Self::Decoding(_) => "Unexpected response from server".to_string(),
            Self::InvalidEndpoint(_) | Self::Encoding(_) => "Invalid request".to_string(),
        }
    }
}

/// Best-effort error body returned by the backend.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorBody {
    /// Error message.
    pub error: String,
}

/// Extract the server message from an error response body.
pub(crate) fn error_message(status: u16, body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => Some(parsed.error),
        Err(_) if status == 418 => Some(TEAPOT_MESSAGE.to_string()),
        Err(_) => None,
    }
}
