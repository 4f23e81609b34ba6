//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - [`ApiClient`] wraps a single `reqwest::Client` behind an `Arc`, so it is
//!   cheap to clone into every service that needs it
//! - Every call is a single attempt: no retries, no backoff, a fixed timeout
//! - Status codes >= 400 are turned into [`ApiError::Server`] before any
//!   attempt is made to decode the success type
//! - The backend is inconsistent about response envelopes, so list and object
//!   payloads go through the ordered, named shapes in [`decode`]
//!
//! # Example
//!
//! ```rust,ignore
//! use stealth_client::api::{ApiClient, ApiRequest, endpoints};
//!
//! let client = ApiClient::new(&config)?;
//! let products: Vec<Product> = client
//!     .request(ApiRequest::get([endpoints::PRODUCTS]))
//!     .await?;
//! ```

mod client;
pub mod decode;
pub mod endpoints;
mod error;

pub use client::{ApiClient, ApiRequest, RawResponse};
pub use error::ApiError;
