//! Lenient decoding for inconsistent response envelopes.
//!
//! The backend returns the same payload in several shapes depending on the
//! endpoint and version: a list may arrive as a bare array or wrapped as
//! `{"orders": [...], "pagination": {...}}`, and a single object may arrive
//! bare or as `{"order": {...}}`. Rather than guessing, callers pass an
//! ordered list of named shapes, richest first. The first shape that decodes
//! wins; if none does, the error from the first applicable shape is returned.

use serde::Deserialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;

/// Pagination block attached to list envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct Pagination {
    /// Total number of items across all pages.
    #[serde(default)]
    pub total: u32,
    /// Current page (1-based).
    #[serde(default = "first_page")]
    pub page: u32,
    /// Total number of pages.
    #[serde(default = "first_page")]
    pub pages: u32,
    /// Page size used by the server.
    #[serde(default)]
    pub limit: u32,
}

const fn first_page() -> u32 {
    1
}

impl Pagination {
    /// Pagination assumed for payloads that carry none: one page holding
    /// exactly `count` items.
    #[must_use]
    pub const fn single_page(count: u32) -> Self {
        Self {
            total: count,
            page: 1,
            pages: 1,
            limit: count,
        }
    }
}

/// One named way a list payload may be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// `{"<key>": [...], "pagination": {...}?}`
    Envelope(&'static str),
    /// `{"<key>": {...}}` holding a single item.
    SingleEnvelope(&'static str),
    /// `[...]`
    BareArray,
    /// Zero-byte or whitespace-only body.
    Empty,
}

/// A decoded list payload along with the shape it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPayload<T> {
    /// Decoded items.
    pub items: Vec<T>,
    /// Pagination, when the payload carried one.
    pub pagination: Option<Pagination>,
    /// The shape that matched.
    pub shape: ListShape,
}

/// One named way a single-object payload may be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectShape {
    /// `{"<key>": {...}}`
    Envelope(&'static str),
    /// `{...}`
    Bare,
}

/// Decode a list payload by trying `shapes` in order.
///
/// An empty body decodes to an empty list only if [`ListShape::Empty`] is
/// among the accepted shapes; otherwise it is [`ApiError::EmptyBody`].
///
/// # Errors
///
/// Returns [`ApiError::Decoding`] if the body is not JSON or no shape matches.
pub fn decode_list<T: DeserializeOwned>(
    body: &[u8],
    shapes: &[ListShape],
) -> Result<ListPayload<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return if shapes.contains(&ListShape::Empty) {
            Ok(ListPayload {
                items: Vec::new(),
                pagination: None,
                shape: ListShape::Empty,
            })
        } else {
            Err(ApiError::EmptyBody)
        };
    }

    let value: Value = serde_json::from_slice(body).map_err(ApiError::Decoding)?;
    let mut first_error = None;

    for &shape in shapes {
        let attempt = match shape {
            ListShape::Envelope(key) => list_envelope::<T>(&value, key),
            ListShape::SingleEnvelope(key) => {
                field(&value, key).and_then(|item| T::deserialize(item).map(|t| (vec![t], None)))
            }
            ListShape::BareArray => Vec::<T>::deserialize(&value).map(|items| (items, None)),
            ListShape::Empty => continue,
        };

        match attempt {
            Ok((items, pagination)) => {
                debug!(?shape, count = items.len(), "Decoded list payload");
                return Ok(ListPayload {
                    items,
                    pagination,
                    shape,
                });
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    Err(ApiError::Decoding(first_error.unwrap_or_else(|| {
        serde_json::Error::custom("no response shape accepted")
    })))
}

/// Decode a single-object payload by trying `shapes` in order.
///
/// # Errors
///
/// Returns [`ApiError::EmptyBody`] for an empty body and
/// [`ApiError::Decoding`] if the body is not JSON or no shape matches.
pub fn decode_object<T: DeserializeOwned>(
    body: &[u8],
    shapes: &[ObjectShape],
) -> Result<(T, ObjectShape), ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyBody);
    }

    let value: Value = serde_json::from_slice(body).map_err(ApiError::Decoding)?;
    let mut first_error = None;

    for &shape in shapes {
        let attempt = match shape {
            ObjectShape::Envelope(key) => field(&value, key).and_then(T::deserialize),
            ObjectShape::Bare => T::deserialize(&value),
        };

        match attempt {
            Ok(object) => {
                debug!(?shape, "Decoded object payload");
                return Ok((object, shape));
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    Err(ApiError::Decoding(first_error.unwrap_or_else(|| {
        serde_json::Error::custom("no response shape accepted")
    })))
}

fn field<'a>(value: &'a Value, key: &'static str) -> Result<&'a Value, serde_json::Error> {
    value
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| serde_json::Error::missing_field(key))
}

type ListParts<T> = (Vec<T>, Option<Pagination>);

fn list_envelope<T: DeserializeOwned>(
    value: &Value,
    key: &'static str,
) -> Result<ListParts<T>, serde_json::Error> {
    let items = Vec::<T>::deserialize(field(value, key)?)?;
    let pagination = match value.get("pagination") {
        None | Some(Value::Null) => None,
        Some(p) => Some(Pagination::deserialize(p)?),
    };
    Ok((items, pagination))
}
