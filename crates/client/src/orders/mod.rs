//! Order submission and history.

pub mod history;

use serde::Deserialize;
use serde::de::Error as _;
use serde_json::Value;
use tracing::{debug, info, instrument};

use stealth_core::{OrderId, UserId};

use crate::api::decode::{ListShape, Pagination, decode_list};
use crate::api::{ApiClient, ApiError, ApiRequest, endpoints};
use crate::cart::CartLine;
use crate::models::{Address, Order, OrderRequest};

pub use history::{HistoryPhase, OrderHistory, PageRequest, PaginationState};

const HISTORY_SHAPES: &[ListShape] = &[
    ListShape::Envelope("orders"),
    ListShape::SingleEnvelope("order"),
    ListShape::BareArray,
    ListShape::Empty,
];

// =============================================================================
// Creation responses
// =============================================================================

/// One named way the order creation endpoint may answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationShape {
    /// `{"order": {...}}`
    OrderEnvelope,
    /// The order object itself. Must carry `items` to be told apart from an
    /// acknowledgement.
    BareOrder,
    /// `{"_id": "...", "message": "..."?}`
    UnderscoreId,
    /// `{"id": "...", "message": "..."?}`
    Id,
    /// `{"orderId": "...", "message": "..."?}`
    OrderIdField,
}

/// Shapes tried, in order, when decoding a creation response.
pub const CREATION_SHAPES: &[CreationShape] = &[
    CreationShape::OrderEnvelope,
    CreationShape::BareOrder,
    CreationShape::UnderscoreId,
    CreationShape::Id,
    CreationShape::OrderIdField,
];

/// What the server said after accepting an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderCreated {
    /// The full stored order.
    Order(Box<Order>),
    /// Only the new order's id, with an optional message.
    Acknowledged {
        id: OrderId,
        message: Option<String>,
    },
}

impl OrderCreated {
    /// Id of the created order.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        match self {
            Self::Order(order) => &order.id,
            Self::Acknowledged { id, .. } => id,
        }
    }

    /// The stored order, when the server returned it.
    #[must_use]
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Order(order) => Some(order),
            Self::Acknowledged { .. } => None,
        }
    }

    /// Message attached to an acknowledgement.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Order(_) => None,
            Self::Acknowledged { message, .. } => message.as_deref(),
        }
    }
}

/// Decode an order creation response by trying [`CREATION_SHAPES`] in order.
///
/// # Errors
///
/// Returns [`ApiError::EmptyBody`] for an empty body, or
/// [`ApiError::Decoding`] if no shape matches.
pub fn decode_created(body: &[u8]) -> Result<(OrderCreated, CreationShape), ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyBody);
    }
    let value: Value = serde_json::from_slice(body).map_err(ApiError::Decoding)?;

    let mut first_error = None;
    for &shape in CREATION_SHAPES {
        match try_creation_shape(shape, &value) {
            Ok(created) => {
                debug!(?shape, order_id = %created.order_id(), "Decoded order creation response");
                return Ok((created, shape));
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

fn try_creation_shape(shape: CreationShape, value: &Value) -> Result<OrderCreated, serde_json::Error> {
    let acknowledged = |key: &'static str| -> Result<OrderCreated, serde_json::Error> {
        let id = value
            .get(key)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| serde_json::Error::missing_field(key))?;
        Ok(OrderCreated::Acknowledged {
            id: OrderId::new(id),
            message: value.get("message").and_then(Value::as_str).map(str::to_string),
        })
    };

    match shape {
        CreationShape::OrderEnvelope => {
            let order = value
                .get("order")
                .filter(|v| v.is_object())
                .ok_or_else(|| serde_json::Error::missing_field("order"))?;
            Ok(OrderCreated::Order(Box::new(Order::deserialize(order)?)))
        }
        CreationShape::BareOrder => {
            if value.get("items").is_none() {
                return Err(serde_json::Error::missing_field("items"));
            }
            Ok(OrderCreated::Order(Box::new(Order::deserialize(value)?)))
        }
        CreationShape::UnderscoreId => acknowledged("_id"),
        CreationShape::Id => acknowledged("id"),
        CreationShape::OrderIdField => acknowledged("orderId"),
    }
}

// =============================================================================
// History responses
// =============================================================================

/// One page of a user's order history.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Server pagination, or a single-page default when none was sent.
    pub pagination: Pagination,
    /// The response shape that matched.
    pub shape: ListShape,
}

/// Result of a history fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderHistoryResponse {
    Page(OrderPage),
    /// The server answered 404: the user has no orders yet.
    NoOrders,
}

/// Decode a history page by trying the history shapes in order.
///
/// # Errors
///
/// Returns [`ApiError::Decoding`] if no shape matches.
pub fn decode_history(body: &[u8]) -> Result<OrderPage, ApiError> {
    let payload = decode_list::<Order>(body, HISTORY_SHAPES)?;
    let count = u32::try_from(payload.items.len()).unwrap_or(u32::MAX);
    Ok(OrderPage {
        pagination: payload
            .pagination
            .unwrap_or_else(|| Pagination::single_page(count)),
        orders: payload.items,
        shape: payload.shape,
    })
}

// =============================================================================
// OrderService
// =============================================================================

/// Network operations on orders.
#[derive(Debug, Clone)]
pub struct OrderService {
    api: ApiClient,
    page_size: u32,
}

impl OrderService {
    #[must_use]
    pub const fn new(api: ApiClient, page_size: u32) -> Self {
        Self { api, page_size }
    }

    /// Orders requested per history page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Submit an order built from cart lines. The cart itself is not touched.
    ///
    /// An empty `lines` slice is sent as-is; the server decides.
    ///
    /// # Errors
    ///
    /// Returns the server's error verbatim, or a decoding error if the
    /// response matches none of the creation shapes.
    #[instrument(skip(self, lines, shipping_address), fields(user_id = %user_id, lines = lines.len()))]
    pub async fn create_order(
        &self,
        user_id: &UserId,
        lines: &[CartLine],
        shipping_address: &Address,
    ) -> Result<OrderCreated, ApiError> {
        let body = OrderRequest::from_lines(user_id.clone(), lines, shipping_address.clone());
        let raw = self
            .api
            .execute(ApiRequest::post([endpoints::ORDERS]).json(&body)?)
            .await?;
        let (created, _) = decode_created(&raw.body)?;
        info!(order_id = %created.order_id(), "Order created");
        Ok(created)
    }

    /// `GET /orders?user=..&page=..&limit=..`.
    ///
    /// A 404 means the user has no orders and is returned as
    /// [`OrderHistoryResponse::NoOrders`].
    ///
    /// # Errors
    ///
    /// Returns any other server or transport error, or a decoding error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn fetch_order_history(
        &self,
        user_id: &UserId,
        page: u32,
    ) -> Result<OrderHistoryResponse, ApiError> {
        let request = ApiRequest::get([endpoints::ORDERS])
            .query("user", user_id)
            .query("page", page)
            .query("limit", self.page_size);

        match self.api.execute(request).await {
            Ok(raw) => {
                let page = decode_history(&raw.body)?;
                debug!(count = page.orders.len(), shape = ?page.shape, "Fetched order history page");
                Ok(OrderHistoryResponse::Page(page))
            }
            Err(e) if e.is_not_found() => {
                debug!("No orders for user");
                Ok(OrderHistoryResponse::NoOrders)
            }
            Err(e) => Err(e),
        }
    }
}
