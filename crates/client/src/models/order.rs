//! Orders, as submitted and as returned by the history endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stealth_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use super::Address;
use crate::cart::{CartLine, SHIPPING_COST};

/// Display format of an order date, e.g. `Mar 4, 2025`.
const DATE_FORMAT: &str = "%b %-d, %Y";

// =============================================================================
// Returned orders
// =============================================================================

/// The user an order belongs to, as embedded in the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Orders reference their user either populated or as a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderUser {
    Summary(UserSummary),
    Id(UserId),
}

impl OrderUser {
    /// The referenced user's id.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        match self {
            Self::Summary(summary) => &summary.id,
            Self::Id(id) => id,
        }
    }
}

/// Product data captured when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: ProductSnapshot,
    pub quantity: u32,
    /// Unit price charged, when the server echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl OrderLine {
    /// Unit price charged, falling back to the product snapshot.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.price.unwrap_or(self.product.price)
    }

    /// `unit_price x quantity`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// A placed order. Immutable on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderUser>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    /// Total as computed by the server. Authoritative.
    #[serde(default)]
    pub total_amount: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    /// ISO-8601 timestamp, kept verbatim.
    #[serde(default)]
    pub created_at: String,
}

impl Order {
    /// Creation time, if the server's timestamp parses as RFC 3339.
    #[must_use]
    pub fn created_at_parsed(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Creation date for display (`Mar 4, 2025`), or the raw string if it
    /// does not parse.
    #[must_use]
    pub fn formatted_date(&self) -> String {
        self.created_at_parsed().map_or_else(
            || self.created_at.clone(),
            |dt| dt.format(DATE_FORMAT).to_string(),
        )
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }
}

// =============================================================================
// Submitted orders
// =============================================================================

/// One line of an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequestLine {
    pub product: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user: UserId,
    pub items: Vec<OrderRequestLine>,
    pub shipping_address: Address,
    pub total_amount: Price,
}

impl OrderRequest {
    /// Build a request from cart lines. The total includes the flat shipping
    /// cost; the server recomputes it and its figure is the one kept.
    #[must_use]
    pub fn from_lines(user: UserId, lines: &[CartLine], shipping_address: Address) -> Self {
        let items: Vec<OrderRequestLine> = lines
            .iter()
            .map(|line| OrderRequestLine {
                product: line.product.id.clone(),
                quantity: line.quantity,
                price: line.product.price,
            })
            .collect();
        let subtotal: Price = lines.iter().map(CartLine::total).sum();

        Self {
            user,
            items,
            shipping_address,
            total_amount: subtotal + SHIPPING_COST,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "_id": "o1",
        "user": {"_id": "u1", "email": "a@example.com", "firstName": "Ada", "lastName": "L"},
        "items": [
            {"product": {"_id": "p1", "name": "Cap", "price": 5.0}, "quantity": 2},
            {"product": {"_id": "p2", "name": "Tee", "price": 3.5, "imageUrl": "https://img/t.png"}, "quantity": 1, "price": 3.0}
        ],
        "totalAmount": 18.5,
        "status": "shipped",
        "shippingAddress": {"street": "1 Main", "city": "X", "state": "Y", "zipCode": "1"},
        "createdAt": "2025-03-04T10:15:00.000Z"
    }"#;

    #[test]
    fn test_decode_populated_order() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.id.as_str(), "o1");
        assert_eq!(order.user.as_ref().unwrap().id().as_str(), "u1");
        assert!(matches!(order.user, Some(OrderUser::Summary(_))));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_amount, Price::from_cents(1850));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items[0].unit_price(), Price::from_cents(500));
        assert_eq!(order.items[1].unit_price(), Price::from_cents(300));
        assert_eq!(order.items[0].total(), Price::from_cents(1000));
        assert_eq!(order.shipping_address.unwrap().zip_code, "1");
    }

    #[test]
    fn test_decode_user_as_bare_id() {
        let order: Order =
            serde_json::from_str(r#"{"_id":"o2","user":"u9","status":"pending"}"#).unwrap();
        assert_eq!(order.user, Some(OrderUser::Id(UserId::new("u9"))));
        assert!(order.items.is_empty());
        assert_eq!(order.total_amount, Price::ZERO);
    }

    #[test]
    fn test_decode_with_virtual_ids() {
        let order: Order = serde_json::from_str(
            r#"{"_id":"o5","id":"o5","user":{"_id":"u1","id":"u1"},
                "items":[{"product":{"_id":"p1","id":"p1","name":"Cap","price":5},"quantity":1}]}"#,
        )
        .unwrap();
        assert_eq!(order.id.as_str(), "o5");
        assert_eq!(order.user.unwrap().id().as_str(), "u1");
        assert_eq!(order.items[0].product.id.as_str(), "p1");
    }

    #[test]
    fn test_item_count_saturates() {
        let order: Order = serde_json::from_str(
            r#"{"_id":"o6","items":[
                {"product":{"_id":"p1","price":1},"quantity":4294967295},
                {"product":{"_id":"p2","price":1},"quantity":2}]}"#,
        )
        .unwrap();
        assert_eq!(order.item_count(), u32::MAX);
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let order: Order = serde_json::from_str(r#"{"_id":"o3","status":"on-hold"}"#).unwrap();
        assert_eq!(order.status, OrderStatus::Other("on-hold".to_string()));
    }

    #[test]
    fn test_formatted_date() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.formatted_date(), "Mar 4, 2025");

        let odd: Order =
            serde_json::from_str(r#"{"_id":"o4","createdAt":"last tuesday"}"#).unwrap();
        assert!(odd.created_at_parsed().is_none());
        assert_eq!(odd.formatted_date(), "last tuesday");
    }
}
