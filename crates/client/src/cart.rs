//! In-memory shopping cart.
//!
//! One line per product, in insertion order. Quantities never drop below 1;
//! stock limits are applied by [`crate::Storefront`] before quantities reach
//! the cart.

use stealth_core::{CartLineId, Price, ProductId};

use crate::models::Product;

/// Flat shipping charge added to every order.
pub const SHIPPING_COST: Price = Price::from_cents(500);

/// One product and its quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Client-generated line id.
    pub id: CartLineId,
    /// Product as it was when added.
    pub product: Product,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// `price x quantity`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line for the same product is increased; otherwise a new
    /// line is appended. Returns the affected line id, or `None` when
    /// `quantity` is not positive (nothing changes).
    pub fn add(&mut self, product: &Product, quantity: i64) -> Option<CartLineId> {
        let quantity = to_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return Some(line.id);
        }

        let line = CartLine {
            id: CartLineId::generate(),
            product: product.clone(),
            quantity,
        };
        let id = line.id;
        self.lines.push(line);
        Some(id)
    }

    /// Set a line's quantity, clamped to at least 1.
    ///
    /// Returns `false` if no line has that id.
    pub fn update_quantity(&mut self, line_id: CartLineId, quantity: i64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.id == line_id) else {
            return false;
        };
        line.quantity = to_quantity(quantity).unwrap_or(1);
        true
    }

    /// Remove a line. Returns the removed line, if any.
    pub fn remove(&mut self, line_id: CartLineId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.id == line_id)?;
        Some(self.lines.remove(index))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by id.
    #[must_use]
    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Look up the line holding a product.
    #[must_use]
    pub fn line_for_product(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product.id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::total).sum()
    }

    /// Flat shipping charge.
    #[must_use]
    pub const fn shipping_cost(&self) -> Price {
        SHIPPING_COST
    }

    /// `subtotal + shipping_cost`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal() + self.shipping_cost()
    }
}

/// Positive `i64` to `u32`, saturating at `u32::MAX`.
fn to_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        return None;
    }
    Some(u32::try_from(quantity).unwrap_or(u32::MAX))
}
