//! The cart reducer.

use serde::{Deserialize, Serialize};
use toolkart_core::{Price, ProductId, ProductSummary};

/// One line of the cart. Unique by product id within a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The cart: items in insertion order plus the derived total.
///
/// Invariant: `total == Σ price × quantity` after every mutation. The total
/// is recomputed from scratch rather than adjusted incrementally, so no
/// sequence of operations can make it drift.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartItem>,
    total: Price,
}

impl CartState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> Price {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.id == id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    /// Add one unit of `product`: merge into an existing line or append a new
    /// line with quantity 1.
    pub fn add(&mut self, product: &ProductSummary) {
        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.items.push(CartItem {
                id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                quantity: 1,
                image: product.display_image(),
            }),
        }
        self.recompute_total();
    }

    /// Remove the line for `id`. Absent id is a no-op.
    pub fn remove(&mut self, id: &ProductId) {
        self.items.retain(|item| &item.id != id);
        self.recompute_total();
    }

    /// Set the quantity of an existing line. Quantity 0 removes the line;
    /// an absent id is a no-op either way.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|item| &item.id == id) {
            line.quantity = quantity;
        }
        self.recompute_total();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute_total();
    }

    /// Replace the whole cart (server-driven refresh).
    pub fn replace(&mut self, items: Vec<CartItem>) {
        self.items = items;
        self.recompute_total();
    }

    /// Re-establish the total invariant, e.g. after deserializing a snapshot
    /// whose stored total cannot be trusted.
    pub fn normalize(&mut self) {
        self.recompute_total();
    }

    fn recompute_total(&mut self) {
        self.total = self.items.iter().map(CartItem::line_total).sum();
    }
}
