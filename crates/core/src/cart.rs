//! Pure cart state transitions.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s with two invariants:
//! no two lines share a product id, and every quantity is at least 1.
//! Lines are removed rather than left at zero.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, Product, ProductId};

/// One product's entry in the cart: the product's display fields plus a
/// quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    /// A fresh line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Lines that cannot form a valid cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidLine {
    #[error("product {0} appears on more than one line")]
    Duplicate(ProductId),
    #[error("product {0} has quantity 0")]
    ZeroQuantity(ProductId),
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// Result of [`Cart::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// No line with that id.
    Missing,
    /// The line now has this quantity.
    Updated(u32),
    /// The quantity dropped to zero or below and the line was removed.
    Removed,
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from existing lines, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLine`] for the first line that repeats an id, has a
    /// zero quantity or a negative price.
    pub fn from_lines(lines: Vec<CartLine>) -> Result<Self, InvalidLine> {
        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if !seen.insert(line.id) {
                return Err(InvalidLine::Duplicate(line.id));
            }
            if line.quantity == 0 {
                return Err(InvalidLine::ZeroQuantity(line.id));
            }
            if line.price.is_negative() {
                return Err(InvalidLine::NegativePrice(line.id));
            }
        }
        Ok(Self { lines })
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `product`, appending a new line if needed.
    ///
    /// Returns the line's quantity afterwards.
    pub fn add(&mut self, product: &Product) -> u32 {
        if let Some(line) = self.lines.iter_mut().find(|line| line.id == product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity;
        }
        self.lines.push(CartLine::from_product(product));
        1
    }

    /// Shift a line's quantity by `delta`, removing it at zero or below.
    pub fn update_quantity(&mut self, id: ProductId, delta: i32) -> QuantityChange {
        let Some(line) = self.lines.iter_mut().find(|line| line.id == id) else {
            return QuantityChange::Missing;
        };

        let next = i64::from(line.quantity) + i64::from(delta);
        if next <= 0 {
            self.remove(id);
            return QuantityChange::Removed;
        }

        line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        QuantityChange::Updated(line.quantity)
    }

    /// Drop the line for `id`. Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total quantity across all lines (the badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }
}
