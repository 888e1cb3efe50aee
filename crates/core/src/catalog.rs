//! The static product catalog.
//!
//! The catalog is read-only: it is built once at startup and shared by every
//! request. Cart lines copy the display fields they need, so nothing holds a
//! reference into it beyond the lookup in [`Catalog::find`].

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Category, Price, Product, ProductId};

/// Errors that can occur when building a [`Catalog`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two products share an id.
    #[error("duplicate product id {0}")]
    DuplicateId(ProductId),
    /// A product has a negative price.
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// An ordered list of products, unique by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and negative prices.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any id repeats or any price is negative.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
            if product.price.is_negative() {
                return Err(CatalogError::NegativePrice(product.id));
            }
        }
        Ok(Self { products })
    }

    /// The hardcoded storefront catalog.
    #[must_use]
    pub fn storefront() -> Self {
        let product = |id: i32, name: &str, price: i64, image: &str, category: Category| Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Price::new(Decimal::from(price)),
            image: format!("/static/images/products/{image}"),
            category,
        };

        Self {
            products: vec![
                product(1, "Áo sơ mi nam cao cấp", 599_000, "shirt1.svg", Category::Men),
                product(2, "Váy liền nữ công sở", 899_000, "dress1.svg", Category::Women),
                product(3, "Quần jeans nam slim fit", 749_000, "jeans1.svg", Category::Men),
                product(4, "Áo khoác nữ dáng dài", 1_290_000, "coat1.svg", Category::Women),
                product(5, "Bộ đồ bé trai mùa hè", 349_000, "kids1.svg", Category::Kids),
                product(6, "Túi xách da thời trang", 990_000, "bag1.svg", Category::Accessories),
            ],
        }
    }

    /// Look up a product by id.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// All products, in display order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
