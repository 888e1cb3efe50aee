//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Product category, used to group the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Men,
    Women,
    Kids,
    Accessories,
}

impl Category {
    /// The lowercase wire name, also used as a CSS modifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Kids => "kids",
            Self::Accessories => "accessories",
        }
    }
}

/// A purchasable product. Defined once in the static catalog, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Image URL, relative to the site root or absolute.
    pub image: String,
    pub category: Category,
}
