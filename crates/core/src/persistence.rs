//! Persisted cart schema and the storage slot seam.
//!
//! The cart is stored as JSON text in a single named slot:
//!
//! ```json
//! {"version": 1, "lines": [{"id": 1, "name": "...", "price": "599000", "image": "...", "quantity": 2}]}
//! ```
//!
//! A bare array of lines (the unversioned format written by the previous
//! widget, prices as JSON numbers) is still accepted on load and upgraded to
//! the versioned format on the next save.

use std::collections::HashMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLine, InvalidLine};

/// Name of the slot holding the serialized cart.
pub const CART_SLOT: &str = "cart";

/// Current schema version written by [`encode_cart`].
pub const SCHEMA_VERSION: u32 = 1;

/// Why a stored cart was rejected.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The text is not JSON of the expected shape.
    #[error("stored cart is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The payload was written by a schema this build does not understand.
    #[error("stored cart has unsupported schema version {0}")]
    UnsupportedVersion(u32),
    /// The lines parse but break a cart invariant.
    #[error("stored cart is invalid: {0}")]
    InvalidLine(#[from] InvalidLine),
}

#[derive(Serialize)]
struct VersionedRef<'a> {
    version: u32,
    lines: &'a [CartLine],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned { version: u32, lines: Vec<CartLine> },
    Legacy(Vec<CartLine>),
}

/// Serialize a cart in the current schema.
///
/// # Errors
///
/// Returns the underlying `serde_json` error if serialization fails.
pub fn encode_cart(cart: &Cart) -> Result<String, serde_json::Error> {
    serde_json::to_string(&VersionedRef {
        version: SCHEMA_VERSION,
        lines: cart.lines(),
    })
}

/// Parse and validate a stored cart.
///
/// # Errors
///
/// Returns [`LoadError`] if the text does not parse, names an unknown schema
/// version, or contains lines that break the cart invariants.
pub fn decode_cart(text: &str) -> Result<Cart, LoadError> {
    let lines = match serde_json::from_str::<StoredCart>(text)? {
        StoredCart::Versioned { version, lines } if version == SCHEMA_VERSION => lines,
        StoredCart::Versioned { version, .. } => {
            return Err(LoadError::UnsupportedVersion(version));
        }
        StoredCart::Legacy(lines) => lines,
    };
    Ok(Cart::from_lines(lines)?)
}

/// A key-value store of named text slots.
///
/// The cart only ever uses [`CART_SLOT`]; the slot name is a parameter so
/// one store can back several independent values.
pub trait CartStorage {
    /// Error raised by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a slot. `Ok(None)` means the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the slot cannot be read.
    fn read(&self, slot: &str) -> Result<Option<String>, Self::Error>;

    /// Replace a slot's contents.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the slot cannot be written.
    fn write(&mut self, slot: &str, value: String) -> Result<(), Self::Error>;
}

/// In-process storage backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage with one slot already filled.
    #[must_use]
    pub fn with_slot(slot: &str, value: impl Into<String>) -> Self {
        let mut storage = Self::new();
        storage.slots.insert(slot.to_string(), value.into());
        storage
    }

    /// Current contents of a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    type Error = Infallible;

    fn read(&self, slot: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.slots.get(slot).cloned())
    }

    fn write(&mut self, slot: &str, value: String) -> Result<(), Self::Error> {
        self.slots.insert(slot.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{Catalog, Price, ProductId};

    fn sample_cart() -> Cart {
        let catalog = Catalog::storefront();
        let mut cart = Cart::new();
        for id in [2, 1, 2, 5] {
            cart.add(catalog.find(ProductId::new(id)).unwrap());
        }
        cart
    }

    #[test]
    fn test_encode_then_decode_preserves_lines_and_order() {
        let cart = sample_cart();
        let restored = decode_cart(&encode_cart(&cart).unwrap()).unwrap();
        assert_eq!(restored, cart);
        let ids: Vec<i32> = restored.lines().iter().map(|l| l.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1, 5]);
    }

    #[test]
    fn test_encode_writes_version_tag() {
        let json: serde_json::Value =
            serde_json::from_str(&encode_cart(&Cart::new()).unwrap()).unwrap();
        assert_eq!(json["version"], SCHEMA_VERSION);
        assert_eq!(json["lines"], serde_json::json!([]));
    }

    #[test]
    fn test_decode_legacy_array() {
        let legacy = r#"[{"id":1,"name":"Áo sơ mi nam cao cấp","price":599000,
            "image":"images/products/shirt1.jpg","category":"men","quantity":2}]"#;
        let cart = decode_cart(legacy).unwrap();
        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.price, Price::from_units(599_000));
        assert_eq!(line.image, "images/products/shirt1.jpg");
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let result = decode_cart(r#"{"version": 7, "lines": []}"#);
        assert!(matches!(result, Err(LoadError::UnsupportedVersion(7))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_cart("not json"), Err(LoadError::Malformed(_))));
        assert!(matches!(
            decode_cart(r#"{"lines": "nope"}"#),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            decode_cart(r#"[{"id": 1}]"#),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_parseable_but_invalid_lines() {
        let zero = r#"{"version":1,"lines":[{"id":1,"name":"x","price":"1","image":"","quantity":0}]}"#;
        assert!(matches!(
            decode_cart(zero),
            Err(LoadError::InvalidLine(InvalidLine::ZeroQuantity(_)))
        ));

        let negative_quantity =
            r#"{"version":1,"lines":[{"id":1,"name":"x","price":"1","image":"","quantity":-3}]}"#;
        assert!(matches!(
            decode_cart(negative_quantity),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.read(CART_SLOT).unwrap(), None);
        storage.write(CART_SLOT, "[]".to_string()).unwrap();
        assert_eq!(storage.read(CART_SLOT).unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.get(CART_SLOT), Some("[]"));
    }
}
