//! The cart state manager.
//!
//! [`CartManager`] owns one shopper's [`Cart`] together with the storage
//! slot it is persisted to, the notifier used to talk to the shopper, and
//! whether the cart modal is open. Every mutation persists before
//! returning.
//!
//! The manager is built explicitly from its collaborators and handed to
//! whatever needs it; there is no global instance.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cart::{Cart, QuantityChange};
use crate::catalog::Catalog;
use crate::notify::{Notice, Notifier};
use crate::persistence::{CART_SLOT, CartStorage, decode_cart, encode_cart};
use crate::types::{Price, ProductId};

/// Errors raised while persisting the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart could not be serialized.
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
    /// The storage backend refused the write.
    #[error("failed to write cart slot: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// What the constructor found in the storage slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The slot was empty; the cart starts empty.
    Empty,
    /// The stored cart was valid and restored.
    Restored { lines: usize },
    /// The slot could not be read or failed validation; the cart starts
    /// empty and the slot is overwritten on the next save.
    Discarded { reason: String },
}

/// Whether the cart modal is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open,
}

impl ModalState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl From<bool> for ModalState {
    fn from(open: bool) -> Self {
        if open { Self::Open } else { Self::Closed }
    }
}

/// Result of [`CartManager::checkout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Nothing to check out.
    EmptyCart,
    /// Checkout is a stub; the cart is left as is.
    NotImplemented,
}

/// Owns a cart and keeps its storage slot in sync.
pub struct CartManager<S, N> {
    catalog: Arc<Catalog>,
    cart: Cart,
    storage: S,
    notifier: N,
    modal: ModalState,
    loaded: LoadOutcome,
}

impl<S, N> CartManager<S, N>
where
    S: CartStorage,
    N: Notifier,
{
    /// Restore the cart from `storage`, starting empty if the slot is absent
    /// or does not hold a valid cart.
    ///
    /// A discarded slot is overwritten with the empty cart straight away, so
    /// later loads find a valid slot.
    pub fn load(catalog: Arc<Catalog>, storage: S, notifier: N) -> Self {
        let (cart, loaded) = match storage.read(CART_SLOT) {
            Ok(None) => (Cart::new(), LoadOutcome::Empty),
            Ok(Some(text)) => match decode_cart(&text) {
                Ok(cart) => {
                    let lines = cart.len();
                    (cart, LoadOutcome::Restored { lines })
                }
                Err(e) => {
                    warn!(error = %e, "discarding stored cart");
                    (
                        Cart::new(),
                        LoadOutcome::Discarded {
                            reason: e.to_string(),
                        },
                    )
                }
            },
            Err(e) => {
                warn!(error = %e, "cart slot unreadable, starting empty");
                (
                    Cart::new(),
                    LoadOutcome::Discarded {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let mut manager = Self {
            catalog,
            cart,
            storage,
            notifier,
            modal: ModalState::Closed,
            loaded,
        };
        if matches!(manager.loaded, LoadOutcome::Discarded { .. }) {
            if let Err(e) = manager.save_cart() {
                warn!(error = %e, "could not reset discarded cart slot");
            }
        }
        manager
    }

    /// Restore the modal state tracked by the view layer.
    #[must_use]
    pub fn with_modal(mut self, modal: ModalState) -> Self {
        self.modal = modal;
        self
    }

    /// Add one unit of a catalog product.
    ///
    /// Unknown ids are ignored and return `Ok(None)`. Otherwise returns the
    /// line's new quantity after persisting and notifying the shopper.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the cart cannot be persisted.
    pub fn add_to_cart(&mut self, id: ProductId) -> Result<Option<u32>, CartError> {
        let Some(product) = self.catalog.find(id) else {
            debug!(product_id = %id, "add_to_cart: unknown product");
            return Ok(None);
        };

        let quantity = self.cart.add(product);
        let product_name = product.name.clone();
        debug!(product_id = %id, quantity, "added to cart");

        self.save_cart()?;
        self.notifier.transient(Notice::Added { product_name });
        Ok(Some(quantity))
    }

    /// Shift a line's quantity by `delta`, removing the line at zero.
    ///
    /// Unknown ids are ignored and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the cart cannot be persisted.
    pub fn update_quantity(
        &mut self,
        id: ProductId,
        delta: i32,
    ) -> Result<QuantityChange, CartError> {
        let change = self.cart.update_quantity(id, delta);
        debug!(product_id = %id, delta, ?change, "update_quantity");
        if change != QuantityChange::Missing {
            self.save_cart()?;
        }
        Ok(change)
    }

    /// Drop a product's line. Returns whether a line was removed; the slot
    /// is written either way.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the cart cannot be persisted.
    pub fn remove_from_cart(&mut self, id: ProductId) -> Result<bool, CartError> {
        let removed = self.cart.remove(id);
        debug!(product_id = %id, removed, "remove_from_cart");
        self.save_cart()?;
        Ok(removed)
    }

    /// Run the checkout stub. Never changes the cart.
    pub fn checkout(&mut self) -> CheckoutOutcome {
        if self.cart.is_empty() {
            self.notifier.blocking(Notice::CheckoutEmpty);
            return CheckoutOutcome::EmptyCart;
        }
        self.notifier.blocking(Notice::CheckoutUnavailable);
        CheckoutOutcome::NotImplemented
    }

    /// Write the cart to its slot.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if encoding or the storage write fails.
    pub fn save_cart(&mut self) -> Result<(), CartError> {
        let text = encode_cart(&self.cart)?;
        self.storage
            .write(CART_SLOT, text)
            .map_err(|e| CartError::Storage(Box::new(e)))
    }
}

impl<S, N> CartManager<S, N> {
    /// Open the modal. Returns `false` if it was already open, in which case
    /// nothing changes.
    pub fn show_modal(&mut self) -> bool {
        let opened = !self.modal.is_open();
        self.modal = ModalState::Open;
        opened
    }

    /// Close the modal. Returns `false` if it was already closed.
    pub fn close_modal(&mut self) -> bool {
        let closed = self.modal.is_open();
        self.modal = ModalState::Closed;
        closed
    }

    #[must_use]
    pub const fn modal(&self) -> ModalState {
        self.modal
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn load_outcome(&self) -> &LoadOutcome {
        &self.loaded
    }

    /// Sum of `price × quantity` over the cart.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.cart.total()
    }

    /// The total formatted for display, e.g. `1.198.000 ₫`.
    #[must_use]
    pub fn formatted_total(&self) -> String {
        self.total_price().to_string()
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn badge_count(&self) -> u32 {
        self.cart.item_count()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Hand back the collaborators and the final modal state.
    pub fn into_parts(self) -> (S, N, ModalState) {
        (self.storage, self.notifier, self.modal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLog, Severity};
    use crate::persistence::MemoryStorage;

    type Manager = CartManager<MemoryStorage, NoticeLog>;

    const SHIRT: ProductId = ProductId::new(1);
    const DRESS: ProductId = ProductId::new(2);

    fn manager_with(storage: MemoryStorage) -> Manager {
        CartManager::load(Arc::new(Catalog::storefront()), storage, NoticeLog::new())
    }

    fn manager() -> Manager {
        manager_with(MemoryStorage::new())
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage;

    #[derive(Debug, Error)]
    #[error("storage is read-only")]
    struct ReadOnly;

    impl CartStorage for ReadOnlyStorage {
        type Error = ReadOnly;

        fn read(&self, _slot: &str) -> Result<Option<String>, Self::Error> {
            Ok(None)
        }

        fn write(&mut self, _slot: &str, _value: String) -> Result<(), Self::Error> {
            Err(ReadOnly)
        }
    }

    /// Storage whose reads always fail.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        type Error = ReadOnly;

        fn read(&self, _slot: &str) -> Result<Option<String>, Self::Error> {
            Err(ReadOnly)
        }

        fn write(&mut self, _slot: &str, _value: String) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_scenario_add_twice() {
        let mut cart = manager();
        assert_eq!(cart.add_to_cart(SHIRT).unwrap(), Some(1));
        assert_eq!(cart.add_to_cart(SHIRT).unwrap(), Some(2));

        assert_eq!(cart.cart().len(), 1);
        assert_eq!(cart.cart().get(SHIRT).unwrap().quantity, 2);
        assert_eq!(cart.total_price(), Price::from_units(1_198_000));
        assert_eq!(cart.formatted_total(), "1.198.000\u{a0}₫");
        assert_eq!(cart.badge_count(), 2);
    }

    #[test]
    fn test_scenario_decrement_to_removal() {
        let mut cart = manager();
        cart.add_to_cart(SHIRT).unwrap();
        cart.add_to_cart(SHIRT).unwrap();

        assert_eq!(
            cart.update_quantity(SHIRT, -1).unwrap(),
            QuantityChange::Updated(1)
        );
        assert_eq!(cart.total_price(), Price::from_units(599_000));

        assert_eq!(
            cart.update_quantity(SHIRT, -1).unwrap(),
            QuantityChange::Removed
        );
        assert!(cart.cart().is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
        assert_eq!(cart.storage().get(CART_SLOT), Some(r#"{"version":1,"lines":[]}"#));
    }

    #[test]
    fn test_add_unknown_product_is_silent() {
        let mut cart = manager();
        assert_eq!(cart.add_to_cart(ProductId::new(404)).unwrap(), None);
        assert!(cart.cart().is_empty());
        assert!(cart.notifier_mut().is_empty());
        assert_eq!(cart.storage().get(CART_SLOT), None);
    }

    #[test]
    fn test_add_raises_transient_notice() {
        let mut cart = manager();
        cart.add_to_cart(DRESS).unwrap();
        assert_eq!(
            cart.notifier_mut().entries(),
            &[(
                Severity::Transient,
                Notice::Added {
                    product_name: "Váy liền nữ công sở".to_string()
                }
            )]
        );
    }

    #[test]
    fn test_update_missing_line_does_not_persist() {
        let mut cart = manager();
        assert_eq!(
            cart.update_quantity(DRESS, 1).unwrap(),
            QuantityChange::Missing
        );
        assert_eq!(cart.storage().get(CART_SLOT), None);
    }

    #[test]
    fn test_remove_absent_id_leaves_cart_unchanged() {
        let mut cart = manager();
        cart.add_to_cart(SHIRT).unwrap();
        let before = cart.cart().clone();
        assert!(!cart.remove_from_cart(DRESS).unwrap());
        assert_eq!(cart.cart(), &before);
    }

    #[test]
    fn test_checkout_empty_cart() {
        let mut cart = manager();
        assert_eq!(cart.checkout(), CheckoutOutcome::EmptyCart);
        assert!(cart.cart().is_empty());
        assert_eq!(
            cart.notifier_mut().entries(),
            &[(Severity::Blocking, Notice::CheckoutEmpty)]
        );
    }

    #[test]
    fn test_checkout_with_items_is_stub() {
        let mut cart = manager();
        cart.add_to_cart(SHIRT).unwrap();
        cart.notifier_mut().drain();
        let before = cart.cart().clone();

        assert_eq!(cart.checkout(), CheckoutOutcome::NotImplemented);
        assert_eq!(cart.cart(), &before);
        assert_eq!(
            cart.notifier_mut().entries(),
            &[(Severity::Blocking, Notice::CheckoutUnavailable)]
        );
    }

    #[test]
    fn test_reload_restores_saved_cart() {
        let mut cart = manager();
        cart.add_to_cart(DRESS).unwrap();
        cart.add_to_cart(SHIRT).unwrap();
        cart.add_to_cart(DRESS).unwrap();
        let saved = cart.cart().clone();

        let (storage, _, _) = cart.into_parts();
        let reloaded = manager_with(storage);
        assert_eq!(reloaded.cart(), &saved);
        assert_eq!(reloaded.load_outcome(), &LoadOutcome::Restored { lines: 2 });
    }

    #[test]
    fn test_load_distinguishes_empty_from_malformed() {
        assert_eq!(manager().load_outcome(), &LoadOutcome::Empty);

        let corrupted = manager_with(MemoryStorage::with_slot(CART_SLOT, "{{{"));
        assert!(corrupted.cart().is_empty());
        assert!(matches!(
            corrupted.load_outcome(),
            LoadOutcome::Discarded { .. }
        ));
    }

    #[test]
    fn test_discarded_slot_is_reset_on_load() {
        let corrupted = manager_with(MemoryStorage::with_slot(CART_SLOT, "{{{ corrupt"));
        assert!(matches!(
            corrupted.load_outcome(),
            LoadOutcome::Discarded { .. }
        ));
        assert_eq!(
            corrupted.storage().get(CART_SLOT),
            Some(r#"{"version":1,"lines":[]}"#)
        );

        let (storage, _, _) = corrupted.into_parts();
        let reloaded = manager_with(storage);
        assert_eq!(reloaded.load_outcome(), &LoadOutcome::Restored { lines: 0 });
    }

    #[test]
    fn test_legacy_slot_is_rewritten_versioned_on_save() {
        let legacy = r#"[{"id":2,"name":"Váy liền nữ công sở","price":899000,
            "image":"images/products/dress1.jpg","category":"women","quantity":1}]"#;
        let mut cart = manager_with(MemoryStorage::with_slot(CART_SLOT, legacy));
        assert_eq!(cart.load_outcome(), &LoadOutcome::Restored { lines: 1 });

        cart.add_to_cart(SHIRT).unwrap();
        let slot = cart.storage().get(CART_SLOT).unwrap();
        assert!(slot.starts_with(r#"{"version":1"#));

        let (storage, _, _) = cart.into_parts();
        let reloaded = manager_with(storage);
        assert_eq!(reloaded.cart().get(DRESS).unwrap().quantity, 1);
        assert_eq!(reloaded.cart().get(SHIRT).unwrap().quantity, 1);
    }

    #[test]
    fn test_load_unreadable_slot_starts_empty() {
        let cart = CartManager::load(
            Arc::new(Catalog::storefront()),
            BrokenStorage,
            NoticeLog::new(),
        );
        assert!(cart.cart().is_empty());
        assert!(matches!(cart.load_outcome(), LoadOutcome::Discarded { .. }));
    }

    #[test]
    fn test_storage_failure_is_reported() {
        let mut cart = CartManager::load(
            Arc::new(Catalog::storefront()),
            ReadOnlyStorage,
            NoticeLog::new(),
        );
        assert!(matches!(
            cart.add_to_cart(SHIRT),
            Err(CartError::Storage(_))
        ));
    }

    #[test]
    fn test_modal_is_single_instance() {
        let mut cart = manager();
        assert!(!cart.modal().is_open());
        assert!(cart.show_modal());
        assert!(!cart.show_modal());
        assert!(cart.modal().is_open());

        assert!(cart.close_modal());
        assert!(!cart.close_modal());
        assert_eq!(cart.modal(), ModalState::Closed);
    }

    #[test]
    fn test_with_modal_restores_view_state() {
        let cart = manager().with_modal(ModalState::from(true));
        assert!(cart.modal().is_open());
    }
}
