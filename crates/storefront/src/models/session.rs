//! Session-related types.
//!
//! The shopper's session is the cart's storage: one slot for the serialized
//! cart and one flag for whether the cart modal is open.

/// Session keys for cart data.
pub mod keys {
    /// Key holding the serialized cart (same name as the core slot).
    pub const CART: &str = shopcart_core::CART_SLOT;

    /// Key for whether the cart modal is currently open.
    pub const CART_MODAL_OPEN: &str = "cart_modal_open";
}
