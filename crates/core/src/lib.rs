//! Shopcart Core - catalog, cart state and persistence.
//!
//! This crate holds everything about the cart that does not need a web
//! server:
//! - [`types`] - Newtype ids, prices and catalog products
//! - [`catalog`] - The static product catalog
//! - [`cart`] - Pure cart state transitions
//! - [`persistence`] - The versioned storage format and the storage seam
//! - [`notify`] - Shopper notifications and the notifier seam
//! - [`manager`] - [`CartManager`], tying the above together
//!
//! # Architecture
//!
//! The core crate does no I/O of its own. Storage and notifications are
//! traits implemented by the caller, which keeps the cart testable without a
//! browser or a session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod manager;
pub mod notify;
pub mod persistence;
pub mod types;

pub use cart::{Cart, CartLine, InvalidLine, QuantityChange};
pub use catalog::{Catalog, CatalogError};
pub use manager::{CartError, CartManager, CheckoutOutcome, LoadOutcome, ModalState};
pub use notify::{Notice, NoticeLog, Notifier, Severity};
pub use persistence::{
    CART_SLOT, CartStorage, LoadError, MemoryStorage, SCHEMA_VERSION, decode_cart, encode_cart,
};
pub use types::*;
