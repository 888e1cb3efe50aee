//! Business logic services for storefront.
//!
//! # Services
//!
//! - [`cart`] - Loading a shopper's cart from their session and saving it back

pub mod cart;

pub use cart::{CartSession, CartSnapshot, SessionCartManager, SessionSlots};
