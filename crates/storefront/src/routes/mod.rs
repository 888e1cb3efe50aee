//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog grid
//! GET  /health                 - Health check
//!
//! # Cart (HTMX fragments)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/modal             - Open the cart modal (fragment)
//! POST /cart/modal/close       - Close the cart modal (empty fragment)
//! POST /cart/add               - Add to cart (OOB refresh, triggers cart-updated)
//! POST /cart/update            - Shift quantity (OOB refresh)
//! POST /cart/remove            - Remove line (OOB refresh)
//!
//! # Checkout
//! POST /checkout               - Checkout stub (blocking notice via HX-Trigger)
//! ```

pub mod cart;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/count", get(cart::count))
        .route("/modal", get(cart::show_modal))
        .route("/modal/close", post(cart::close_modal))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
}
