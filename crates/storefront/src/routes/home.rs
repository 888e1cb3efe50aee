//! Home page route handler: the catalog grid.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use shopcart_core::{Catalog, Product};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::services::CartSession;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub category: &'static str,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.image.clone(),
            category: product.category.as_str(),
        }
    }
}

/// Render the catalog into grid cards, in catalog order.
#[must_use]
pub fn product_grid(catalog: &Catalog) -> Vec<ProductView> {
    catalog.products().iter().map(ProductView::from).collect()
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    /// Badge count, read by the shared cart count partial.
    pub count: u32,
    pub oob: bool,
}

/// Display the product grid.
///
/// A fresh page has no modal in it, so the tracked modal state is reset to
/// closed to match.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let mut cart = CartSession::load(&state, session).await?;
    cart.manager().close_modal();
    let snapshot = cart.commit().await?;

    Ok(HomeTemplate {
        products: product_grid(state.catalog()),
        count: snapshot.cart.item_count(),
        oob: false,
    })
}
