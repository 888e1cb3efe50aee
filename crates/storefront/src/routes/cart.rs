//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Mutations answer with out-of-band fragments: the badge always, and the
//! modal body and total when the modal is open. Notices for the shopper
//! travel in the `HX-Trigger` header and are shown by `static/js/cart.js`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use shopcart_core::{Cart, CartLine, ProductId, Severity};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::services::{CartSession, CartSnapshot};
use crate::state::AppState;

/// Response header HTMX reads client-side events from.
pub const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Event raised after the cart slot changed. Detail: `{"count": n}`.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Event for a transient notice. Detail: `{"message": "..."}`.
pub const NOTICE_EVENT: &str = "cart:notice";

/// Event for a blocking notice. Detail: `{"message": "..."}`.
pub const ALERT_EVENT: &str = "cart:alert";

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            image: line.image.clone(),
            quantity: line.quantity,
            price: line.price.to_string(),
            line_price: line.line_total().to_string(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            total: cart.total().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Form data naming a single product.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_id: ProductId,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub delta: i32,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
    pub oob: bool,
}

/// Cart modal fragment, swapped into `#cart-modal-root`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_modal.html")]
pub struct CartModalTemplate {
    pub cart: CartView,
    pub oob: bool,
}

/// Out-of-band refresh after a mutation.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_refresh.html")]
pub struct CartRefreshTemplate {
    pub cart: CartView,
    pub count: u32,
    pub modal_open: bool,
    pub oob: bool,
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Build the `HX-Trigger` payload for a snapshot, if there is anything to
/// announce.
fn hx_trigger(snapshot: &CartSnapshot) -> Option<HeaderValue> {
    let mut events = Map::new();
    if snapshot.mutated {
        events.insert(
            CART_UPDATED_EVENT.to_string(),
            json!({ "count": snapshot.cart.item_count() }),
        );
    }
    for (severity, notice) in &snapshot.notices {
        let event = match severity {
            Severity::Transient => NOTICE_EVENT,
            Severity::Blocking => ALERT_EVENT,
        };
        events.insert(event.to_string(), json!({ "message": notice.to_string() }));
    }
    if events.is_empty() {
        return None;
    }

    let payload = ascii_json(&Value::Object(events));
    match HeaderValue::from_str(&payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Failed to build HX-Trigger header: {e}");
            None
        }
    }
}

/// Serialize JSON with every non-ASCII character written as a `\u` escape,
/// since header values must be ASCII.
fn ascii_json(value: &Value) -> String {
    let raw = value.to_string();
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    escaped
}

fn with_trigger(mut response: Response, snapshot: &CartSnapshot) -> Response {
    if let Some(value) = hx_trigger(snapshot) {
        response.headers_mut().insert(HX_TRIGGER, value);
    }
    response
}

/// Badge plus, when the modal is open, its body and total.
fn refresh_response(snapshot: &CartSnapshot) -> Response {
    let template = CartRefreshTemplate {
        cart: CartView::from(&snapshot.cart),
        count: snapshot.cart.item_count(),
        modal_open: snapshot.modal.is_open(),
        oob: true,
    };
    with_trigger(template.into_response(), snapshot)
}

// =============================================================================
// Handlers
// =============================================================================

/// Add one unit of a product (HTMX).
///
/// Unknown products leave the cart untouched and answer with the current
/// badge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let mut cart = CartSession::load(&state, session).await?;
    if cart.manager().add_to_cart(form.product_id)?.is_some() {
        let id = form.product_id.to_string();
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
    }
    let snapshot = cart.commit().await?;
    Ok(refresh_response(&snapshot))
}

/// Shift a line's quantity (HTMX).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = CartSession::load(&state, session).await?;
    cart.manager()
        .update_quantity(form.product_id, form.delta)?;
    let snapshot = cart.commit().await?;
    Ok(refresh_response(&snapshot))
}

/// Remove a line (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let mut cart = CartSession::load(&state, session).await?;
    cart.manager().remove_from_cart(form.product_id)?;
    let snapshot = cart.commit().await?;
    Ok(refresh_response(&snapshot))
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let mut cart = CartSession::load(&state, session).await?;
    let count = cart.manager().badge_count();
    // Persists the reset of a slot that failed to load.
    cart.commit().await?;
    Ok(CartCountTemplate { count, oob: false })
}

/// Open the cart modal (HTMX).
///
/// The fragment replaces the contents of `#cart-modal-root`, so opening an
/// already open modal re-renders it instead of stacking a second one.
#[instrument(skip(state, session))]
pub async fn show_modal(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut cart = CartSession::load(&state, session).await?;
    cart.manager().show_modal();
    let snapshot = cart.commit().await?;
    let template = CartModalTemplate {
        cart: CartView::from(&snapshot.cart),
        oob: false,
    };
    Ok(template.into_response())
}

/// Close the cart modal (HTMX). Answers with an empty fragment.
#[instrument(skip(state, session))]
pub async fn close_modal(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut cart = CartSession::load(&state, session).await?;
    cart.manager().close_modal();
    cart.commit().await?;
    Ok(Html("").into_response())
}

/// Checkout stub (HTMX).
///
/// Never changes the cart; the outcome reaches the shopper as a blocking
/// notice.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut cart = CartSession::load(&state, session).await?;
    let outcome = cart.manager().checkout();
    tracing::info!(?outcome, "checkout requested");
    let snapshot = cart.commit().await?;
    Ok(with_trigger(Html("").into_response(), &snapshot))
}
