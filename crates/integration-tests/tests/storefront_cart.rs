//! End-to-end cart flows against a live storefront.
//!
//! Each test boots its own server on an ephemeral port; nothing external is
//! required.

use reqwest::{Client, StatusCode, header};
use shopcart_core::{Catalog, Price, ProductId};
use shopcart_integration_tests::{TestContext, hx_trigger, parse_badge};

fn product_name(id: i32) -> String {
    Catalog::storefront()
        .find(ProductId::new(id))
        .map(|p| p.name.clone())
        .expect("Product missing from catalog")
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_home_lists_every_product() {
    let ctx = TestContext::new().await;
    let resp = ctx.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("Failed to read body");
    let catalog = Catalog::storefront();
    for product in catalog.products() {
        assert!(body.contains(&product.name), "missing {}", product.name);
        assert!(body.contains(&product.price.to_string()));
    }
    assert_eq!(body.matches("Thêm vào giỏ").count(), catalog.len());
    assert_eq!(parse_badge(&body), 0);
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let resp = ctx.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

// ============================================================================
// Adding
// ============================================================================

#[tokio::test]
async fn test_add_same_product_twice_merges_line() {
    let ctx = TestContext::new().await;

    let first = ctx.add("1").await;
    let trigger = hx_trigger(&first).expect("add should announce itself");
    assert_eq!(trigger["cart-updated"]["count"], 1);
    assert_eq!(
        trigger["cart:notice"]["message"],
        format!("Đã thêm {} vào giỏ hàng", product_name(1))
    );
    assert_eq!(parse_badge(&first.text().await.expect("body")), 1);

    ctx.add("1").await;
    assert_eq!(ctx.badge_count().await, 2);

    let modal = ctx.get("/cart/modal").await.text().await.expect("body");
    assert_eq!(modal.matches("class=\"cart-item\"").count(), 1);
    assert!(modal.contains("Tổng cộng: 1.198.000\u{a0}₫"));
}

#[tokio::test]
async fn test_add_distinct_products_keeps_insertion_order() {
    let ctx = TestContext::new().await;
    ctx.add("3").await;
    ctx.add("1").await;
    ctx.add("3").await;

    let modal = ctx.get("/cart/modal").await.text().await.expect("body");
    let jeans = modal.find(&product_name(3)).expect("jeans listed");
    let shirt = modal.find(&product_name(1)).expect("shirt listed");
    assert!(jeans < shirt);

    let expected = Price::from_units(749_000) * 2 + Price::from_units(599_000);
    assert!(modal.contains(&format!("Tổng cộng: {expected}")));
    assert_eq!(ctx.badge_count().await, 3);
}

#[tokio::test]
async fn test_add_unknown_product_is_silent() {
    let ctx = TestContext::new().await;
    let resp = ctx.add("42").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(hx_trigger(&resp).is_none());
    assert_eq!(ctx.badge_count().await, 0);
}

#[tokio::test]
async fn test_add_without_product_id_is_rejected() {
    let ctx = TestContext::new().await;
    let resp = ctx.post("/cart/add", &[]).await;
    assert!(resp.status().is_client_error());
    assert_eq!(ctx.badge_count().await, 0);
}

// ============================================================================
// Quantities and removal
// ============================================================================

#[tokio::test]
async fn test_decrement_walks_down_to_empty() {
    let ctx = TestContext::new().await;
    ctx.add("1").await;
    ctx.add("1").await;
    ctx.get("/cart/modal").await;

    let resp = ctx
        .post("/cart/update", &[("product_id", "1"), ("delta", "-1")])
        .await;
    assert_eq!(hx_trigger(&resp).expect("trigger")["cart-updated"]["count"], 1);
    let body = resp.text().await.expect("body");
    assert!(body.contains("Tổng cộng: 599.000\u{a0}₫"));

    let resp = ctx
        .post("/cart/update", &[("product_id", "1"), ("delta", "-1")])
        .await;
    let body = resp.text().await.expect("body");
    assert!(body.contains("Giỏ hàng của bạn đang trống"));
    assert!(body.contains("Tổng cộng: 0\u{a0}₫"));
    assert_eq!(parse_badge(&body), 0);
}

#[tokio::test]
async fn test_increment_from_modal() {
    let ctx = TestContext::new().await;
    ctx.add("6").await;
    let resp = ctx
        .post("/cart/update", &[("product_id", "6"), ("delta", "1")])
        .await;
    assert_eq!(hx_trigger(&resp).expect("trigger")["cart-updated"]["count"], 2);
}

#[tokio::test]
async fn test_update_absent_line_changes_nothing() {
    let ctx = TestContext::new().await;
    ctx.add("1").await;
    let resp = ctx
        .post("/cart/update", &[("product_id", "2"), ("delta", "1")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(hx_trigger(&resp).is_none());
    assert_eq!(ctx.badge_count().await, 1);
}

#[tokio::test]
async fn test_remove_drops_whole_line() {
    let ctx = TestContext::new().await;
    ctx.add("2").await;
    ctx.add("2").await;
    ctx.add("4").await;

    let resp = ctx.post("/cart/remove", &[("product_id", "2")]).await;
    assert_eq!(hx_trigger(&resp).expect("trigger")["cart-updated"]["count"], 1);

    let modal = ctx.get("/cart/modal").await.text().await.expect("body");
    assert!(!modal.contains(&product_name(2)));
    assert!(modal.contains(&product_name(4)));
}

#[tokio::test]
async fn test_remove_absent_line_is_harmless() {
    let ctx = TestContext::new().await;
    ctx.add("1").await;
    let resp = ctx.post("/cart/remove", &[("product_id", "5")]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.badge_count().await, 1);
}

// ============================================================================
// Modal
// ============================================================================

#[tokio::test]
async fn test_modal_open_and_close() {
    let ctx = TestContext::new().await;
    ctx.add("5").await;

    let modal = ctx.get("/cart/modal").await.text().await.expect("body");
    assert!(modal.contains("Giỏ Hàng Của Bạn"));
    assert!(modal.contains("Thanh Toán"));
    assert!(modal.contains(&product_name(5)));

    // Reopening renders one modal, never two
    let again = ctx.get("/cart/modal").await.text().await.expect("body");
    assert_eq!(again.matches("data-cart-overlay").count(), 1);

    let closed = ctx.post("/cart/modal/close", &[]).await;
    assert_eq!(closed.status(), StatusCode::OK);
    assert!(closed.text().await.expect("body").is_empty());

    let add = ctx.add("5").await.text().await.expect("body");
    assert!(!add.contains("cart-modal-body"));
}

#[tokio::test]
async fn test_page_load_closes_modal() {
    let ctx = TestContext::new().await;
    ctx.get("/cart/modal").await;
    ctx.get("/").await;

    let add = ctx.add("1").await.text().await.expect("body");
    assert!(!add.contains("cart-modal-body"));
}

#[tokio::test]
async fn test_empty_modal_shows_placeholder() {
    let ctx = TestContext::new().await;
    let modal = ctx.get("/cart/modal").await.text().await.expect("body");
    assert!(modal.contains("Giỏ hàng của bạn đang trống"));
    assert!(modal.contains("Tổng cộng: 0\u{a0}₫"));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_empty_cart() {
    let ctx = TestContext::new().await;
    let resp = ctx.post("/checkout", &[]).await;
    let trigger = hx_trigger(&resp).expect("checkout should alert");
    assert_eq!(trigger["cart:alert"]["message"], "Giỏ hàng của bạn đang trống!");
    assert!(trigger.get("cart-updated").is_none());
}

#[tokio::test]
async fn test_checkout_keeps_cart_intact() {
    let ctx = TestContext::new().await;
    ctx.add("4").await;
    ctx.add("4").await;

    let resp = ctx.post("/checkout", &[]).await;
    assert_eq!(
        hx_trigger(&resp).expect("trigger")["cart:alert"]["message"],
        "Chức năng thanh toán đang được phát triển!"
    );
    assert_eq!(ctx.badge_count().await, 2);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_cart_survives_restart_with_same_store() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client");

    let first = TestContext::with_store_and_client(Default::default(), client.clone()).await;
    first.add("1").await;
    first.add("2").await;
    let store = first.store();
    drop(first);

    let second = TestContext::with_store_and_client(store, client).await;
    assert_eq!(second.badge_count().await, 2);
    let modal = second.get("/cart/modal").await.text().await.expect("body");
    assert!(modal.contains(&product_name(1)));
    assert!(modal.contains(&product_name(2)));
}

#[tokio::test]
async fn test_shoppers_do_not_share_carts() {
    let alice = TestContext::new().await;
    alice.add("1").await;

    let bob = TestContext::with_store(alice.store()).await;
    assert_eq!(bob.badge_count().await, 0);
    assert_eq!(alice.badge_count().await, 1);
}

#[tokio::test]
async fn test_tampered_cookie_starts_fresh() {
    let ctx = TestContext::new().await;
    let raw = Client::new();
    let resp = raw
        .get(ctx.url("/cart/count"))
        .header(header::COOKIE, "shopcart_session=forged-value")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(parse_badge(&resp.text().await.expect("body")), 0);
}

#[tokio::test]
async fn test_session_cookie_is_http_only() {
    let ctx = TestContext::new().await;
    let resp = ctx.add("1").await;
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("add should start a session")
        .to_string();
    assert!(cookie.starts_with("shopcart_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}
