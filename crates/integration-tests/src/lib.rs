//! Integration test harness for the storefront.
//!
//! [`TestContext`] binds the real router (full middleware stack, in-memory
//! session store) to an ephemeral port and drives it with a cookie-keeping
//! `reqwest` client, so each context is one shopper with one browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopcart-integration-tests
//! ```

use std::net::SocketAddr;

use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::Value;
use shopcart_storefront::{app, config::StorefrontConfig, state::AppState};
use tokio::task::JoinHandle;
use tower_sessions::MemoryStore;

/// Session secret for test servers. Passes the strength checks.
pub const TEST_SESSION_SECRET: &str = "q7Z!rV2#kP9@wM4$xT6^bN1&cL8*hJ3%";

/// Configuration for a test server on an ephemeral local port.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(TEST_SESSION_SECRET.to_string()),
        session_expiry_days: 30,
        static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running storefront plus one shopper's client.
pub struct TestContext {
    pub client: Client,
    pub addr: SocketAddr,
    store: MemoryStore,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a storefront with a fresh session store.
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::default()).await
    }

    /// Start a storefront over an existing session store.
    ///
    /// Two contexts sharing a store behave like one server restarted
    /// without losing its sessions.
    pub async fn with_store(store: MemoryStore) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self::with_store_and_client(store, client).await
    }

    /// Start a storefront over `store`, driven by an existing `client`.
    pub async fn with_store_and_client(store: MemoryStore, client: Client) -> Self {
        let router = app(AppState::new(test_config()), store.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                panic!("Test server failed: {e}");
            }
        });

        Self {
            client,
            addr,
            store,
            server,
        }
    }

    /// The session store backing this server.
    #[must_use]
    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Add one unit of `product_id`.
    pub async fn add(&self, product_id: &str) -> Response {
        self.post("/cart/add", &[("product_id", product_id)]).await
    }

    /// The badge count as rendered by `/cart/count`.
    pub async fn badge_count(&self) -> u32 {
        let body = self.get("/cart/count").await.text().await.expect("Badge body");
        parse_badge(&body)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Parsed `HX-Trigger` header, if the response carried one.
#[must_use]
pub fn hx_trigger(response: &Response) -> Option<Value> {
    response
        .headers()
        .get("hx-trigger")
        .and_then(|v| v.to_str().ok())
        .map(|v| serde_json::from_str(v).expect("HX-Trigger is not JSON"))
}

/// Extract the number inside the `#cart-count` badge.
#[must_use]
pub fn parse_badge(html: &str) -> u32 {
    html.split("id=\"cart-count\"")
        .nth(1)
        .and_then(|rest| rest.split_once('>'))
        .and_then(|(_, rest)| rest.split_once('<'))
        .map(|(count, _)| count.trim())
        .expect("No cart badge in fragment")
        .parse()
        .expect("Badge is not a number")
}
