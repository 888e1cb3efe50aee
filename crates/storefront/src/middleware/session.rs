//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session cookie is
//! signed with a key derived from `STOREFRONT_SESSION_SECRET`.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopcart_session";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// # Arguments
///
/// * `store` - Session store shared by every request
/// * `config` - Storefront configuration (for signing secret and expiry)
#[must_use]
pub fn create_session_layer(
    store: MemoryStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            config.session_expiry_days.saturating_mul(SECONDS_PER_DAY),
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config.session_secret.expose_secret()))
}

/// Derive a 64-byte cookie signing key from the configured secret.
fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_deterministic() {
        let a = signing_key("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6");
        let b = signing_key("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6");
        let c = signing_key("a-different-high-entropy-value!!");
        assert_eq!(a.signing(), b.signing());
        assert_ne!(a.signing(), c.signing());
    }
}
