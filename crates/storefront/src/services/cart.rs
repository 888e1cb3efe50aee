//! Session-backed cart service.
//!
//! Each request builds a [`CartManager`] over a snapshot of the shopper's
//! session slots, runs one operation against it, and then writes whatever
//! the manager stored back into the session. The manager itself stays
//! synchronous; only loading and committing touch the async session store.

use std::collections::HashMap;
use std::convert::Infallible;

use shopcart_core::{
    Cart, CartManager, CartStorage, ModalState, Notice, NoticeLog, Severity,
};
use tower_sessions::Session;

use crate::error::Result;
use crate::models::session_keys;
use crate::state::AppState;

/// Session slots read at the start of a request, plus pending writes.
#[derive(Debug, Default)]
pub struct SessionSlots {
    loaded: HashMap<String, String>,
    pending: HashMap<String, String>,
}

impl SessionSlots {
    /// Read `slots` from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn prefetch(session: &Session, slots: &[&str]) -> Result<Self> {
        let mut loaded = HashMap::with_capacity(slots.len());
        for slot in slots {
            if let Some(value) = session.get::<String>(slot).await? {
                loaded.insert((*slot).to_string(), value);
            }
        }
        Ok(Self {
            loaded,
            pending: HashMap::new(),
        })
    }

    /// Whether anything was written since the prefetch.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Pending writes.
    pub fn into_pending(self) -> HashMap<String, String> {
        self.pending
    }
}

impl CartStorage for SessionSlots {
    type Error = Infallible;

    fn read(&self, slot: &str) -> std::result::Result<Option<String>, Self::Error> {
        Ok(self
            .pending
            .get(slot)
            .or_else(|| self.loaded.get(slot))
            .cloned())
    }

    fn write(&mut self, slot: &str, value: String) -> std::result::Result<(), Self::Error> {
        self.pending.insert(slot.to_string(), value);
        Ok(())
    }
}

/// The manager type used by request handlers.
pub type SessionCartManager = CartManager<SessionSlots, NoticeLog>;

/// State handed back to the view layer after a request's operation.
#[derive(Debug)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub modal: ModalState,
    pub notices: Vec<(Severity, Notice)>,
    /// Whether the cart slot was written during the request.
    pub mutated: bool,
}

/// A shopper's cart for the duration of one request.
pub struct CartSession {
    session: Session,
    manager: SessionCartManager,
    initial_modal: ModalState,
}

impl CartSession {
    /// Restore the shopper's cart and modal state from their session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read. A stored cart
    /// that fails validation is not an error; the shopper starts empty.
    pub async fn load(state: &AppState, session: Session) -> Result<Self> {
        let slots = SessionSlots::prefetch(&session, &[session_keys::CART]).await?;
        let modal = ModalState::from(
            session
                .get::<bool>(session_keys::CART_MODAL_OPEN)
                .await?
                .unwrap_or(false),
        );

        let manager =
            CartManager::load(state.catalog_handle(), slots, NoticeLog::new()).with_modal(modal);

        Ok(Self {
            session,
            manager,
            initial_modal: modal,
        })
    }

    /// The manager, for running cart operations.
    pub fn manager(&mut self) -> &mut SessionCartManager {
        &mut self.manager
    }

    /// Write pending slots and modal state back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects a write.
    pub async fn commit(self) -> Result<CartSnapshot> {
        let cart = self.manager.cart().clone();
        let (slots, mut notices, modal) = self.manager.into_parts();
        let mutated = slots.is_dirty();

        for (slot, value) in slots.into_pending() {
            self.session.insert(&slot, value).await?;
        }
        if modal != self.initial_modal {
            self.session
                .insert(session_keys::CART_MODAL_OPEN, modal.is_open())
                .await?;
        }

        Ok(CartSnapshot {
            cart,
            modal,
            notices: notices.drain(),
            mutated,
        })
    }
}
