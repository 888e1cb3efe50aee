//! Shopper-facing notifications raised by the cart.
//!
//! The cart decides *what* to tell the shopper; a [`Notifier`] decides how it
//! is shown. Transient notices disappear on their own, blocking ones need the
//! shopper to acknowledge them.

use core::fmt;

/// Something the cart wants the shopper to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A product was added to the cart.
    Added { product_name: String },
    /// Checkout was attempted with nothing in the cart.
    CheckoutEmpty,
    /// Checkout is not available yet.
    CheckoutUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { product_name } => write!(f, "Đã thêm {product_name} vào giỏ hàng"),
            Self::CheckoutEmpty => f.write_str("Giỏ hàng của bạn đang trống!"),
            Self::CheckoutUnavailable => f.write_str("Chức năng thanh toán đang được phát triển!"),
        }
    }
}

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Transient,
    Blocking,
}

/// The presentation surface for notices.
pub trait Notifier {
    /// Show a message that dismisses itself.
    fn transient(&mut self, notice: Notice);

    /// Show a message the shopper must acknowledge.
    fn blocking(&mut self, notice: Notice);
}

/// A notifier that records notices in the order they were raised.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    entries: Vec<(Severity, Notice)>,
}

impl NoticeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded notices, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[(Severity, Notice)] {
        &self.entries
    }

    /// Take all recorded notices, leaving the log empty.
    pub fn drain(&mut self) -> Vec<(Severity, Notice)> {
        std::mem::take(&mut self.entries)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Notifier for NoticeLog {
    fn transient(&mut self, notice: Notice) {
        self.entries.push((Severity::Transient, notice));
    }

    fn blocking(&mut self, notice: Notice) {
        self.entries.push((Severity::Blocking, notice));
    }
}
