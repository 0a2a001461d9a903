//! Error taxonomy for catalog, cart and order operations.
//!
//! Every error carries a machine-checkable [`ErrorKind`]. The HTTP layer
//! chooses status codes from the kind alone.

use crate::types::{BookId, OrderId};
use std::fmt;
use thiserror::Error;

/// Result type alias for bookshop operations.
pub type Result<T> = std::result::Result<T, ShopError>;

/// Coarse classification of a [`ShopError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Entity absent (book, category, cart, cart line).
    NotFound,
    /// Malformed input.
    Validation,
    /// Add-time rejection: the book has no stock.
    OutOfStock,
    /// Add-time rejection: the cart already holds every unit in stock.
    InsufficientStock,
    /// Checkout attempted with nothing to buy.
    EmptyCart,
    /// Checkout-time stock re-validation failed.
    Conflict,
    /// Store, cache or publisher failure.
    Infrastructure,
}

impl ErrorKind {
    /// Stable identifier used in API error bodies.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::EmptyCart => "EMPTY_CART",
            Self::Conflict => "CONFLICT",
            Self::Infrastructure => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Why a checkout could not allocate a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Other checkouts consumed the stock.
    InsufficientStock {
        /// Units in the cart line
        requested: u32,
        /// Units left at commit time
        available: u32,
    },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientStock {
                requested,
                available,
            } => write!(f, "requested {requested}, only {available} left"),
        }
    }
}

/// Errors returned by stores and services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// Entity absent.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name ("book", "category", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The book has zero inventory.
    #[error("book {book_id} is out of stock")]
    OutOfStock {
        /// Book that was requested
        book_id: BookId,
    },

    /// The user already holds every available unit in their cart.
    #[error("book {book_id}: {in_cart} already in cart, {available} in stock")]
    InsufficientStock {
        /// Book that was requested
        book_id: BookId,
        /// Units already in the user's cart
        in_cart: u32,
        /// Current inventory
        available: u32,
    },

    /// Checkout on an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Checkout could not allocate a line; nothing was written.
    #[error("cannot check out book {book_id}: {reason}")]
    Conflict {
        /// Line that failed
        book_id: BookId,
        /// Cause
        reason: ConflictReason,
    },

    /// The order committed but its notification could not be published.
    #[error("order {order_id} placed but notification failed: {reason}")]
    Publish {
        /// Committed order
        order_id: OrderId,
        /// Publisher error
        reason: String,
    },

    /// Store or cache failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl ShopError {
    /// Shorthand for [`ShopError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`ShopError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`ShopError::Infrastructure`].
    #[must_use]
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure(message.into())
    }

    /// Classification used for status mapping and metrics.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::OutOfStock { .. } => ErrorKind::OutOfStock,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::EmptyCart => ErrorKind::EmptyCart,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Publish { .. } | Self::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }

    /// Business-rule rejections go back to the caller as-is and are never
    /// retried internally.
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Infrastructure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_failure_is_infrastructure() {
        let err = ShopError::Publish {
            order_id: OrderId::new(9),
            reason: "broker down".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(!err.is_business_rule());
        assert_eq!(
            err.to_string(),
            "order 9 placed but notification failed: broker down"
        );
    }

    #[test]
    fn stock_rejections_are_business_rules() {
        let out = ShopError::OutOfStock {
            book_id: BookId::new(42),
        };
        let conflict = ShopError::Conflict {
            book_id: BookId::new(42),
            reason: ConflictReason::InsufficientStock {
                requested: 2,
                available: 1,
            },
        };
        assert!(out.is_business_rule());
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(
            conflict.to_string(),
            "cannot check out book 42: requested 2, only 1 left"
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = ShopError::not_found("book", BookId::new(3));
        assert_eq!(err.to_string(), "book with id 3 not found");
        assert_eq!(err.kind().code(), "NOT_FOUND");
    }
}
