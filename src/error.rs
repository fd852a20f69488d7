use crate::types::{OrderId, Side};
use thiserror::Error;

/// Errors returned by order book operations.
///
/// Every variant is a deterministic rejection of a single call: the book is
/// left exactly as it was before the failing call, and the same call with
/// corrected input can be retried safely.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderBookError {
    /// A side code other than bid (`B`) or offer (`O`) was supplied.
    #[error("invalid order side: {0:?}")]
    InvalidSide(String),

    /// An order with the same id is already resting in the book.
    #[error("order with id {0} already exists")]
    DuplicateOrder(OrderId),

    /// Levels are 1-based, so level 0 is never valid.
    #[error("invalid level: {0}")]
    InvalidLevel(usize),

    /// The side has fewer distinct price levels than requested.
    #[error("no {side} orders at level {level}")]
    LevelNotFound { side: Side, level: usize },

    /// The price could not be represented as a `Decimal` (NaN, infinite or out of range).
    #[error("invalid order price: {0}")]
    InvalidPrice(f64),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, OrderBookError>;
