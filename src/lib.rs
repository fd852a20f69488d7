//! A price-time priority limit order book.
//!
//! ## Architecture
//!
//! The book keeps three structures in lockstep:
//!
//! 1. Bid levels: price levels ordered from the highest (best) bid down
//! 2. Offer levels: price levels ordered from the lowest (best) offer up
//! 3. An id lookup table holding the only live copy of every `Order`
//!
//! Each level is a FIFO queue of order ids sorted by the caller-supplied
//! arrival timestamp. Because levels hold ids rather than copies, resizing an
//! order through `modify_order` is one write into the lookup table and is
//! immediately reflected in `get_size` and `get_orders`, while the order keeps
//! its place in the queue.
//!
//! `OrderBook` is single-threaded. `SharedOrderBook` wraps it in a single
//! `RwLock` so that concurrent readers never see a partially applied change.
//!
//! ## Example Usage
//!
//! ```rust
//! use limit_order_book::{Decimal, Order, OrderBook, OrderBookError, Side};
//!
//! let mut order_book = OrderBook::new();
//!
//! // Two bids at the same price: they share level 1, first come first served
//! order_book.add_order(Order::new(1, Side::Bid, Decimal::new(50, 0), 10, 1)).unwrap();
//! order_book.add_order(Order::new(2, Side::Bid, Decimal::new(50, 0), 5, 2)).unwrap();
//!
//! assert_eq!(order_book.get_price(Side::Bid, 1), Ok(Decimal::new(50, 0)));
//! assert_eq!(order_book.get_size(Side::Bid, 1), Ok(15));
//!
//! // Shrinking order 1 keeps it at the front of the queue
//! order_book.modify_order(1, 3);
//! assert_eq!(order_book.get_orders(Side::Bid)[0].id, 1);
//! assert_eq!(order_book.get_size(Side::Bid, 1), Ok(8));
//!
//! // Levels are 1-based
//! assert_eq!(order_book.get_price(Side::Bid, 0), Err(OrderBookError::InvalidLevel(0)));
//! ```
//!
//! Side codes arriving as text are parsed up front, so an unknown side is
//! rejected before the book is touched:
//!
//! ```rust
//! use limit_order_book::{OrderBookError, Side};
//!
//! assert_eq!(Side::try_from('O'), Ok(Side::Offer));
//! assert_eq!("X".parse::<Side>(), Err(OrderBookError::InvalidSide("X".to_string())));
//! ```

mod error;
mod order_book;
mod shared_order_book;
mod types;

// Re-export public API
pub use error::{OrderBookError, Result};
pub use order_book::OrderBook;
pub use shared_order_book::SharedOrderBook;
pub use types::{Order, OrderId, Side, Timestamp};

// Re-export commonly used external dependencies
pub use rust_decimal::Decimal;
