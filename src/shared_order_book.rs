use crate::error::Result;
use crate::order_book::OrderBook;
use crate::types::{Order, OrderId, Side};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// A cloneable, thread-safe handle to a single `OrderBook`.
///
/// Order entry, cancellation and snapshot publication usually run on
/// different threads. This handle puts the whole book (both level indexes
/// and the id lookup) behind one `RwLock`, so a reader can never observe an
/// add, remove or modify that is only half applied:
///
/// - Queries (`get_orders`, `get_price`, `get_size`, ...) take the read lock
///   and run concurrently with each other
/// - Mutations (`add_order`, `remove_order`, `modify_order`) take the write lock
///
/// No operation blocks on anything but the lock itself, and every lock is
/// held only for the duration of a single book operation.
///
/// ## Logging
///
/// Accepted mutations are reported with `tracing` at debug level and
/// rejected additions at warn level. The error is still returned to the
/// caller unchanged.
///
/// ## Examples
///
/// ```
/// use limit_order_book::{Decimal, Order, SharedOrderBook, Side};
/// use std::thread;
///
/// let book = SharedOrderBook::new();
///
/// let writer = {
///     let book = book.clone();
///     thread::spawn(move || {
///         book.add_order(Order::new(1, Side::Bid, Decimal::new(99, 0), 10, 0))
///     })
/// };
/// writer.join().unwrap().unwrap();
///
/// assert_eq!(book.get_price(Side::Bid, 1), Ok(Decimal::new(99, 0)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedOrderBook {
    inner: Arc<RwLock<OrderBook>>,
}

impl SharedOrderBook {
    /// Creates a handle to a new empty order book.
    pub fn new() -> Self {
        Self::from(OrderBook::new())
    }

    /// Creates a handle to an empty order book pre-sized for `expected_orders`.
    pub fn with_capacity(expected_orders: usize) -> Self {
        Self::from(OrderBook::with_capacity(expected_orders))
    }

    /// Adds an order under the write lock. See [`OrderBook::add_order`].
    pub fn add_order(&self, order: Order) -> Result<()> {
        let (id, side, price, size) = (order.id, order.side, order.price, order.size);

        let result = self.inner.write().add_order(order);

        match &result {
            Ok(()) => debug!(order_id = id, %side, %price, ?size, "order added"),
            Err(error) => warn!(order_id = id, %side, %price, %error, "order rejected"),
        }

        result
    }

    /// Removes an order under the write lock. See [`OrderBook::remove_order`].
    pub fn remove_order(&self, id: OrderId) -> Option<Order> {
        let removed = self.inner.write().remove_order(id);

        match &removed {
            Some(order) => debug!(order_id = id, side = %order.side, price = %order.price, "order removed"),
            None => debug!(order_id = id, "remove ignored, order not resting"),
        }

        removed
    }

    /// Replaces an order's size under the write lock. See [`OrderBook::modify_order`].
    pub fn modify_order(&self, id: OrderId, size: u64) -> bool {
        let modified = self.inner.write().modify_order(id, size);

        if modified {
            debug!(order_id = id, size, "order size modified");
        } else {
            debug!(order_id = id, "modify ignored, order not resting");
        }

        modified
    }

    /// See [`OrderBook::get_price`].
    pub fn get_price(&self, side: Side, level: usize) -> Result<Decimal> {
        self.inner.read().get_price(side, level)
    }

    /// See [`OrderBook::get_size`].
    pub fn get_size(&self, side: Side, level: usize) -> Result<u64> {
        self.inner.read().get_size(side, level)
    }

    /// See [`OrderBook::get_orders`].
    pub fn get_orders(&self, side: Side) -> Vec<Order> {
        self.inner.read().get_orders(side)
    }

    /// See [`OrderBook::compute_spread`].
    pub fn compute_spread(&self) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
        self.inner.read().compute_spread()
    }

    /// See [`OrderBook::depth`].
    pub fn depth(&self, side: Side) -> Vec<(Decimal, u64)> {
        self.inner.read().depth(side)
    }

    /// Returns the number of resting orders on both sides.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no order is resting on either side.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Acquires the read lock for several queries that must see the same state.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, SharedOrderBook, Side};
    ///
    /// let book = SharedOrderBook::new();
    /// book.add_order(Order::new(1, Side::Offer, Decimal::new(101, 0), 7, 0)).unwrap();
    ///
    /// let snapshot = book.read();
    /// let price = snapshot.get_price(Side::Offer, 1).unwrap();
    /// let size = snapshot.get_size(Side::Offer, 1).unwrap();
    /// assert_eq!((price, size), (Decimal::new(101, 0), 7));
    /// ```
    pub fn read(&self) -> RwLockReadGuard<'_, OrderBook> {
        self.inner.read()
    }

    /// Acquires the write lock for several mutations that must apply atomically,
    /// such as a cancel followed by a re-add at a new price.
    pub fn write(&self) -> RwLockWriteGuard<'_, OrderBook> {
        self.inner.write()
    }
}

impl From<OrderBook> for SharedOrderBook {
    fn from(order_book: OrderBook) -> Self {
        Self {
            inner: Arc::new(RwLock::new(order_book)),
        }
    }
}
