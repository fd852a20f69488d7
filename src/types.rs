use crate::error::{OrderBookError, Result};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Caller-assigned order identifier.
pub type OrderId = u64;

/// Caller-supplied arrival timestamp.
///
/// The book never reads a clock itself: any monotonically comparable value
/// (nanoseconds since epoch, a gateway sequence number, ...) works, as long as
/// the caller stamps orders consistently.
pub type Timestamp = u64;

/// Represents the side of an order in the order book.
///
/// - `Bid` represents buy orders (demand side)
/// - `Offer` represents sell orders (supply side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side: the highest price is the best level
    Bid,
    /// Sell side: the lowest price is the best level
    Offer,
}

impl Side {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Offer,
            Side::Offer => Side::Bid,
        }
    }

    /// Compares two prices by priority on this side.
    ///
    /// `Ordering::Less` means `left` is the more competitive price, so sorting
    /// with this comparator puts the best level first.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Side};
    /// use std::cmp::Ordering;
    ///
    /// let low = Decimal::new(100, 0);
    /// let high = Decimal::new(101, 0);
    ///
    /// assert_eq!(Side::Offer.compare_prices(low, high), Ordering::Less);
    /// assert_eq!(Side::Bid.compare_prices(low, high), Ordering::Greater);
    /// ```
    pub fn compare_prices(self, left: Decimal, right: Decimal) -> Ordering {
        match self {
            Side::Offer => left.cmp(&right),
            Side::Bid => right.cmp(&left),
        }
    }

    /// Single-character wire code: `B` for bids, `O` for offers.
    pub fn code(self) -> char {
        match self {
            Side::Bid => 'B',
            Side::Offer => 'O',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => formatter.write_str("bid"),
            Side::Offer => formatter.write_str("offer"),
        }
    }
}

impl TryFrom<char> for Side {
    type Error = OrderBookError;

    fn try_from(code: char) -> Result<Self> {
        match code {
            'B' => Ok(Side::Bid),
            'O' => Ok(Side::Offer),
            other => Err(OrderBookError::InvalidSide(other.to_string())),
        }
    }
}

impl FromStr for Side {
    type Err = OrderBookError;

    /// Parses `B`/`O` codes as well as the spelled-out `Bid`/`Offer` names.
    fn from_str(value: &str) -> Result<Self> {
        match value {
            "B" | "Bid" | "bid" => Ok(Side::Bid),
            "O" | "Offer" | "offer" => Ok(Side::Offer),
            other => Err(OrderBookError::InvalidSide(other.to_string())),
        }
    }
}

/// Represents a single resting order.
///
/// Identity, side, price and arrival time are fixed at construction. Only
/// `size` is ever changed by the book, and changing it never affects the
/// order's priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Caller-assigned unique identifier
    pub id: OrderId,
    /// Whether this is a buy (`Bid`) or sell (`Offer`) order
    pub side: Side,
    /// The limit price (using fixed-point arithmetic)
    pub price: Decimal,
    /// Remaining quantity; `None` counts as zero when aggregating
    pub size: Option<u64>,
    /// Arrival time, used only to rank orders sharing a price
    pub created_at: Timestamp,
}

impl Order {
    /// Creates a new order.
    ///
    /// Price and size are not range-checked: zero or negative prices are
    /// accepted as-is. The price is normalized, so `100.00` is stored as `100`.
    /// An order without a size can be built with struct update syntax on the
    /// public `size` field.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, Side};
    ///
    /// let order = Order::new(1, Side::Bid, Decimal::new(5025, 2), 10, 0);
    /// assert_eq!(order.size, Some(10));
    ///
    /// let sizeless = Order { size: None, ..order };
    /// assert_eq!(sizeless.size_or_zero(), 0);
    /// ```
    pub fn new(
        id: OrderId,
        side: Side,
        price: Decimal,
        size: u64,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            side,
            price: price.normalize(),
            size: Some(size),
            created_at,
        }
    }

    /// Creates a new order from a floating-point price.
    ///
    /// Fails with `InvalidPrice` when the price is NaN, infinite or too large
    /// to fit in a `Decimal`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, Side};
    ///
    /// let order = Order::with_f64_price(1, Side::Offer, 100.25, 5, 0).unwrap();
    /// assert_eq!(order.price, Decimal::new(10025, 2));
    ///
    /// assert!(Order::with_f64_price(2, Side::Offer, f64::NAN, 5, 0).is_err());
    /// ```
    pub fn with_f64_price(
        id: OrderId,
        side: Side,
        price: f64,
        size: u64,
        created_at: Timestamp,
    ) -> Result<Self> {
        let price = Decimal::try_from(price).map_err(|_| OrderBookError::InvalidPrice(price))?;

        Ok(Self::new(id, side, price, size, created_at))
    }

    /// Remaining size, with an absent size counted as zero.
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

/// A reference to an order inside a price level.
///
/// The level keeps only what it needs for ordering; the order itself (and
/// its mutable size) lives in the book's id lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LevelEntry {
    created_at: Timestamp,
    id: OrderId,
}

/// All orders resting at one price on one side, in arrival order (FIFO).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PriceLevel {
    entries: Vec<LevelEntry>,
}

impl PriceLevel {
    /// Inserts an order behind every order with an earlier or equal timestamp.
    ///
    /// Orders normally arrive with increasing timestamps, in which case this
    /// is a plain append.
    pub(crate) fn insert(&mut self, id: OrderId, created_at: Timestamp) {
        let position = self
            .entries
            .partition_point(|entry| entry.created_at <= created_at);
        self.entries.insert(position, LevelEntry { created_at, id });
    }

    /// Removes the order with the given id, keeping the relative order of the rest.
    pub(crate) fn remove(&mut self, id: OrderId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }

    /// Order ids at this level, earliest arrival first.
    pub(crate) fn ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
