use crate::error::{OrderBookError, Result};
use crate::types::{Order, OrderId, PriceLevel, Side};
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::btree_map::{self, Entry};
use std::collections::{hash_map, BTreeMap, HashMap};

/// The core order book structure that maintains price-time priority.
///
/// The book is made of three structures that always change together:
///
/// - Bid levels, keyed by `Reverse(price)` so iteration yields the highest bid first
/// - Offer levels, keyed by price so iteration yields the lowest offer first
/// - The id lookup table, which owns the only live copy of every order
///
/// Levels store order ids in arrival order rather than copies of the orders,
/// so a size change made through the lookup table is seen by every query.
///
/// ### Thread Safety
///
/// Mutations take `&mut self` and reads take `&self`. To share a book across
/// threads use [`crate::SharedOrderBook`], which guards all three structures
/// with a single lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    /// Bid side (buy orders): best (highest) price first
    bids: BTreeMap<Reverse<Decimal>, PriceLevel>,
    /// Offer side (sell orders): best (lowest) price first
    offers: BTreeMap<Decimal, PriceLevel>,
    /// Every resting order, by id
    orders: HashMap<OrderId, Order>,
}

/// Iterates over one side's levels in priority order, yielding plain prices.
enum Levels<'a> {
    Bids(btree_map::Iter<'a, Reverse<Decimal>, PriceLevel>),
    Offers(btree_map::Iter<'a, Decimal, PriceLevel>),
}

impl<'a> Iterator for Levels<'a> {
    type Item = (Decimal, &'a PriceLevel);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Levels::Bids(iter) => iter.next().map(|(Reverse(price), level)| (*price, level)),
            Levels::Offers(iter) => iter.next().map(|(price, level)| (*price, level)),
        }
    }
}

impl OrderBook {
    /// Creates a new empty order book.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::OrderBook;
    ///
    /// let order_book = OrderBook::new();
    /// assert!(order_book.is_empty());
    /// ```
    pub fn new() -> Self {
        OrderBook {
            bids: BTreeMap::new(),
            offers: BTreeMap::new(),
            orders: HashMap::new(),
        }
    }

    /// Creates an empty order book whose id lookup is pre-sized for
    /// `expected_orders` resting orders.
    pub fn with_capacity(expected_orders: usize) -> Self {
        OrderBook {
            bids: BTreeMap::new(),
            offers: BTreeMap::new(),
            orders: HashMap::with_capacity(expected_orders),
        }
    }

    /// Adds an order to the book.
    ///
    /// The order joins the level for its price (creating it if the price is
    /// new) behind every order that arrived before it, and is registered in
    /// the id lookup.
    ///
    /// ## Errors
    ///
    /// `DuplicateOrder` if an order with the same id is already resting. The
    /// book is not modified in that case.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, OrderBook, OrderBookError, Side};
    ///
    /// let mut order_book = OrderBook::new();
    /// let order = Order::new(1, Side::Bid, Decimal::new(50, 0), 10, 0);
    ///
    /// order_book.add_order(order.clone()).unwrap();
    /// assert_eq!(
    ///     order_book.add_order(order),
    ///     Err(OrderBookError::DuplicateOrder(1))
    /// );
    /// ```
    pub fn add_order(&mut self, order: Order) -> Result<()> {
        let entry = match self.orders.entry(order.id) {
            hash_map::Entry::Occupied(_) => {
                return Err(OrderBookError::DuplicateOrder(order.id));
            }
            hash_map::Entry::Vacant(entry) => entry,
        };

        // Equal prices at different scales share a level keyed at the plain scale.
        let price = order.price.normalize();
        match order.side {
            Side::Bid => Self::attach(&mut self.bids, Reverse(price), &order),
            Side::Offer => Self::attach(&mut self.offers, price, &order),
        }
        entry.insert(order);

        Ok(())
    }

    /// Removes an order from the book and returns it.
    ///
    /// Removing an unknown id is not an error: the order may already have
    /// been cancelled or filled, so `None` is returned and nothing changes.
    /// When the order was the last one at its price, the level disappears.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new();
    /// order_book.add_order(Order::new(1, Side::Offer, Decimal::new(101, 0), 10, 0)).unwrap();
    ///
    /// assert_eq!(order_book.remove_order(1).map(|order| order.id), Some(1));
    /// assert_eq!(order_book.remove_order(1), None);
    /// assert_eq!(order_book.levels_count(Side::Offer), 0);
    /// ```
    pub fn remove_order(&mut self, id: OrderId) -> Option<Order> {
        let order = self.orders.remove(&id)?;

        match order.side {
            Side::Bid => Self::detach(&mut self.bids, Reverse(order.price), id),
            Side::Offer => Self::detach(&mut self.offers, order.price, id),
        }

        Some(order)
    }

    /// Replaces the remaining size of a resting order.
    ///
    /// The order keeps its level and its place in the queue: only the size
    /// changes. Callers that want a size increase to forfeit time priority
    /// must remove and re-add the order themselves.
    ///
    /// Returns `false`, without touching the book, when the id is unknown.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new();
    /// order_book.add_order(Order::new(1, Side::Bid, Decimal::new(50, 0), 10, 0)).unwrap();
    ///
    /// assert!(order_book.modify_order(1, 100));
    /// assert_eq!(order_book.get_size(Side::Bid, 1), Ok(100));
    /// assert!(!order_book.modify_order(42, 5));
    /// ```
    pub fn modify_order(&mut self, id: OrderId, size: u64) -> bool {
        match self.orders.get_mut(&id) {
            Some(order) => {
                order.size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Returns the price at a 1-based level, where level 1 is the best price
    /// for the side.
    ///
    /// ## Errors
    ///
    /// - `InvalidLevel` if `level` is 0
    /// - `LevelNotFound` if the side has fewer than `level` price levels
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, OrderBook, OrderBookError, Side};
    ///
    /// let mut order_book = OrderBook::new();
    /// order_book.add_order(Order::new(1, Side::Offer, Decimal::new(100, 0), 10, 0)).unwrap();
    /// order_book.add_order(Order::new(2, Side::Offer, Decimal::new(50, 0), 10, 1)).unwrap();
    ///
    /// assert_eq!(order_book.get_price(Side::Offer, 1), Ok(Decimal::new(50, 0)));
    /// assert_eq!(order_book.get_price(Side::Offer, 2), Ok(Decimal::new(100, 0)));
    /// assert_eq!(
    ///     order_book.get_price(Side::Offer, 3),
    ///     Err(OrderBookError::LevelNotFound { side: Side::Offer, level: 3 })
    /// );
    /// ```
    pub fn get_price(&self, side: Side, level: usize) -> Result<Decimal> {
        self.level_at(side, level).map(|(price, _)| price)
    }

    /// Returns the total remaining size at a 1-based level.
    ///
    /// Orders without a size count as zero. The sum is computed on every call,
    /// so it always reflects the latest `modify_order`.
    ///
    /// ## Errors
    ///
    /// Same as [`OrderBook::get_price`].
    pub fn get_size(&self, side: Side, level: usize) -> Result<u64> {
        let (_, price_level) = self.level_at(side, level)?;
        Ok(self.level_size(price_level))
    }

    /// Returns a snapshot of every order on one side, best level first and
    /// earliest arrival first within a level.
    ///
    /// The returned orders are copies: later changes to the book do not show
    /// up in the snapshot.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new();
    /// order_book.add_order(Order::new(1, Side::Bid, Decimal::new(50, 0), 10, 0)).unwrap();
    /// order_book.add_order(Order::new(2, Side::Bid, Decimal::new(51, 0), 10, 1)).unwrap();
    /// order_book.add_order(Order::new(3, Side::Bid, Decimal::new(50, 0), 10, 2)).unwrap();
    ///
    /// let ids: Vec<_> = order_book.get_orders(Side::Bid).iter().map(|order| order.id).collect();
    /// assert_eq!(ids, vec![2, 1, 3]);
    /// ```
    pub fn get_orders(&self, side: Side) -> Vec<Order> {
        self.levels(side)
            .flat_map(|(_, price_level)| price_level.ids())
            .filter_map(|id| self.orders.get(&id))
            .cloned()
            .collect()
    }

    /// Looks up a resting order by id.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Returns `true` if an order with this id is resting in the book.
    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    /// Returns the number of resting orders on both sides.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns `true` if no order is resting on either side.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Returns the number of distinct price levels on one side.
    pub fn levels_count(&self, side: Side) -> usize {
        match side {
            Side::Bid => self.bids.len(),
            Side::Offer => self.offers.len(),
        }
    }

    /// Returns the number of orders resting at a 1-based level.
    ///
    /// ## Errors
    ///
    /// Same as [`OrderBook::get_price`].
    pub fn orders_at_level(&self, side: Side, level: usize) -> Result<usize> {
        let (_, price_level) = self.level_at(side, level)?;
        Ok(price_level.len())
    }

    /// Returns the best price on one side, or `None` if the side is empty.
    pub fn best_price(&self, side: Side) -> Option<Decimal> {
        self.levels(side).next().map(|(price, _)| price)
    }

    /// Computes the current best bid, best offer and the spread between them.
    ///
    /// The spread is only available when both sides have orders.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, Order, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new();
    /// order_book.add_order(Order::new(1, Side::Bid, Decimal::new(9950, 2), 10, 0)).unwrap();
    ///
    /// let (best_bid, best_offer, spread) = order_book.compute_spread();
    /// assert_eq!(best_bid, Some(Decimal::new(9950, 2)));
    /// assert_eq!(best_offer, None);
    /// assert_eq!(spread, None);
    /// ```
    pub fn compute_spread(&self) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
        let best_bid = self.best_price(Side::Bid);
        let best_offer = self.best_price(Side::Offer);

        let spread = match (best_bid, best_offer) {
            (Some(bid), Some(offer)) => Some(offer - bid),
            _ => None,
        };

        (best_bid, best_offer, spread)
    }

    /// Returns `(price, total size)` for every level on one side, best first.
    pub fn depth(&self, side: Side) -> Vec<(Decimal, u64)> {
        self.levels(side)
            .map(|(price, price_level)| (price, self.level_size(price_level)))
            .collect()
    }

    /// Removes every order from both sides.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.offers.clear();
        self.orders.clear();
    }

    fn levels(&self, side: Side) -> Levels<'_> {
        match side {
            Side::Bid => Levels::Bids(self.bids.iter()),
            Side::Offer => Levels::Offers(self.offers.iter()),
        }
    }

    fn level_at(&self, side: Side, level: usize) -> Result<(Decimal, &PriceLevel)> {
        if level < 1 {
            return Err(OrderBookError::InvalidLevel(level));
        }

        self.levels(side)
            .nth(level - 1)
            .ok_or(OrderBookError::LevelNotFound { side, level })
    }

    fn level_size(&self, price_level: &PriceLevel) -> u64 {
        price_level
            .ids()
            .filter_map(|id| self.orders.get(&id))
            .fold(0u64, |total, order| total.saturating_add(order.size_or_zero()))
    }

    fn attach<K: Ord>(levels: &mut BTreeMap<K, PriceLevel>, key: K, order: &Order) {
        levels
            .entry(key)
            .or_default()
            .insert(order.id, order.created_at);
    }

    fn detach<K: Ord>(levels: &mut BTreeMap<K, PriceLevel>, key: K, id: OrderId) {
        if let Entry::Occupied(mut level_entry) = levels.entry(key) {
            level_entry.get_mut().remove(id);
            if level_entry.get().is_empty() {
                level_entry.remove();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: OrderId, side: Side, price: i64, size: u64) -> Order {
        Order::new(id, side, Decimal::new(price, 0), size, id)
    }

    /// Checks that the lookup table and both level indexes agree.
    fn assert_consistent(book: &OrderBook) {
        let mut seen = 0;
        for (Reverse(price), level) in &book.bids {
            assert!(!level.is_empty(), "empty bid level at {price}");
            for id in level.ids() {
                let resting = book.orders.get(&id).expect("bid level id missing from lookup");
                assert_eq!(resting.side, Side::Bid);
                assert_eq!(resting.price, *price);
                seen += 1;
            }
        }
        for (price, level) in &book.offers {
            assert!(!level.is_empty(), "empty offer level at {price}");
            for id in level.ids() {
                let resting = book.orders.get(&id).expect("offer level id missing from lookup");
                assert_eq!(resting.side, Side::Offer);
                assert_eq!(resting.price, *price);
                seen += 1;
            }
        }
        assert_eq!(seen, book.orders.len());
    }

    #[test]
    fn add_creates_one_level_per_price() {
        let mut book = OrderBook::new();
        book.add_order(order(1, Side::Bid, 50, 10)).unwrap();
        book.add_order(order(2, Side::Bid, 50, 5)).unwrap();
        book.add_order(order(3, Side::Bid, 49, 5)).unwrap();
        book.add_order(order(4, Side::Offer, 51, 5)).unwrap();

        assert_eq!(book.levels_count(Side::Bid), 2);
        assert_eq!(book.levels_count(Side::Offer), 1);
        assert_eq!(book.orders_at_level(Side::Bid, 1), Ok(2));
        assert_eq!(book.len(), 4);
        assert_consistent(&book);
    }

    #[test]
    fn duplicate_add_leaves_book_unchanged() {
        let mut book = OrderBook::new();
        book.add_order(order(1, Side::Offer, 100, 10)).unwrap();
        let before = book.clone();

        // Same id on the other side and at another price is still a duplicate.
        assert_eq!(
            book.add_order(order(1, Side::Bid, 90, 5)),
            Err(OrderBookError::DuplicateOrder(1))
        );
        assert_eq!(book, before);
        assert_consistent(&book);
    }

    #[test]
    fn removing_last_order_drops_the_level() {
        let mut book = OrderBook::new();
        book.add_order(order(1, Side::Bid, 50, 10)).unwrap();
        book.add_order(order(2, Side::Bid, 50, 5)).unwrap();

        book.remove_order(1);
        assert_eq!(book.levels_count(Side::Bid), 1);
        assert_eq!(book.get_size(Side::Bid, 1), Ok(5));

        book.remove_order(2);
        assert_eq!(book.levels_count(Side::Bid), 0);
        assert!(book.is_empty());
        assert_consistent(&book);
    }

    #[test]
    fn remove_and_modify_unknown_ids_are_noops() {
        let mut book = OrderBook::new();
        book.add_order(order(1, Side::Offer, 100, 10)).unwrap();
        let before = book.clone();

        assert_eq!(book.remove_order(99), None);
        assert!(!book.modify_order(99, 1));
        assert_eq!(book, before);
    }

    #[test]
    fn modify_keeps_queue_position() {
        let mut book = OrderBook::new();
        for id in 1..=3 {
            book.add_order(order(id, Side::Offer, 50, 10)).unwrap();
        }

        assert!(book.modify_order(1, 100));

        let orders = book.get_orders(Side::Offer);
        assert_eq!(orders[0].id, 1);
        assert_eq!(orders[0].size, Some(100));
        assert_eq!(book.get_size(Side::Offer, 1), Ok(120));
        assert_consistent(&book);
    }

    #[test]
    fn absent_sizes_count_as_zero() {
        let mut book = OrderBook::new();
        book.add_order(Order {
            size: None,
            ..order(1, Side::Bid, 50, 0)
        })
        .unwrap();
        book.add_order(order(2, Side::Bid, 50, 7)).unwrap();

        assert_eq!(book.get_size(Side::Bid, 1), Ok(7));

        book.modify_order(2, 0);
        assert_eq!(book.get_size(Side::Bid, 1), Ok(0));
        assert_eq!(book.order(1).and_then(|resting| resting.size), None);
    }

    #[test]
    fn level_zero_is_invalid_even_on_empty_book() {
        let book = OrderBook::new();

        assert_eq!(book.get_price(Side::Bid, 0), Err(OrderBookError::InvalidLevel(0)));
        assert_eq!(book.get_size(Side::Offer, 0), Err(OrderBookError::InvalidLevel(0)));
        assert_eq!(
            book.get_price(Side::Bid, 1),
            Err(OrderBookError::LevelNotFound { side: Side::Bid, level: 1 })
        );
    }

    #[test]
    fn depth_and_spread_follow_level_priority() {
        let mut book = OrderBook::new();
        book.add_order(order(1, Side::Bid, 99, 10)).unwrap();
        book.add_order(order(2, Side::Bid, 98, 5)).unwrap();
        book.add_order(order(3, Side::Bid, 99, 1)).unwrap();
        book.add_order(order(4, Side::Offer, 101, 3)).unwrap();

        assert_eq!(
            book.depth(Side::Bid),
            vec![(Decimal::new(99, 0), 11), (Decimal::new(98, 0), 5)]
        );
        assert_eq!(
            book.compute_spread(),
            (
                Some(Decimal::new(99, 0)),
                Some(Decimal::new(101, 0)),
                Some(Decimal::new(2, 0))
            )
        );
    }

    #[test]
    fn level_price_keeps_plain_scale_for_hand_built_orders() {
        let mut book = OrderBook::new();
        let scaled = Order {
            id: 1,
            side: Side::Offer,
            price: Decimal::new(10000, 2),
            size: Some(10),
            created_at: 1,
        };
        book.add_order(scaled).unwrap();
        book.add_order(order(2, Side::Offer, 100, 5)).unwrap();

        assert_eq!(book.levels_count(Side::Offer), 1);
        assert_eq!(book.get_price(Side::Offer, 1).unwrap().to_string(), "100");

        book.remove_order(1);
        assert_eq!(book.get_price(Side::Offer, 1).unwrap().to_string(), "100");
        assert_eq!(book.get_size(Side::Offer, 1), Ok(5));
        assert_consistent(&book);
    }

    #[test]
    fn clear_empties_every_structure() {
        let mut book = OrderBook::with_capacity(16);
        book.add_order(order(1, Side::Bid, 99, 10)).unwrap();
        book.add_order(order(2, Side::Offer, 101, 10)).unwrap();

        book.clear();

        assert_eq!(book, OrderBook::new());
        assert!(!book.contains(1));
    }
}
