//! The matching engine.
//!
//! ## Data layout
//!
//! The book owns everything: an order pool, a level pool, one
//! price-to-level map per side, the id-to-order map, and the two sorted
//! intrusive level lists. Every other reference in the system (FIFO links,
//! level siblings, map values) is a pool handle back into those two pools.
//!
//! The buy list is sorted descending (head = best bid) and the sell list
//! ascending (head = best ask). The heads double as the cached top of book.
//!
//! ## Matching
//!
//! `place_order` walks the opposite side from the head while the incoming
//! order still crosses, fills against each level's FIFO head, records
//! trades at the resting (maker) price, frees consumed orders and drained
//! levels, and finally rests any residual volume on the incoming side.
//! Trades are written into a buffer that is reused across calls; the
//! returned slice borrows the book, so the borrow checker enforces the
//! "valid until the next call" rule.

use crate::mem::{FlatHashMap, Handle};
use crate::orderbook::{Level, LevelPool, OrderPool};
use crate::types::{Id, Order, OrderStatus, Price, Side, Trade, Volume};

/// Hash-map pre-sizing for price levels, per side.
const LEVELS_RESERVE: usize = 256;

/// Default order capacity when none is given.
const DEFAULT_CAPACITY: usize = crate::orderbook::ORDER_SLAB_SIZE;

/// Single-instrument limit order book with price-time priority matching.
///
/// Strictly single-threaded: each `place_order`/`delete_order` runs to
/// completion before the next message. Trades within one call appear in
/// match order (best resting price first, FIFO within a price), so output
/// is deterministic given the input stream.
pub struct Book {
    orders: OrderPool,
    levels: LevelPool,

    buy_levels: FlatHashMap<Price, Handle<Level>>,
    sell_levels: FlatHashMap<Price, Handle<Level>>,

    /// Head of the descending buy list, i.e. the best bid.
    buy_head: Option<Handle<Level>>,
    /// Head of the ascending sell list, i.e. the best ask.
    sell_head: Option<Handle<Level>>,

    /// Currently ACTIVE orders only.
    id_to_order: FlatHashMap<Id, Handle<Order>>,

    /// Reused across `place_order` calls.
    trades: Vec<Trade>,
}

impl Book {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty book sized for `initial_capacity` resting orders.
    ///
    /// The order pool is pre-sized to the full capacity, the level pool to
    /// a sixteenth of it, and the lookup maps so the expected population
    /// never triggers a rehash.
    pub fn with_capacity(initial_capacity: usize) -> Self {
        let mut buy_levels = FlatHashMap::new();
        let mut sell_levels = FlatHashMap::new();
        let mut id_to_order = FlatHashMap::new();
        buy_levels.reserve(LEVELS_RESERVE);
        sell_levels.reserve(LEVELS_RESERVE);
        id_to_order.reserve(initial_capacity);

        Self {
            orders: OrderPool::with_capacity(initial_capacity),
            levels: LevelPool::with_capacity(initial_capacity / 16),
            buy_levels,
            sell_levels,
            buy_head: None,
            sell_head: None,
            id_to_order,
            trades: Vec::new(),
        }
    }

    // ========================================================================
    // Order placement and matching
    // ========================================================================

    /// Places a limit order: matches it against the opposite side, then
    /// rests any residual volume.
    ///
    /// Returns the trades produced by this call; the slice is valid until
    /// the next `place_order`. A zero price, a zero volume, or an id that
    /// is already live in the book is a no-op returning no trades.
    pub fn place_order(
        &mut self,
        order_id: Id,
        agent_id: Id,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> &[Trade] {
        self.trades.clear();

        if price == 0 || volume == 0 {
            return &self.trades;
        }
        if self.id_to_order.contains_key(order_id) {
            return &self.trades;
        }

        let incoming = self.orders.allocate(Order::new(order_id, agent_id, side, price, volume));

        match side {
            Side::Buy => {
                while let Some(level_handle) = self.sell_head {
                    if self.orders.get(incoming).is_fulfilled() {
                        break;
                    }
                    if self.levels.get(level_handle).price() > price {
                        break;
                    }
                    if self.match_against_level(incoming, level_handle) {
                        self.remove_level(level_handle, Side::Sell);
                    }
                }
            }
            Side::Sell => {
                while let Some(level_handle) = self.buy_head {
                    if self.orders.get(incoming).is_fulfilled() {
                        break;
                    }
                    if self.levels.get(level_handle).price() < price {
                        break;
                    }
                    if self.match_against_level(incoming, level_handle) {
                        self.remove_level(level_handle, Side::Buy);
                    }
                }
            }
        }

        if self.orders.get(incoming).is_fulfilled() {
            self.orders.deallocate(incoming);
        } else {
            self.insert_resting_order(incoming);
        }

        &self.trades
    }

    /// Matches `incoming` against one level's FIFO queue until either is
    /// exhausted. Returns whether the level ended up empty.
    fn match_against_level(&mut self, incoming: Handle<Order>, level_handle: Handle<Level>) -> bool {
        loop {
            let Some(resting) = self.levels.get(level_handle).head() else {
                break;
            };
            if self.orders.get(incoming).is_fulfilled() {
                break;
            }

            let fill_volume = self
                .orders
                .get(resting)
                .remaining_volume()
                .min(self.orders.get(incoming).remaining_volume());
            self.orders.get_mut(resting).fill(fill_volume);
            self.orders.get_mut(incoming).fill(fill_volume);
            self.levels.get_mut(level_handle).decrease_volume(fill_volume);

            self.trades.push(Trade::new(
                self.orders.get(incoming).order_id(),
                self.orders.get(resting).order_id(),
                self.levels.get(level_handle).price(),
                fill_volume,
            ));

            if self.orders.get(resting).is_fulfilled() {
                let resting_id = self.orders.get(resting).order_id();
                self.levels.get_mut(level_handle).pop_front(&mut self.orders);
                self.id_to_order.remove(resting_id);
                self.orders.deallocate(resting);
            }
        }
        self.levels.get(level_handle).is_empty()
    }

    /// Rests an unfulfilled order at its price level, creating and
    /// splicing in the level if the price is fresh.
    fn insert_resting_order(&mut self, handle: Handle<Order>) {
        let (order_id, side, price) = {
            let order = self.orders.get(handle);
            (order.order_id(), order.side(), order.price())
        };

        let level_handle = match side {
            Side::Buy => match self.buy_levels.get(price) {
                Some(&existing) => existing,
                None => {
                    let created = self.levels.allocate(Level::new(price));
                    self.buy_levels.insert(price, created);
                    Self::insert_buy_level(&mut self.buy_head, &mut self.levels, created);
                    created
                }
            },
            Side::Sell => match self.sell_levels.get(price) {
                Some(&existing) => existing,
                None => {
                    let created = self.levels.allocate(Level::new(price));
                    self.sell_levels.insert(price, created);
                    Self::insert_sell_level(&mut self.sell_head, &mut self.levels, created);
                    created
                }
            },
        };

        self.levels.get_mut(level_handle).push_back(handle, &mut self.orders);
        self.id_to_order.insert(order_id, handle);
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancels an order by id. Unknown ids are ignored, so cancelling twice
    /// behaves exactly like cancelling once.
    pub fn delete_order(&mut self, order_id: Id) {
        let Some(&handle) = self.id_to_order.get(order_id) else {
            return;
        };

        if self.orders.get(handle).status() == OrderStatus::Active {
            let side = self.orders.get(handle).side();
            self.remove_order_from_level(handle, side);
            self.id_to_order.remove(order_id);
            self.orders.get_mut(handle).set_status(OrderStatus::Deleted);
            self.orders.deallocate(handle);
        } else {
            // the index should only ever hold ACTIVE orders; drop the stale id
            self.id_to_order.remove(order_id);
        }
    }

    /// Unlinks an order from its level and drops the level if that emptied
    /// it.
    fn remove_order_from_level(&mut self, handle: Handle<Order>, side: Side) {
        let price = self.orders.get(handle).price();
        let level_handle = match side {
            Side::Buy => self.buy_levels.get(price).copied(),
            Side::Sell => self.sell_levels.get(price).copied(),
        };
        let Some(level_handle) = level_handle else {
            return;
        };

        self.levels.get_mut(level_handle).erase(handle, &mut self.orders);
        if self.levels.get(level_handle).is_empty() {
            self.remove_level(level_handle, side);
        }
    }

    // ========================================================================
    // Sorted level-list maintenance
    // ========================================================================

    /// Splices a fresh buy level into the descending list.
    fn insert_buy_level(head: &mut Option<Handle<Level>>, levels: &mut LevelPool, handle: Handle<Level>) {
        let price = levels.get(handle).price();
        match *head {
            None => *head = Some(handle),
            Some(first) if price > levels.get(first).price() => {
                levels.get_mut(handle).next_level = Some(first);
                levels.get_mut(first).prev_level = Some(handle);
                *head = Some(handle);
            }
            Some(first) => {
                let mut current = first;
                while let Some(next) = levels.get(current).next_level {
                    if levels.get(next).price() <= price {
                        break;
                    }
                    current = next;
                }
                Self::splice_after(levels, current, handle);
            }
        }
    }

    /// Splices a fresh sell level into the ascending list.
    fn insert_sell_level(head: &mut Option<Handle<Level>>, levels: &mut LevelPool, handle: Handle<Level>) {
        let price = levels.get(handle).price();
        match *head {
            None => *head = Some(handle),
            Some(first) if price < levels.get(first).price() => {
                levels.get_mut(handle).next_level = Some(first);
                levels.get_mut(first).prev_level = Some(handle);
                *head = Some(handle);
            }
            Some(first) => {
                let mut current = first;
                while let Some(next) = levels.get(current).next_level {
                    if levels.get(next).price() >= price {
                        break;
                    }
                    current = next;
                }
                Self::splice_after(levels, current, handle);
            }
        }
    }

    fn splice_after(levels: &mut LevelPool, current: Handle<Level>, handle: Handle<Level>) {
        let next = levels.get(current).next_level;
        {
            let level = levels.get_mut(handle);
            level.prev_level = Some(current);
            level.next_level = next;
        }
        levels.get_mut(current).next_level = Some(handle);
        if let Some(next_handle) = next {
            levels.get_mut(next_handle).prev_level = Some(handle);
        }
    }

    /// Unlinks a drained level, erases its price from the side map and
    /// returns it to the pool.
    fn remove_level(&mut self, handle: Handle<Level>, side: Side) {
        let price = self.levels.get(handle).price();
        let head = match side {
            Side::Buy => &mut self.buy_head,
            Side::Sell => &mut self.sell_head,
        };

        let (prev, next) = {
            let level = self.levels.get(handle);
            (level.prev_level, level.next_level)
        };
        match prev {
            Some(prev_handle) => self.levels.get_mut(prev_handle).next_level = next,
            None => *head = next,
        }
        if let Some(next_handle) = next {
            self.levels.get_mut(next_handle).prev_level = prev;
        }

        match side {
            Side::Buy => self.buy_levels.remove(price),
            Side::Sell => self.sell_levels.remove(price),
        };
        self.levels.deallocate(handle);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Best (highest) resting buy price, or 0 if the buy side is empty.
    #[inline]
    pub fn get_best_buy(&self) -> Price {
        self.buy_head.map_or(0, |handle| self.levels.get(handle).price())
    }

    /// Best (lowest) resting sell price, or 0 if the sell side is empty.
    #[inline]
    pub fn get_best_sell(&self) -> Price {
        self.sell_head.map_or(0, |handle| self.levels.get(handle).price())
    }

    /// `best_ask - best_bid`, or 0 if either side is empty.
    pub fn get_spread(&self) -> Price {
        let best_buy = self.get_best_buy();
        let best_sell = self.get_best_sell();
        if best_buy == 0 || best_sell == 0 {
            0
        } else {
            best_sell - best_buy
        }
    }

    /// Mean of best bid and best ask, or 0.0 if either side is empty.
    pub fn get_mid_price(&self) -> f64 {
        let best_buy = self.get_best_buy();
        let best_sell = self.get_best_sell();
        if best_buy == 0 || best_sell == 0 {
            0.0
        } else {
            (u64::from(best_buy) + u64::from(best_sell)) as f64 / 2.0
        }
    }

    /// Non-empty buy prices, best (highest) first.
    pub fn get_buy_prices(&self) -> Vec<Price> {
        self.collect_prices(self.buy_head)
    }

    /// Non-empty sell prices, best (lowest) first.
    pub fn get_sell_prices(&self) -> Vec<Price> {
        self.collect_prices(self.sell_head)
    }

    fn collect_prices(&self, head: Option<Handle<Level>>) -> Vec<Price> {
        let mut prices = Vec::new();
        let mut current = head;
        while let Some(handle) = current {
            let level = self.levels.get(handle);
            prices.push(level.price());
            current = level.next_level;
        }
        prices
    }

    /// Status of an order: `Active` while resting, `Deleted` for ids the
    /// book no longer (or never) knows.
    pub fn get_order_status(&self, order_id: Id) -> OrderStatus {
        match self.id_to_order.get(order_id) {
            Some(&handle) => self.orders.get(handle).status(),
            None => OrderStatus::Deleted,
        }
    }

    /// Read-only view of a resting order.
    pub fn get_order(&self, order_id: Id) -> Option<&Order> {
        let &handle = self.id_to_order.get(order_id)?;
        Some(self.orders.get(handle))
    }

    /// Number of resting (ACTIVE) orders across both sides.
    #[inline]
    pub fn get_resting_orders_count(&self) -> usize {
        self.id_to_order.len()
    }

    /// Number of non-empty buy price levels.
    #[inline]
    pub fn get_buy_levels_count(&self) -> usize {
        self.buy_levels.len()
    }

    /// Number of non-empty sell price levels.
    #[inline]
    pub fn get_sell_levels_count(&self) -> usize {
        self.sell_levels.len()
    }

    /// Slots currently owned by the order pool.
    #[inline]
    pub fn order_pool_capacity(&self) -> usize {
        self.orders.capacity()
    }

    /// Slots currently owned by the level pool.
    #[inline]
    pub fn level_pool_capacity(&self) -> usize {
        self.levels.capacity()
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}
