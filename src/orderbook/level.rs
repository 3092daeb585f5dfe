//! Price level: FIFO queue of orders at one price.
//!
//! ## Queue structure
//!
//! ```text
//! head (oldest) <-> order <-> order <-> tail (newest)
//! ```
//!
//! New orders append at the tail, matching consumes from the head, and any
//! order can be unlinked in O(1) given its handle. The queue is intrusive:
//! the links live in the orders, the level only holds the endpoints and the
//! aggregates.
//!
//! Invariants:
//! - `order_count == 0` exactly when `head` and `tail` are `None`
//! - `total_volume` equals the sum of remaining volumes over the queue
//! - queue order is insertion order

use crate::mem::Handle;
use crate::orderbook::OrderPool;
use crate::types::{Length, Order, Price, Volume};

/// All resting orders at a single price on one side.
#[derive(Debug)]
pub struct Level {
    price: Price,
    order_count: Length,
    total_volume: Volume,

    head: Option<Handle<Order>>,
    tail: Option<Handle<Order>>,

    /// Siblings in the book's sorted level list.
    pub(crate) prev_level: Option<Handle<Level>>,
    pub(crate) next_level: Option<Handle<Level>>,
}

impl Level {
    pub(crate) fn new(price: Price) -> Self {
        Self {
            price,
            order_count: 0,
            total_volume: 0,
            head: None,
            tail: None,
            prev_level: None,
            next_level: None,
        }
    }

    /// Appends an order at the tail of the queue.
    pub(crate) fn push_back(&mut self, handle: Handle<Order>, orders: &mut OrderPool) {
        let volume = orders.get(handle).remaining_volume();

        match self.tail {
            None => {
                self.head = Some(handle);
                self.tail = Some(handle);
                let order = orders.get_mut(handle);
                order.prev_order = None;
                order.next_order = None;
            }
            Some(tail) => {
                orders.get_mut(tail).next_order = Some(handle);
                let order = orders.get_mut(handle);
                order.prev_order = Some(tail);
                order.next_order = None;
                self.tail = Some(handle);
            }
        }

        self.total_volume += volume;
        self.order_count += 1;
    }

    /// Unlinks and returns the head of the queue, or `None` if empty.
    pub(crate) fn pop_front(&mut self, orders: &mut OrderPool) -> Option<Handle<Order>> {
        let head = self.head?;
        let next = orders.get(head).next_order;

        match next {
            Some(next_handle) => {
                orders.get_mut(next_handle).prev_order = None;
                self.head = Some(next_handle);
            }
            None => {
                self.head = None;
                self.tail = None;
            }
        }

        let order = orders.get_mut(head);
        let volume = order.remaining_volume();
        order.prev_order = None;
        order.next_order = None;

        self.total_volume -= volume;
        self.order_count -= 1;
        Some(head)
    }

    /// Unlinks an order from anywhere in the queue. The order must belong
    /// to this level.
    pub(crate) fn erase(&mut self, handle: Handle<Order>, orders: &mut OrderPool) {
        let (prev, next, volume) = {
            let order = orders.get(handle);
            (order.prev_order, order.next_order, order.remaining_volume())
        };

        match prev {
            Some(prev_handle) => orders.get_mut(prev_handle).next_order = next,
            None => self.head = next,
        }
        match next {
            Some(next_handle) => orders.get_mut(next_handle).prev_order = prev,
            None => self.tail = prev,
        }

        let order = orders.get_mut(handle);
        order.prev_order = None;
        order.next_order = None;

        self.total_volume -= volume;
        self.order_count -= 1;
    }

    /// Mirrors a fill against this level's aggregate volume. The order's
    /// own remaining volume is tracked separately by `Order::fill`.
    #[inline]
    pub(crate) fn decrease_volume(&mut self, volume: Volume) {
        debug_assert!(volume <= self.total_volume);
        self.total_volume -= volume;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    #[inline]
    pub fn order_count(&self) -> Length {
        self.order_count
    }

    #[inline]
    pub fn total_volume(&self) -> Volume {
        self.total_volume
    }

    /// Oldest order in the queue, the next to match.
    #[inline]
    pub(crate) fn head(&self) -> Option<Handle<Order>> {
        self.head
    }
}
