//! Trade record produced by matching.

use std::fmt;

use crate::types::{Id, Price, Volume};

/// A single match between an incoming order and a resting order.
///
/// The trade always executes at the resting (maker) order's price; the
/// incoming (taker) order's limit never dictates the trade price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    /// Id of the incoming (taker) order.
    pub incoming_order: Id,
    /// Id of the resting (maker) order it matched against.
    pub matched_order: Id,
    /// Execution price in ticks: the maker's price.
    pub trade_price: Price,
    /// Executed volume.
    pub trade_volume: Volume,
}

impl Trade {
    #[inline]
    pub fn new(incoming_order: Id, matched_order: Id, trade_price: Price, trade_volume: Volume) -> Self {
        Self {
            incoming_order,
            matched_order,
            trade_price,
            trade_volume,
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trade {} @ {} (incoming {} vs resting {})",
            self.trade_volume, self.trade_price, self.incoming_order, self.matched_order
        )
    }
}
