//! # lobcore
//!
//! Single-instrument limit order book matching engine.
//!
//! ## Architecture
//!
//! - **Types**: `Order`, `Trade`, scalar aliases, tick/decimal conversion
//! - **Mem**: `SlabPool` (pooled slot allocator) and `FlatHashMap`
//!   (open-addressing map), the two hot-path memory primitives
//! - **OrderBook**: `Level` (FIFO price level) and `Book` (the matching
//!   engine)
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical message streams produce identical trades
//! 2. **No allocation on the hot path**: orders and levels come from pools,
//!    lookups go through pre-sized open-addressing maps
//! 3. **Single-threaded**: every operation runs to completion; callers
//!    needing multiple producers serialize externally
//! 4. **Price-time priority**: best price first, FIFO within a price
//!
//! ## Example
//!
//! ```
//! use lobcore::{Book, Side};
//!
//! let mut book = Book::with_capacity(10_000);
//!
//! book.place_order(1, 100, Side::Sell, 1_005, 30);
//! let trades = book.place_order(2, 101, Side::Buy, 1_005, 50);
//!
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].trade_volume, 30);
//! assert_eq!(book.get_best_buy(), 1_005); // residual 20 rests
//! assert_eq!(book.get_best_sell(), 0);
//! ```

pub mod types;

pub mod mem;

pub mod orderbook;

pub use types::{Id, Length, Order, OrderStatus, Price, Side, Trade, Volume};
pub use mem::{FlatHashMap, Handle, IntKey, SlabPool};
pub use orderbook::{Book, Level};
