//! Tick/decimal price conversion.
//!
//! The engine works in integer ticks end-to-end; decimals only exist at the
//! display boundary (harness output, logs). One tick is 0.01, so tick 10_005
//! reads as `100.05`.
//!
//! ```
//! use lobcore::types::price::{from_ticks, to_ticks};
//!
//! assert_eq!(to_ticks("100.05"), Some(10_005));
//! assert_eq!(from_ticks(10_005).to_string(), "100.05");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::types::Price;

/// Ticks per currency unit (tick size 0.01).
pub const TICKS_PER_UNIT: u32 = 100;

/// Parses a decimal string into ticks.
///
/// Returns `None` for unparseable input, negative values, or values that do
/// not fit in [`Price`]. Sub-tick input is rounded to the nearest tick.
pub fn to_ticks(s: &str) -> Option<Price> {
    let value = Decimal::from_str(s).ok()?;
    decimal_to_ticks(value)
}

/// Converts a [`Decimal`] into ticks.
pub fn decimal_to_ticks(value: Decimal) -> Option<Price> {
    if value.is_sign_negative() {
        return None;
    }
    let scaled = value.checked_mul(Decimal::from(TICKS_PER_UNIT))?;
    scaled.round_dp(0).to_u32()
}

/// Converts ticks back into a [`Decimal`] price.
pub fn from_ticks(ticks: Price) -> Decimal {
    Decimal::from(ticks) / Decimal::from(TICKS_PER_UNIT)
}
