//! Rounding rules shared by every computed figure.
//!
//! Monetary amounts and ratios carry two decimals, percentages one.

use rust_decimal::{Decimal, RoundingStrategy};

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_pct(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole × 100`, or zero when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) / Decimal::from(whole) * Decimal::ONE_HUNDRED
}
