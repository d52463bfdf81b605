//! Pure signal rules shared by the strategy implementations.

use crate::types::MovingAverageResult;
use core_types::{Signal, Variant};
use rust_decimal::Decimal;

fn available(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Classifies the exit state of the market.
///
/// * `SingleMa`: `Sell` when the average sits below the price. This polarity
///   is kept as observed in the field and is not the textbook
///   "price crosses below its average" rule.
/// * `DualMa`: `Sell` when the fast (primary) average is below the slow
///   (secondary) one.
///
/// Any missing or non-finite operand the variant needs gives `NoData`.
pub fn evaluate(
    variant: Variant,
    price: Option<f64>,
    ma_primary: Option<f64>,
    ma_secondary: Option<f64>,
) -> Signal {
    let (lhs, rhs) = match variant {
        Variant::SingleMa => (available(ma_primary), available(price)),
        Variant::DualMa => (available(ma_primary), available(ma_secondary)),
    };
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) if lhs < rhs => Signal::Sell,
        (Some(_), Some(_)) => Signal::Hold,
        _ => Signal::NoData,
    }
}

/// Decides whether a buy is permitted before operator confirmation.
///
/// Requires positive capital. In dual mode with `require_crossover`, the fast
/// average must also be strictly above the slow one.
pub fn entry_signal(
    variant: Variant,
    capital: Decimal,
    averages: &MovingAverageResult,
    require_crossover: bool,
) -> Signal {
    if capital <= Decimal::ZERO {
        return Signal::Hold;
    }
    if variant == Variant::SingleMa || !require_crossover {
        return Signal::Buy;
    }
    match (available(averages.primary), available(averages.secondary)) {
        (Some(fast), Some(slow)) if fast > slow => Signal::Buy,
        (Some(_), Some(_)) => Signal::Hold,
        _ => Signal::NoData,
    }
}
