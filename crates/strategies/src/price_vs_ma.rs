// In crates/strategies/src/price_vs_ma.rs

use crate::evaluator::{entry_signal, evaluate};
use crate::{MarketSnapshot, Strategy};
use core_types::{Signal, Variant};
use rust_decimal::Decimal;

/// Compares one moving average against the latest observed price.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriceVsMa;

impl PriceVsMa {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for PriceVsMa {
    fn name(&self) -> &'static str {
        "PriceVsMovingAverage"
    }

    fn assess_exit(&self, snapshot: &MarketSnapshot) -> Signal {
        evaluate(
            Variant::SingleMa,
            snapshot.price,
            snapshot.averages.primary,
            None,
        )
    }

    fn assess_entry(&self, snapshot: &MarketSnapshot, capital: Decimal) -> Signal {
        entry_signal(Variant::SingleMa, capital, &snapshot.averages, false)
    }
}
