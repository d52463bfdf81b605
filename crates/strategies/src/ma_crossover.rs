// In crates/strategies/src/ma_crossover.rs

use crate::evaluator::{entry_signal, evaluate};
use crate::{MarketSnapshot, Strategy};
use core_types::{Signal, Variant};
use rust_decimal::Decimal;

/// Fast-vs-slow moving average crossover.
///
/// Exits when the fast average drops below the slow one. Entry optionally
/// demands the opposite arrangement (fast above slow).
#[derive(Debug, Clone, Copy)]
pub struct MACrossover {
    require_entry_crossover: bool,
}

impl MACrossover {
    pub fn new(require_entry_crossover: bool) -> Self {
        Self {
            require_entry_crossover,
        }
    }
}

impl Strategy for MACrossover {
    fn name(&self) -> &'static str {
        "MACrossover"
    }

    fn assess_exit(&self, snapshot: &MarketSnapshot) -> Signal {
        evaluate(
            Variant::DualMa,
            snapshot.price,
            snapshot.averages.primary,
            snapshot.averages.secondary,
        )
    }

    fn assess_entry(&self, snapshot: &MarketSnapshot, capital: Decimal) -> Signal {
        entry_signal(
            Variant::DualMa,
            capital,
            &snapshot.averages,
            self.require_entry_crossover,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MovingAverageResult;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn snapshot(fast: f64, slow: f64) -> MarketSnapshot {
        MarketSnapshot {
            as_of: Utc::now(),
            price: Some(fast),
            last_close: Some(fast),
            averages: MovingAverageResult {
                primary: Some(fast),
                secondary: Some(slow),
            },
        }
    }

    #[test]
    fn bearish_arrangement_exits() {
        let strategy = MACrossover::new(true);
        assert_eq!(strategy.assess_exit(&snapshot(110.0, 120.0)), Signal::Sell);
        assert_eq!(strategy.assess_exit(&snapshot(125.0, 120.0)), Signal::Hold);
    }

    #[test]
    fn entry_strictness_is_configurable() {
        let bearish = snapshot(110.0, 120.0);
        assert_eq!(MACrossover::new(true).assess_entry(&bearish, dec!(100)), Signal::Hold);
        assert_eq!(MACrossover::new(false).assess_entry(&bearish, dec!(100)), Signal::Buy);
    }
}
