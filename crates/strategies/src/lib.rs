// In crates/strategies/src/lib.rs

use core_types::Signal;
use rust_decimal::Decimal;

pub mod evaluator;
pub mod factory;
pub mod ma_crossover;
pub mod moving_average;
pub mod price_vs_ma;
pub mod types;

pub use evaluator::{entry_signal, evaluate};
pub use factory::create_strategy;
pub use types::{MarketSnapshot, MovingAverageResult};

/// The universal interface for a trading strategy.
///
/// A strategy turns a `MarketSnapshot` into a `Signal`. It carries no memory of
/// earlier ticks: the trading loop, not the strategy, tracks whether a position
/// is held.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// Decides whether the position should be exited. Yields `Sell`, `Hold`
    /// or `NoData`.
    fn assess_exit(&self, snapshot: &MarketSnapshot) -> Signal;

    /// Decides whether a buy is allowed with `capital` available. Yields `Buy`,
    /// `Hold` or `NoData`; operator confirmation is applied by the caller.
    fn assess_entry(&self, snapshot: &MarketSnapshot, capital: Decimal) -> Signal;
}
