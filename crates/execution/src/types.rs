// In crates/execution/src/types.rs

use core_types::Symbol;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct PaperSettings {
    /// Starting cash balance of the simulated account.
    pub initial_cash: f64,

    /// The taker fee charged on every fill (e.g., 0.0004 for 0.04%).
    pub taker_fee: f64,

    /// The simulated slippage percentage for market orders (e.g., 0.0005 for 0.05%).
    pub slippage_percent: f64,
}

/// Represents the state of the simulated account.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// Cash available for new positions.
    pub cash: Decimal,

    /// Units held per symbol. Flat symbols are removed.
    pub positions: HashMap<Symbol, Decimal>,
}

impl Portfolio {
    /// Creates a new portfolio with an initial cash balance.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            positions: HashMap::new(),
        }
    }

    pub fn quantity(&self, symbol: &Symbol) -> Decimal {
        self.positions.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }
}
