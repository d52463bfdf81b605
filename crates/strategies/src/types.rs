// In crates/strategies/src/types.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest values of the single (or fast) and the slow moving average.
///
/// `None` means the underlying series was shorter than the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MovingAverageResult {
    pub primary: Option<f64>,
    pub secondary: Option<f64>,
}

/// Everything a strategy looks at for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub as_of: DateTime<Utc>,
    /// The price the exit rule compares against; `None` when it could not
    /// be observed.
    pub price: Option<f64>,
    /// The newest close of the primary series. Entry orders are sized on it.
    pub last_close: Option<f64>,
    pub averages: MovingAverageResult,
}
