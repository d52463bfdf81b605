// In crates/market-data/src/lib.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{PriceSeries, Resolution, Symbol};

pub mod csv_feed;
pub mod error;
pub mod memory;

pub use csv_feed::CsvFeed;
pub use error::{Error, Result};
pub use memory::InMemoryFeed;

/// A source of historical closes and current prices.
///
/// Implementations are shared between independently running loops, so every
/// method takes `&self` and must tolerate concurrent calls.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// The name of the source (e.g., "CsvFeed").
    fn name(&self) -> &'static str;

    /// Closes for `symbol` with timestamps in `[start, end]`, oldest first.
    ///
    /// An empty series is a valid answer; callers decide what it means.
    async fn fetch(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: &Resolution,
    ) -> Result<PriceSeries>;

    /// The most recently observed price for `symbol`.
    async fn latest_price(&self, symbol: &Symbol) -> Result<f64>;
}
