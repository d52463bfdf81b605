// In crates/market-data/src/memory.rs

use crate::{Error, MarketDataSource, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{PriceSeries, Resolution, Symbol};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A thread-safe in-memory source, useful for dry runs and tests.
///
/// Series are stored per `(symbol, resolution)` and can be replaced at any
/// time; running loops see the new data on their next fetch.
#[derive(Debug, Default)]
pub struct InMemoryFeed {
    series: RwLock<HashMap<(Symbol, Resolution), PriceSeries>>,
    latest: RwLock<HashMap<Symbol, f64>>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_series(&self, symbol: Symbol, resolution: Resolution, series: PriceSeries) {
        self.series.write().await.insert((symbol, resolution), series);
    }

    pub async fn set_latest_price(&self, symbol: Symbol, price: f64) {
        self.latest.write().await.insert(symbol, price);
    }

    /// Forgets everything stored for `symbol`.
    pub async fn remove_symbol(&self, symbol: &Symbol) {
        self.series.write().await.retain(|(s, _), _| s != symbol);
        self.latest.write().await.remove(symbol);
    }
}

#[async_trait]
impl MarketDataSource for InMemoryFeed {
    fn name(&self) -> &'static str {
        "InMemoryFeed"
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: &Resolution,
    ) -> Result<PriceSeries> {
        let guard = self.series.read().await;
        let stored = guard
            .get(&(symbol.clone(), resolution.clone()))
            .ok_or_else(|| Error::UnknownSymbol {
                symbol: symbol.to_string(),
                resolution: resolution.to_string(),
            })?;

        let points = stored
            .points()
            .iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .copied()
            .collect();
        Ok(PriceSeries::new(points)?)
    }

    async fn latest_price(&self, symbol: &Symbol) -> Result<f64> {
        self.latest
            .read()
            .await
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::NoPrice {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::PricePoint;

    fn hourly(closes: &[f64]) -> PriceSeries {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, close)| PricePoint {
                    timestamp: base + Duration::hours(i as i64),
                    close: *close,
                })
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_filters_by_inclusive_range() {
        let feed = InMemoryFeed::new();
        let symbol = Symbol("AAPL".to_string());
        let resolution = Resolution("1h".to_string());
        feed.insert_series(symbol.clone(), resolution.clone(), hourly(&[1.0, 2.0, 3.0, 4.0]))
            .await;

        let start = Utc.with_ymd_and_hms(2024, 6, 3, 1, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 3, 2, 0, 0).unwrap();
        let series = feed.fetch(&symbol, start, end, &resolution).await.unwrap();
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn unknown_keys_are_errors() {
        let feed = InMemoryFeed::new();
        let symbol = Symbol("MSFT".to_string());
        let now = Utc::now();

        let err = feed
            .fetch(&symbol, now - Duration::days(1), now, &Resolution::finest())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol { .. }));
        assert!(matches!(
            feed.latest_price(&symbol).await,
            Err(Error::NoPrice { .. })
        ));
    }

    #[tokio::test]
    async fn latest_price_can_be_updated() {
        let feed = InMemoryFeed::new();
        let symbol = Symbol("ETH-USD".to_string());
        feed.set_latest_price(symbol.clone(), 2500.0).await;
        feed.set_latest_price(symbol.clone(), 2510.5).await;
        assert_eq!(feed.latest_price(&symbol).await.unwrap(), 2510.5);

        feed.remove_symbol(&symbol).await;
        assert!(feed.latest_price(&symbol).await.is_err());
    }
}
