// In crates/core-types/src/types.rs

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable instrument as the operator typed it (e.g., "AAPL", "ETH-USD").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The bar size requested from a market data source (e.g., "1m", "15m", "1d").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution(pub String);

impl Resolution {
    /// The finest resolution, used for "latest observed price" queries.
    pub fn finest() -> Self {
        Self("1m".to_string())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single closing-price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Chronologically ordered closes with no duplicate timestamps.
///
/// Series are never mutated after construction; derived values are computed
/// into new scalars or series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(Error::UnorderedSeries { index: index + 1 });
        }
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.points.iter().map(|p| p.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }
}

/// The outcome of evaluating the market for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    /// A required input was unavailable; the tick is skipped.
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// How a market order is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSize {
    /// Spend this much quote currency.
    Notional(Decimal),
    /// Trade this many units (fractional allowed).
    Quantity(Decimal),
}

/// The broker's acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub size: OrderSize,
    /// Filled quantity when the broker reports it synchronously.
    pub filled_quantity: Option<Decimal>,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(minute: i64, close: f64) -> PricePoint {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        PricePoint {
            timestamp: base + Duration::minutes(minute),
            close,
        }
    }

    #[test]
    fn accepts_chronological_points() {
        let series = PriceSeries::new(vec![point(0, 1.0), point(1, 2.0), point(5, 3.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_close(), Some(3.0));
        assert_eq!(series.closes().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = PriceSeries::new(vec![point(0, 1.0), point(1, 2.0), point(1, 2.5)]).unwrap_err();
        assert_eq!(err, Error::UnorderedSeries { index: 2 });
    }

    #[test]
    fn rejects_backwards_timestamps() {
        let err = PriceSeries::new(vec![point(3, 1.0), point(2, 2.0)]).unwrap_err();
        assert_eq!(err, Error::UnorderedSeries { index: 1 });
    }

    #[test]
    fn empty_series_has_no_last_close() {
        let series = PriceSeries::empty();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }
}
