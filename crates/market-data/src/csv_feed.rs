//! File-backed market data.
//!
//! Each `(symbol, resolution)` pair lives in its own file named
//! `<SYMBOL>_<resolution>.csv` with a `timestamp,close` header and RFC 3339
//! timestamps. Files are re-read on every call so an external recorder can
//! keep appending bars while loops are running.
//!
//! In replay mode a file's newest bar is treated as if it closed at the end
//! of the requested range, so recorded history can drive a live loop.

use crate::{Error, MarketDataSource, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use core_types::{PricePoint, PriceSeries, Resolution, Symbol};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct Row {
    timestamp: DateTime<Utc>,
    close: f64,
}

#[derive(Debug, Clone)]
pub struct CsvFeed {
    data_dir: PathBuf,
    latest_resolution: Resolution,
    replay: bool,
}

impl CsvFeed {
    /// `latest_resolution` names the file `latest_price` reads its last row from.
    pub fn new(data_dir: impl Into<PathBuf>, latest_resolution: Resolution) -> Self {
        Self {
            data_dir: data_dir.into(),
            latest_resolution,
            replay: false,
        }
    }

    /// Shifts every fetched series so its newest bar lands on the range end.
    pub fn replaying(mut self) -> Self {
        self.replay = true;
        self
    }

    fn csv_path(&self, symbol: &Symbol, resolution: &Resolution) -> PathBuf {
        self.data_dir.join(format!("{}_{}.csv", symbol, resolution))
    }

    async fn read_points(&self, symbol: &Symbol, resolution: &Resolution) -> Result<Vec<PricePoint>> {
        let path = self.csv_path(symbol, resolution);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::UnknownSymbol {
                    symbol: symbol.to_string(),
                    resolution: resolution.to_string(),
                });
            }
            Err(source) => return Err(Error::Io { path, source }),
        };

        let points = parse_rows(&path, &content)?;
        tracing::debug!(
            path = %path.display(),
            rows = points.len(),
            "Loaded price file."
        );
        Ok(points)
    }
}

fn parse_rows(path: &Path, content: &[u8]) -> Result<Vec<PricePoint>> {
    let mut rdr = csv::Reader::from_reader(content);
    let mut points = Vec::new();
    for result in rdr.deserialize::<Row>() {
        let row = result.map_err(|e| Error::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        points.push(PricePoint {
            timestamp: row.timestamp,
            close: row.close,
        });
    }
    // Recorders append in arrival order; tolerate small reorderings.
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

/// Moves sorted `points` so the last one sits at `end`, dropping any that
/// fall outside the calendar.
fn shift_to(points: Vec<PricePoint>, end: DateTime<Utc>) -> Vec<PricePoint> {
    let offset: TimeDelta = match points.last() {
        Some(last) => end - last.timestamp,
        None => return points,
    };
    points
        .into_iter()
        .filter_map(|p| {
            Some(PricePoint {
                timestamp: p.timestamp.checked_add_signed(offset)?,
                close: p.close,
            })
        })
        .collect()
}

#[async_trait]
impl MarketDataSource for CsvFeed {
    fn name(&self) -> &'static str {
        "CsvFeed"
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: &Resolution,
    ) -> Result<PriceSeries> {
        let mut points = self.read_points(symbol, resolution).await?;
        if self.replay {
            points = shift_to(points, end);
        }
        let points = points
            .into_iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .collect();
        Ok(PriceSeries::new(points)?)
    }

    async fn latest_price(&self, symbol: &Symbol) -> Result<f64> {
        let points = self.read_points(symbol, &self.latest_resolution).await?;
        points
            .last()
            .map(|p| p.close)
            .ok_or_else(|| Error::NoPrice {
                symbol: symbol.to_string(),
            })
    }
}
