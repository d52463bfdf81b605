//! Trailing simple moving averages.
//!
//! Only full windows count: a series shorter than the window has no average.

use crate::types::MovingAverageResult;
use core_types::PriceSeries;
use ta::Next;
use ta::indicators::SimpleMovingAverage as Sma;

/// The mean of the last `window` closes, or `None` if the series is too short.
pub fn compute(series: &PriceSeries, window: usize) -> Option<f64> {
    if window == 0 || series.len() < window {
        return None;
    }

    let mut sma = Sma::new(window).ok()?;
    let mut latest = None;
    for close in series.closes().skip(series.len() - window) {
        latest = Some(sma.next(close));
    }
    latest.filter(|value| value.is_finite())
}

/// Computes the primary average and, when requested, the secondary one.
///
/// Each leg names its own series so both averages can share one fetch or use
/// two fetched at different resolutions.
pub fn compute_pair(
    primary: (&PriceSeries, usize),
    secondary: Option<(&PriceSeries, usize)>,
) -> MovingAverageResult {
    MovingAverageResult {
        primary: compute(primary.0, primary.1),
        secondary: secondary.and_then(|(series, window)| compute(series, window)),
    }
}
