//! Period tokens such as `15m`, `15min`, `1d` or `2wk`.
//!
//! A token names both how far back to fetch history and how many samples the
//! moving average spans: `15m` means "fetch the last 15 minutes" and "average
//! over 15 samples".

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Days,
    Minutes,
    Weeks,
}

impl PeriodUnit {
    fn suffix(&self) -> &'static str {
        match self {
            PeriodUnit::Days => "d",
            PeriodUnit::Minutes => "m",
            PeriodUnit::Weeks => "wk",
        }
    }
}

// Longest suffix first: "15min" must never be read through the bare "m".
const SUFFIXES: [(&str, PeriodUnit); 4] = [
    ("min", PeriodUnit::Minutes),
    ("wk", PeriodUnit::Weeks),
    ("d", PeriodUnit::Days),
    ("m", PeriodUnit::Minutes),
];

/// A parsed period token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodSpec {
    pub unit: PeriodUnit,
    pub count: u32,
}

impl PeriodSpec {
    /// Parses a token like `15m`, `15min`, `1d` or `2wk`.
    pub fn parse(token: &str) -> Result<Self> {
        let trimmed = token.trim();

        let (digits, unit) = SUFFIXES
            .iter()
            .find_map(|(suffix, unit)| trimmed.strip_suffix(suffix).map(|rest| (rest, *unit)))
            .ok_or_else(|| Error::UnknownUnit {
                token: token.to_string(),
            })?;

        let invalid = || Error::InvalidPeriod {
            token: token.to_string(),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u32 = digits.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        // Any `now` after the epoch can then step back by the full lookback.
        let spec = Self { unit, count };
        spec.lookback_start(DateTime::UNIX_EPOCH).map_err(|_| invalid())?;
        Ok(spec)
    }

    /// The number of samples the moving average spans.
    pub fn window(&self) -> usize {
        self.count as usize
    }

    /// `count` units of wall-clock time.
    pub fn lookback(&self) -> Result<Duration> {
        let count = i64::from(self.count);
        match self.unit {
            PeriodUnit::Days => Duration::try_days(count),
            PeriodUnit::Minutes => Duration::try_minutes(count),
            PeriodUnit::Weeks => Duration::try_weeks(count),
        }
        .ok_or_else(|| self.out_of_range())
    }

    /// The start of the history needed at `now`.
    pub fn lookback_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_sub_signed(self.lookback()?).ok_or_else(|| self.out_of_range())
    }

    fn out_of_range(&self) -> Error {
        Error::InvalidPeriod {
            token: self.to_string(),
        }
    }
}

impl FromStr for PeriodSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PeriodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec(unit: PeriodUnit, count: u32) -> PeriodSpec {
        PeriodSpec { unit, count }
    }

    #[test]
    fn parses_every_supported_suffix() {
        assert_eq!(PeriodSpec::parse("15m"), Ok(spec(PeriodUnit::Minutes, 15)));
        assert_eq!(PeriodSpec::parse("1d"), Ok(spec(PeriodUnit::Days, 1)));
        assert_eq!(PeriodSpec::parse("2wk"), Ok(spec(PeriodUnit::Weeks, 2)));
    }

    #[test]
    fn min_suffix_wins_over_bare_m() {
        // Substring matching on "m" first would leave "15in" behind.
        assert_eq!(PeriodSpec::parse("15min"), Ok(spec(PeriodUnit::Minutes, 15)));
        assert_eq!(PeriodSpec::parse("15min"), PeriodSpec::parse("15m"));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(PeriodSpec::parse(" 5d\n"), Ok(spec(PeriodUnit::Days, 5)));
    }

    #[test]
    fn rejects_unknown_units() {
        for token in ["15h", "abc", "", "15", "15mins", "2w"] {
            assert!(
                matches!(PeriodSpec::parse(token), Err(Error::UnknownUnit { .. })),
                "token {token:?} should be an unknown unit"
            );
        }
    }

    #[test]
    fn rejects_bad_counts() {
        for token in ["d", "0d", "xd", "-1d", "+3m", "1.5wk", "1 d"] {
            assert!(
                matches!(PeriodSpec::parse(token), Err(Error::InvalidPeriod { .. })),
                "token {token:?} should be an invalid period"
            );
        }
    }

    #[test]
    fn lookback_matches_unit_duration() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        let minutes = PeriodSpec::parse("15m").unwrap();
        assert_eq!(minutes.lookback_start(now), Ok(now - Duration::minutes(15)));

        let days = PeriodSpec::parse("3d").unwrap();
        assert_eq!(days.lookback_start(now), Ok(now - Duration::hours(72)));

        let weeks = PeriodSpec::parse("2wk").unwrap();
        assert_eq!(weeks.lookback_start(now), Ok(now - Duration::days(14)));
    }

    #[test]
    fn rejects_lookbacks_past_the_calendar() {
        // Roughly 274,000 years, beyond the representable date range.
        for token in ["100000000d", "4000000000d", "20000000wk"] {
            assert!(
                matches!(PeriodSpec::parse(token), Err(Error::InvalidPeriod { .. })),
                "token {token:?} should be an invalid period"
            );
        }
        // Large but representable.
        assert_eq!(PeriodSpec::parse("4000000000m"), Ok(spec(PeriodUnit::Minutes, 4_000_000_000)));
    }

    #[test]
    fn oversized_spec_has_no_lookback_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let huge = spec(PeriodUnit::Days, 100_000_000);
        assert!(matches!(huge.lookback_start(now), Err(Error::InvalidPeriod { .. })));
        assert!(huge.lookback().is_ok());
    }

    #[test]
    fn displays_canonical_token() {
        assert_eq!(PeriodSpec::parse("15min").unwrap().to_string(), "15m");
        assert_eq!(PeriodSpec::parse("2wk").unwrap().to_string(), "2wk");
        assert_eq!(PeriodSpec::parse("15m").unwrap().window(), 15);
    }
}
