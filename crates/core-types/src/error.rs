// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown period unit in '{token}' (expected a d, m, min or wk suffix)")]
    UnknownUnit { token: String },

    #[error("Invalid period count in '{token}': must be a positive integer with a representable lookback")]
    InvalidPeriod { token: String },

    #[error("Price series is not strictly chronological at index {index}")]
    UnorderedSeries { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
