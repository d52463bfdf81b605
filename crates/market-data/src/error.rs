// In crates/market-data/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No data for {symbol} at resolution {resolution}")]
    UnknownSymbol { symbol: String, resolution: String },

    #[error("No latest price available for {symbol}")]
    NoPrice { symbol: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid price series: {0}")]
    Series(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
