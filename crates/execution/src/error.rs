// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Order rejected: {reason}")]
    Rejected { reason: String },

    #[error("Unusable price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("Market data error: {0}")]
    MarketData(#[from] market_data::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
