//! Price feed types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single daily OHLC bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open timestamp in epoch milliseconds
    pub ts_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// Price feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-success HTTP response
    #[error("feed returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Endpoint exists but does not cover this pair or period
    #[error("endpoint not supported: {0}")]
    Unsupported(String),
    /// Response parsed but did not contain the expected data
    #[error("unexpected feed payload: {0}")]
    Malformed(String),
}

impl FeedError {
    /// Whether a retry has any chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Network(_) => true,
            FeedError::Status { status, .. } => *status == 429 || *status >= 500,
            FeedError::Unsupported(_) | FeedError::Malformed(_) => false,
        }
    }
}
