//! Error types for stock screening operations

use thiserror::Error;

/// Message shown to users whenever no data could be fetched for a ticker
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data. Please check the ticker symbol.";

/// Stock screening errors
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Empty or otherwise unusable ticker symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The primary data source returned nothing usable for the symbol
    #[error("Failed to fetch data for {symbol}: {reason}")]
    FetchFailed {
        symbol: String,
        reason: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access error (rule tables)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantage(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ScreenError {
    /// Whether the error means "no data available" for the requested ticker
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            ScreenError::FetchFailed { .. }
                | ScreenError::Network(_)
                | ScreenError::YahooFinance(_)
                | ScreenError::AlphaVantage(_)
                | ScreenError::RateLimitExceeded { .. }
        )
    }

    /// Text suitable for end users; fetch problems collapse to one message.
    pub fn user_message(&self) -> String {
        if self.is_fetch_failure() {
            FETCH_FAILED_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Result type alias for screening operations
pub type Result<T> = std::result::Result<T, ScreenError>;
