//! Fundamentals providers
//!
//! Each provider turns a ticker into a [`RawPayload`] keyed by Yahoo Finance
//! field names, so the normalizer can treat every source alike.

pub mod alpha_vantage;
pub mod yahoo;

pub use alpha_vantage::{AlphaVantageClient, CompanyOverview};
pub use yahoo::YahooFinanceClient;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::payload::RawPayload;

/// A source of raw fundamentals for one ticker
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Fetch the raw field bag for `symbol`
    async fn fetch(&self, symbol: &str) -> Result<RawPayload>;
}
