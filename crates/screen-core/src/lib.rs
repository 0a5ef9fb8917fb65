//! Fundamental stock screening
//!
//! This crate classifies a single ticker against three investing styles
//! (Deep Value, Value and Growth) using fixed thresholds. It includes:
//!
//! - Fundamentals fetching from Yahoo Finance, with Alpha Vantage as an
//!   optional gap-filling source
//! - Normalization of sparse provider fields into a fixed canonical metric set
//! - A declarative rule table evaluated into pass / fail / neutral marks
//! - Table and JSON rendering of the result
//!
//! # Architecture
//!
//! ```text
//! FundamentalsSource ─▶ RawPayload ─▶ Normalizer ─▶ CanonicalMetrics ─▶ Evaluator ─▶ Vec<ResultRow>
//! ```
//!
//! [`Screener`] wires these together. The rule table is built once and handed
//! to the [`Evaluator`]; nothing is shared between screenings.
//!
//! # Example
//!
//! ```rust,ignore
//! use screen_core::{RuleTable, ScreenConfig, Screener};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScreenConfig::default().with_env_api_key();
//!     let screener = Screener::from_config(&config, Arc::new(RuleTable::standard()))?;
//!
//!     let screening = screener.screen("AAPL").await?;
//!     for row in &screening.rows {
//!         println!("{}: {}", row.metric, row.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod formatter;
pub mod metrics;
pub mod normalizer;
pub mod payload;
pub mod rules;
pub mod screener;
pub mod supplement;

// Re-export main types for convenience
pub use api::{AlphaVantageClient, FundamentalsSource, YahooFinanceClient};
pub use cache::{CachedSource, PayloadCache};
pub use config::ScreenConfig;
pub use error::{FETCH_FAILED_MESSAGE, Result, ScreenError};
pub use evaluator::{DisplayValue, Evaluator, Mark, ResultRow, Tally};
pub use formatter::{Formatter, FormatterFactory, OutputFormat};
pub use metrics::{CanonicalMetrics, Metric, MetricValue};
pub use normalizer::{DebtEquityPolicy, Normalizer};
pub use payload::RawPayload;
pub use rules::{Category, Predicate, RuleTable};
pub use screener::{Screener, Screening};
pub use supplement::{PlaceholderMode, SupplementalSource};
