//! Fetch → normalize → evaluate for a single ticker

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::api::{AlphaVantageClient, FundamentalsSource, YahooFinanceClient};
use crate::config::ScreenConfig;
use crate::error::{Result, ScreenError};
use crate::evaluator::{Evaluator, ResultRow, Tally};
use crate::metrics::CanonicalMetrics;
use crate::normalizer::{Normalizer, fields};
use crate::payload::RawPayload;
use crate::rules::{Category, RuleTable};

/// Outcome of screening one ticker
#[derive(Debug, Clone, Serialize)]
pub struct Screening {
    pub symbol: String,
    pub fetched_at: DateTime<Utc>,
    pub metrics: CanonicalMetrics,
    pub rows: Vec<ResultRow>,
}

impl Screening {
    pub fn tally(&self, category: Category) -> Tally {
        Tally::of(&self.rows, category)
    }
}

/// Screens tickers against an injected rule table
pub struct Screener {
    primary: Arc<dyn FundamentalsSource>,
    secondary: Option<Arc<dyn FundamentalsSource>>,
    normalizer: Normalizer,
    evaluator: Evaluator,
}

impl Screener {
    pub fn new(
        primary: Arc<dyn FundamentalsSource>,
        normalizer: Normalizer,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            primary,
            secondary: None,
            normalizer,
            evaluator,
        }
    }

    /// Add a source whose fields fill gaps left by the primary one
    pub fn with_secondary(mut self, source: Arc<dyn FundamentalsSource>) -> Self {
        self.secondary = Some(source);
        self
    }

    /// Yahoo Finance as primary, Alpha Vantage as secondary when a key is set
    pub fn from_config(config: &ScreenConfig, rules: Arc<RuleTable>) -> Result<Self> {
        let primary: Arc<dyn FundamentalsSource> = Arc::new(YahooFinanceClient::new(config)?);
        Self::with_primary(primary, config, rules)
    }

    /// Like [`Screener::from_config`] but with a caller-supplied primary source
    pub fn with_primary(
        primary: Arc<dyn FundamentalsSource>,
        config: &ScreenConfig,
        rules: Arc<RuleTable>,
    ) -> Result<Self> {
        config.validate()?;
        let normalizer = Normalizer::new(config.debt_equity, config.supplemental_source());
        let mut screener = Self::new(primary, normalizer, Evaluator::new(rules));

        match AlphaVantageClient::from_config(config)? {
            Some(client) => screener = screener.with_secondary(Arc::new(client)),
            None => tracing::info!("No Alpha Vantage API key configured, using primary source only"),
        }

        Ok(screener)
    }

    /// Screen one ticker.
    ///
    /// Fails only when the symbol is empty or the primary source has no data.
    pub async fn screen(&self, symbol: &str) -> Result<Screening> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ScreenError::InvalidSymbol(symbol));
        }

        let payload = self.fetch(&symbol).await?;
        log_diagnostic_fields(&symbol, &payload);

        let metrics = self.normalizer.normalize(&payload);
        let rows = self.evaluator.evaluate(&metrics);
        tracing::info!(
            symbol = %symbol,
            present = metrics.present_count(),
            "Screening complete"
        );

        Ok(Screening {
            symbol,
            fetched_at: Utc::now(),
            metrics,
            rows,
        })
    }

    async fn fetch(&self, symbol: &str) -> Result<RawPayload> {
        tracing::info!("Fetching fundamentals for {} from {}", symbol, self.primary.name());

        let mut payload = self.primary.fetch(symbol).await.map_err(|e| {
            tracing::warn!("{} fetch failed for {}: {}", self.primary.name(), symbol, e);
            ScreenError::FetchFailed {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(secondary) = &self.secondary {
            match secondary.fetch(symbol).await {
                Ok(extra) => {
                    tracing::debug!("Merging {} fields from {}", extra.len(), secondary.name());
                    payload.merge_missing(extra);
                }
                Err(e) => {
                    tracing::warn!("{} fetch failed for {}, ignoring: {}", secondary.name(), symbol, e);
                }
            }
        }

        Ok(payload)
    }
}

fn log_diagnostic_fields(symbol: &str, payload: &RawPayload) {
    for key in fields::DIAGNOSTIC {
        match payload.get(key) {
            Some(value) => tracing::debug!("{} - {}: {}", symbol, key, value),
            None => tracing::debug!("{} - {}: missing", symbol, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockFundamentalsSource;
    use crate::evaluator::Mark;
    use crate::metrics::Metric;
    use crate::supplement::PlaceholderMode;

    fn source_returning(payload: RawPayload) -> MockFundamentalsSource {
        let mut source = MockFundamentalsSource::new();
        source.expect_name().return_const("Mock");
        source.expect_fetch().returning(move |_| Ok(payload.clone()));
        source
    }

    fn failing_source() -> MockFundamentalsSource {
        let mut source = MockFundamentalsSource::new();
        source.expect_name().return_const("Failing");
        source
            .expect_fetch()
            .returning(|_| Err(ScreenError::YahooFinance("Quote not found".to_string())));
        source
    }

    fn screener(primary: MockFundamentalsSource) -> Screener {
        Screener::new(Arc::new(primary), Normalizer::default(), Evaluator::default())
    }

    #[tokio::test]
    async fn test_screen_normalizes_symbol() {
        let mut source = MockFundamentalsSource::new();
        source.expect_name().return_const("Mock");
        source
            .expect_fetch()
            .withf(|symbol| symbol == "AAPL")
            .times(1)
            .returning(|_| Ok(RawPayload::new()));

        let screening = screener(source).screen("  aapl ").await.unwrap();
        assert_eq!(screening.symbol, "AAPL");
        assert_eq!(screening.rows.len(), Metric::COUNT);
    }

    #[tokio::test]
    async fn test_empty_symbol_is_rejected_without_fetch() {
        let mut source = MockFundamentalsSource::new();
        source.expect_fetch().never();

        let err = screener(source).screen("   ").await.unwrap_err();
        assert!(matches!(err, ScreenError::InvalidSymbol(_)));
    }

    #[tokio::test]
    async fn test_primary_failure_becomes_fetch_failure() {
        let err = screener(failing_source()).screen("ZZZZ").await.unwrap_err();
        match &err {
            ScreenError::FetchFailed { symbol, reason } => {
                assert_eq!(symbol, "ZZZZ");
                assert!(reason.contains("Quote not found"));
            }
            other => panic!("Expected FetchFailed, got {other:?}"),
        }
        assert_eq!(err.user_message(), crate::error::FETCH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_secondary_fills_gaps() {
        let primary = source_returning(RawPayload::new().with("trailingPE", 7.5));
        let secondary = source_returning(
            RawPayload::new()
                .with("trailingPE", 50.0)
                .with("priceToBook", "0.9"),
        );

        let screening = screener(primary)
            .with_secondary(Arc::new(secondary))
            .screen("TEST")
            .await
            .unwrap();

        assert_eq!(screening.metrics.get(Metric::Pe), Some(7.5.into()));
        assert_eq!(screening.metrics.get(Metric::Pb), Some(0.9.into()));
    }

    #[tokio::test]
    async fn test_secondary_failure_is_ignored() {
        let primary = source_returning(RawPayload::new().with("trailingPE", 7.5));

        let screening = screener(primary)
            .with_secondary(Arc::new(failing_source()))
            .screen("TEST")
            .await
            .unwrap();

        assert_eq!(screening.metrics.get(Metric::Pe), Some(7.5.into()));
    }

    #[tokio::test]
    async fn test_with_primary_uses_config() {
        let config = ScreenConfig::builder()
            .placeholder_mode(PlaceholderMode::Legacy)
            .build()
            .unwrap();
        let primary = source_returning(RawPayload::new());
        let screener =
            Screener::with_primary(Arc::new(primary), &config, Arc::new(RuleTable::standard())).unwrap();
        assert!(screener.secondary.is_none());

        let screening = screener.screen("TEST").await.unwrap();
        let moat = screening.rows.iter().find(|r| r.metric == Metric::Moat).unwrap();
        assert_eq!(moat.growth, Mark::Pass);
        assert_eq!(screening.tally(Category::Growth).passed, 4);
    }

    #[tokio::test]
    async fn test_with_primary_adds_alpha_vantage_when_keyed() {
        let config = ScreenConfig::builder()
            .alpha_vantage_api_key("test_key")
            .build()
            .unwrap();
        let screener = Screener::with_primary(
            Arc::new(source_returning(RawPayload::new())),
            &config,
            Arc::new(RuleTable::standard()),
        )
        .unwrap();
        assert!(screener.secondary.is_some());
    }
}
