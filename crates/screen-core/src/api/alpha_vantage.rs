//! Alpha Vantage API client

use crate::config::ScreenConfig;
use crate::error::{Result, ScreenError};
use crate::normalizer::fields;
use crate::payload::RawPayload;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::FundamentalsSource;

const PROVIDER: &str = "Alpha Vantage";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

/// Company overview data
///
/// Alpha Vantage reports every number as a string, using `"None"` or `"-"`
/// when it has no value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyOverview {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "MarketCapitalization", default)]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio", default)]
    pub pe_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio", default)]
    pub price_to_book: Option<String>,
    #[serde(rename = "PriceToSalesRatioTTM", default)]
    pub price_to_sales: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM", default)]
    pub return_on_equity: Option<String>,
    #[serde(rename = "QuarterlyEarningsGrowthYOY", default)]
    pub quarterly_earnings_growth: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY", default)]
    pub quarterly_revenue_growth: Option<String>,
    #[serde(rename = "GrossProfitTTM", default)]
    pub gross_profit: Option<String>,
    #[serde(rename = "RevenueTTM", default)]
    pub revenue: Option<String>,
}

impl CompanyOverview {
    /// Re-key the overview under Yahoo Finance field names
    pub fn to_payload(&self) -> RawPayload {
        let mut payload = RawPayload::new();
        let pairs = [
            (fields::TRAILING_PE, &self.pe_ratio),
            (fields::PRICE_TO_BOOK, &self.price_to_book),
            (fields::MARKET_CAP, &self.market_cap),
            (fields::PRICE_TO_SALES, &self.price_to_sales),
            (fields::RETURN_ON_EQUITY, &self.return_on_equity),
            (fields::EARNINGS_QUARTERLY_GROWTH, &self.quarterly_earnings_growth),
            (fields::REVENUE_GROWTH, &self.quarterly_revenue_growth),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                payload.insert(key, value.clone());
            }
        }

        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        if let (Some(gross_profit), Some(revenue)) = (parse(&self.gross_profit), parse(&self.revenue)) {
            if revenue != 0.0 {
                payload.insert(fields::GROSS_MARGINS, gross_profit / revenue);
            }
        }

        payload
    }
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `config` - supplies base URL, timeout and requests per minute
    pub fn new(api_key: impl Into<String>, config: &ScreenConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.alpha_vantage_rate_limit).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.alpha_vantage_base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    /// Build a client only when the configuration carries an API key
    pub fn from_config(config: &ScreenConfig) -> Result<Option<Self>> {
        config
            .alpha_vantage_api_key
            .as_ref()
            .map(|key| Self::new(key.clone(), config))
            .transpose()
    }

    /// Get company overview and fundamental data
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let params = [
            ("function", "OVERVIEW"),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];
        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScreenError::AlphaVantage(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;

        // Check for errors
        if let Some(error) = data.get("Error Message") {
            return Err(ScreenError::AlphaVantage(error.to_string()));
        }

        if data.get("Note").is_some() || data.get("Information").is_some() {
            return Err(ScreenError::RateLimitExceeded {
                provider: PROVIDER.to_string(),
            });
        }

        // Check if data is empty (symbol not found)
        if data.as_object().is_none_or(serde_json::Map::is_empty) {
            return Err(ScreenError::InvalidSymbol(symbol.to_string()));
        }

        let overview: CompanyOverview = serde_json::from_value(data)?;
        Ok(overview)
    }
}

#[async_trait]
impl FundamentalsSource for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, symbol: &str) -> Result<RawPayload> {
        let overview = self.get_company_overview(symbol).await?;
        Ok(overview.to_payload())
    }
}
