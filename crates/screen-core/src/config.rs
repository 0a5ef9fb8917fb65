//! Configuration for stock screening

use crate::error::{Result, ScreenError};
use crate::metrics::{Metric, MetricValue};
use crate::normalizer::DebtEquityPolicy;
use crate::supplement::{Overrides, PlaceholderMode, SupplementalSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

/// Configuration for stock screening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Request timeout for every upstream call
    pub request_timeout: Duration,

    /// How long fetched payloads stay cached in interactive sessions
    pub cache_ttl: Duration,

    /// Alpha Vantage API key (optional secondary source)
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,

    pub yahoo_base_url: String,

    /// Endpoint that hands out the session cookie needed for a crumb
    pub yahoo_cookie_url: String,

    pub alpha_vantage_base_url: String,

    /// Percent-vs-decimal policy for debt-to-equity
    pub debt_equity: DebtEquityPolicy,

    /// Fallback for metrics with no live source
    pub placeholder_mode: PlaceholderMode,

    /// Explicit values for metrics with no live source
    pub overrides: HashMap<Metric, MetricValue>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(3600), // 1 hour
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5, // free tier
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            yahoo_cookie_url: DEFAULT_YAHOO_COOKIE_URL.to_string(),
            alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_BASE_URL.to_string(),
            debt_equity: DebtEquityPolicy::default(),
            placeholder_mode: PlaceholderMode::Absent,
            overrides: HashMap::new(),
        }
    }
}

impl ScreenConfig {
    /// Create a new configuration builder
    pub fn builder() -> ScreenConfigBuilder {
        ScreenConfigBuilder::default()
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Some(key) = env_api_key() {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(ScreenError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.alpha_vantage_rate_limit == 0 {
            return Err(ScreenError::Config(
                "alpha_vantage_rate_limit must be greater than 0".to_string(),
            ));
        }

        let threshold = self.debt_equity.percent_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ScreenError::Config(format!(
                "debt/equity percent threshold must be a positive number, got {threshold}"
            )));
        }

        if let Some(metric) = self.overrides.keys().find(|m| !m.is_unsourced()) {
            return Err(ScreenError::Config(format!(
                "{metric} comes from market data and cannot be overridden"
            )));
        }

        Ok(())
    }

    /// Supplemental source described by `placeholder_mode` and `overrides`
    pub fn supplemental_source(&self) -> Box<dyn SupplementalSource> {
        let fallback = self.placeholder_mode.source();
        if self.overrides.is_empty() {
            fallback
        } else {
            Box::new(Overrides::new(self.overrides.clone(), fallback))
        }
    }
}

fn env_api_key() -> Option<String> {
    std::env::var("ALPHA_VANTAGE_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Builder for ScreenConfig
#[derive(Debug, Default)]
pub struct ScreenConfigBuilder {
    request_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
    yahoo_base_url: Option<String>,
    yahoo_cookie_url: Option<String>,
    alpha_vantage_base_url: Option<String>,
    debt_equity: Option<DebtEquityPolicy>,
    placeholder_mode: Option<PlaceholderMode>,
    overrides: HashMap<Metric, MetricValue>,
}

impl ScreenConfigBuilder {
    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set cache TTL for fetched payloads
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set Alpha Vantage requests per minute
    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    pub fn yahoo_base_url(mut self, url: impl Into<String>) -> Self {
        self.yahoo_base_url = Some(url.into());
        self
    }

    pub fn yahoo_cookie_url(mut self, url: impl Into<String>) -> Self {
        self.yahoo_cookie_url = Some(url.into());
        self
    }

    pub fn alpha_vantage_base_url(mut self, url: impl Into<String>) -> Self {
        self.alpha_vantage_base_url = Some(url.into());
        self
    }

    /// Raw debt/equity values above this are read as percentages
    pub fn debt_equity_threshold(mut self, threshold: f64) -> Self {
        self.debt_equity = Some(DebtEquityPolicy::new(threshold));
        self
    }

    pub fn placeholder_mode(mut self, mode: PlaceholderMode) -> Self {
        self.placeholder_mode = Some(mode);
        self
    }

    /// Supply a value for a metric with no live source
    pub fn override_metric(mut self, metric: Metric, value: MetricValue) -> Self {
        self.overrides.insert(metric, value);
        self
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Some(key) = env_api_key() {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ScreenConfig> {
        let defaults = ScreenConfig::default();

        let config = ScreenConfig {
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
            yahoo_base_url: self.yahoo_base_url.unwrap_or(defaults.yahoo_base_url),
            yahoo_cookie_url: self.yahoo_cookie_url.unwrap_or(defaults.yahoo_cookie_url),
            alpha_vantage_base_url: self
                .alpha_vantage_base_url
                .unwrap_or(defaults.alpha_vantage_base_url),
            debt_equity: self.debt_equity.unwrap_or(defaults.debt_equity),
            placeholder_mode: self.placeholder_mode.unwrap_or(defaults.placeholder_mode),
            overrides: self.overrides,
        };

        config.validate()?;
        Ok(config)
    }
}
