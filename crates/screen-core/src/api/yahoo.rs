//! Yahoo Finance quoteSummary client

use crate::config::ScreenConfig;
use crate::error::{Result, ScreenError};
use crate::payload::RawPayload;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;

use super::FundamentalsSource;

/// Modules merged into one payload, matching what `Ticker.info` exposes
const MODULES: &str = "summaryDetail,defaultKeyStatistics,financialData,price";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance API client
///
/// quoteSummary needs a session cookie plus a matching crumb. Both are
/// obtained lazily on first use and reused for the lifetime of the client.
#[derive(Debug)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: &ScreenConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.yahoo_base_url.trim_end_matches('/').to_string(),
            cookie_url: config.yahoo_cookie_url.clone(),
            crumb: Mutex::new(None),
        })
    }

    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie endpoint often answers 404 while still setting the cookie.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            tracing::debug!("Cookie request failed: {}", e);
        }

        let response = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScreenError::YahooFinance(format!(
                "crumb request failed: {}",
                response.status()
            )));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ScreenError::YahooFinance("invalid crumb".to_string()));
        }

        tracing::debug!("Obtained Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn reset_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// Fetch the merged quoteSummary modules for a symbol
    pub async fn get_quote_summary(&self, symbol: &str) -> Result<RawPayload> {
        let crumb = self.crumb().await?;

        let response = self
            .client
            .get(format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol))
            .query(&[("modules", MODULES), ("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.reset_crumb().await;
            return Err(ScreenError::YahooFinance(format!("HTTP error: {status}")));
        }
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ScreenError::YahooFinance(format!("HTTP error: {status}")));
        }

        // Unknown symbols come back as 404 with an error body.
        let data: Value = response.json().await?;
        flatten_quote_summary(&data)
    }
}

/// Merge every module of a quoteSummary response into one flat payload.
///
/// Yahoo wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`; only `raw` is kept,
/// and `{}` placeholders become null.
pub fn flatten_quote_summary(data: &Value) -> Result<RawPayload> {
    let summary = &data["quoteSummary"];

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let description = error["description"]
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(ScreenError::YahooFinance(description));
    }

    let modules = summary["result"]
        .get(0)
        .and_then(Value::as_object)
        .ok_or_else(|| ScreenError::YahooFinance("No quote summary in response".to_string()))?;

    let mut payload = RawPayload::new();
    for module in modules.values().filter_map(Value::as_object) {
        let mut fields = RawPayload::new();
        for (key, value) in module {
            let value = match value {
                Value::Object(obj) => obj.get("raw").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            fields.insert(key.clone(), value);
        }
        payload.merge_missing(fields);
    }

    Ok(payload)
}

#[async_trait]
impl FundamentalsSource for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "Yahoo Finance"
    }

    async fn fetch(&self, symbol: &str) -> Result<RawPayload> {
        self.get_quote_summary(symbol).await
    }
}
