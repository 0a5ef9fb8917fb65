//! Maps raw provider fields onto the canonical metric set
//!
//! Normalization never fails: a field that is missing, malformed, or whose
//! derivation would divide by zero simply becomes absent.

use serde::{Deserialize, Serialize};

use crate::metrics::{CanonicalMetrics, Metric, MetricValue};
use crate::payload::RawPayload;
use crate::supplement::{NoSupplement, SupplementalSource};

/// Upstream field names, as reported by Yahoo Finance
pub mod fields {
    pub const TRAILING_PE: &str = "trailingPE";
    pub const PRICE_TO_BOOK: &str = "priceToBook";
    pub const DEBT_TO_EQUITY: &str = "debtToEquity";
    pub const FREE_CASHFLOW: &str = "freeCashflow";
    pub const MARKET_CAP: &str = "marketCap";
    pub const CURRENT_RATIO: &str = "currentRatio";
    pub const PRICE_TO_SALES: &str = "priceToSalesTrailing12Months";
    pub const RETURN_ON_EQUITY: &str = "returnOnEquity";
    pub const EARNINGS_QUARTERLY_GROWTH: &str = "earningsQuarterlyGrowth";
    pub const REVENUE_GROWTH: &str = "revenueGrowth";
    pub const EARNINGS_GROWTH: &str = "earningsGrowth";
    pub const GROSS_MARGINS: &str = "grossMargins";

    /// Fields worth echoing when debugging a screening
    pub const DIAGNOSTIC: [&str; 12] = [
        TRAILING_PE,
        PRICE_TO_BOOK,
        DEBT_TO_EQUITY,
        FREE_CASHFLOW,
        MARKET_CAP,
        CURRENT_RATIO,
        PRICE_TO_SALES,
        RETURN_ON_EQUITY,
        EARNINGS_QUARTERLY_GROWTH,
        REVENUE_GROWTH,
        EARNINGS_GROWTH,
        GROSS_MARGINS,
    ];
}

/// Unit policy for the debt-to-equity field.
///
/// Providers disagree on whether the ratio is percent-scaled (120 for 1.2) or
/// decimal. Raw values above `percent_threshold` are read as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtEquityPolicy {
    pub percent_threshold: f64,
}

impl DebtEquityPolicy {
    pub const DEFAULT_PERCENT_THRESHOLD: f64 = 3.0;

    pub fn new(percent_threshold: f64) -> Self {
        Self { percent_threshold }
    }

    /// Convert a raw ratio to decimal form
    pub fn normalize(&self, raw: f64) -> f64 {
        if raw > self.percent_threshold {
            raw / 100.0
        } else {
            raw
        }
    }
}

impl Default for DebtEquityPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERCENT_THRESHOLD)
    }
}

/// Converts a [`RawPayload`] into [`CanonicalMetrics`]
pub struct Normalizer {
    debt_equity: DebtEquityPolicy,
    supplement: Box<dyn SupplementalSource>,
}

impl Normalizer {
    pub fn new(debt_equity: DebtEquityPolicy, supplement: Box<dyn SupplementalSource>) -> Self {
        Self {
            debt_equity,
            supplement,
        }
    }

    pub fn normalize(&self, payload: &RawPayload) -> CanonicalMetrics {
        let mut metrics = CanonicalMetrics::new();
        let mut put = |metric: Metric, value: Option<f64>| {
            metrics.set(metric, value.map(MetricValue::Number));
        };

        put(Metric::Pe, payload.number(fields::TRAILING_PE));
        put(Metric::Pb, payload.number(fields::PRICE_TO_BOOK));
        put(
            Metric::DebtToEquity,
            payload
                .number(fields::DEBT_TO_EQUITY)
                .map(|raw| self.debt_equity.normalize(raw)),
        );
        put(Metric::FreeCashflowYield, free_cashflow_yield(payload));
        put(Metric::CurrentRatio, payload.number(fields::CURRENT_RATIO));
        put(Metric::PriceToSales, payload.number(fields::PRICE_TO_SALES));
        put(Metric::Roe, percent(payload, fields::RETURN_ON_EQUITY));
        // No provider reports invested capital reliably.
        put(Metric::Roic, None);
        put(
            Metric::EarningGrowth,
            percent(payload, fields::EARNINGS_QUARTERLY_GROWTH),
        );
        put(Metric::RevenueGrowthYoy, percent(payload, fields::REVENUE_GROWTH));
        put(Metric::EpsGrowthYoy, percent(payload, fields::EARNINGS_GROWTH));
        put(Metric::GrossMargin, percent(payload, fields::GROSS_MARGINS));

        for metric in Metric::UNSOURCED {
            metrics.set(metric, self.supplement.value(metric));
        }

        metrics
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DebtEquityPolicy::default(), Box::new(NoSupplement))
    }
}

/// `freeCashflow / marketCap * 100`, absent on a missing operand, a zero cap
/// or an overflowing quotient
fn free_cashflow_yield(payload: &RawPayload) -> Option<f64> {
    let free_cashflow = payload.number(fields::FREE_CASHFLOW)?;
    let market_cap = payload.number(fields::MARKET_CAP)?;
    if market_cap == 0.0 {
        return None;
    }
    Some(free_cashflow / market_cap * 100.0).filter(|v| v.is_finite())
}

/// Fraction field scaled to percent
fn percent(payload: &RawPayload, key: &str) -> Option<f64> {
    payload
        .number(key)
        .map(|fraction| fraction * 100.0)
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supplement::{LegacyPlaceholders, PlaceholderMode};
    use serde_json::Value;

    fn number(metrics: &CanonicalMetrics, metric: Metric) -> Option<f64> {
        match metrics.get(metric) {
            Some(MetricValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("metric should be present");
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_debt_equity_policy() {
        let policy = DebtEquityPolicy::default();
        assert_eq!(policy.normalize(120.0), 1.2);
        assert_eq!(policy.normalize(0.8), 0.8);
        assert_eq!(policy.normalize(3.0), 3.0);
        assert_eq!(policy.normalize(40.0), 0.4);

        let strict = DebtEquityPolicy::new(10.0);
        assert_eq!(strict.normalize(5.0), 5.0);
    }

    #[test]
    fn test_debt_equity_normalization() {
        let normalizer = Normalizer::default();

        let metrics = normalizer.normalize(&RawPayload::new().with("debtToEquity", 120));
        assert_eq!(number(&metrics, Metric::DebtToEquity), Some(1.2));

        let metrics = normalizer.normalize(&RawPayload::new().with("debtToEquity", 0.8));
        assert_eq!(number(&metrics, Metric::DebtToEquity), Some(0.8));

        let metrics = normalizer.normalize(&RawPayload::new().with("debtToEquity", Value::Null));
        assert_eq!(metrics.get(Metric::DebtToEquity), None);
    }

    #[test]
    fn test_overflowing_derivations_are_absent() {
        let payload = RawPayload::new()
            .with("freeCashflow", 1e10)
            .with("marketCap", 1e-310)
            .with("returnOnEquity", 1e307)
            .with("grossMargins", -1e307);
        let metrics = Normalizer::default().normalize(&payload);

        assert_eq!(metrics.get(Metric::FreeCashflowYield), None);
        assert_eq!(metrics.get(Metric::Roe), None);
        assert_eq!(metrics.get(Metric::GrossMargin), None);

        let rows = crate::evaluator::Evaluator::default().evaluate(&metrics);
        let fcf = &rows[3];
        assert_eq!(fcf.metric, Metric::FreeCashflowYield);
        assert_eq!(fcf.value.to_string(), "N/A");
        assert_eq!(fcf.deep_value, crate::evaluator::Mark::Neutral);
    }

    #[test]
    fn test_free_cashflow_yield() {
        let normalizer = Normalizer::default();

        let payload = RawPayload::new()
            .with("freeCashflow", 800)
            .with("marketCap", 10000);
        assert_close(number(&normalizer.normalize(&payload), Metric::FreeCashflowYield), 8.0);

        let payload = RawPayload::new()
            .with("freeCashflow", 800)
            .with("marketCap", 0);
        assert_eq!(normalizer.normalize(&payload).get(Metric::FreeCashflowYield), None);

        let payload = RawPayload::new().with("freeCashflow", 800);
        assert_eq!(normalizer.normalize(&payload).get(Metric::FreeCashflowYield), None);

        let payload = RawPayload::new()
            .with("freeCashflow", "n/a")
            .with("marketCap", 10000);
        assert_eq!(normalizer.normalize(&payload).get(Metric::FreeCashflowYield), None);
    }

    #[test]
    fn test_percent_fields_are_scaled() {
        let payload = RawPayload::new()
            .with("returnOnEquity", 0.15)
            .with("earningsQuarterlyGrowth", 0.07)
            .with("revenueGrowth", 0.25)
            .with("earningsGrowth", -0.1)
            .with("grossMargins", 0.65);
        let metrics = Normalizer::default().normalize(&payload);

        assert_close(number(&metrics, Metric::Roe), 15.0);
        assert_close(number(&metrics, Metric::EarningGrowth), 7.0);
        assert_close(number(&metrics, Metric::RevenueGrowthYoy), 25.0);
        assert_close(number(&metrics, Metric::EpsGrowthYoy), -10.0);
        assert_close(number(&metrics, Metric::GrossMargin), 65.0);
    }

    #[test]
    fn test_bad_field_does_not_affect_others() {
        let payload = RawPayload::new()
            .with("trailingPE", "not a number")
            .with("priceToBook", true)
            .with("currentRatio", 2.1)
            .with("priceToSalesTrailing12Months", "0.9");
        let metrics = Normalizer::default().normalize(&payload);

        assert_eq!(metrics.get(Metric::Pe), None);
        assert_eq!(metrics.get(Metric::Pb), None);
        assert_eq!(number(&metrics, Metric::CurrentRatio), Some(2.1));
        assert_eq!(number(&metrics, Metric::PriceToSales), Some(0.9));
    }

    #[test]
    fn test_empty_payload_yields_every_metric_absent() {
        let metrics = Normalizer::default().normalize(&RawPayload::new());
        assert_eq!(metrics.iter().count(), Metric::COUNT);
        assert_eq!(metrics.present_count(), 0);
    }

    #[test]
    fn test_roic_is_always_absent() {
        let payload = RawPayload::new().with("returnOnInvestedCapital", 0.2);
        let normalizer = Normalizer::new(DebtEquityPolicy::default(), Box::new(LegacyPlaceholders));
        assert_eq!(normalizer.normalize(&payload).get(Metric::Roic), None);
    }

    #[test]
    fn test_unsourced_metrics_come_from_supplement() {
        let absent = Normalizer::new(DebtEquityPolicy::default(), PlaceholderMode::Absent.source());
        let metrics = absent.normalize(&RawPayload::new());
        assert!(Metric::UNSOURCED.iter().all(|m| metrics.get(*m).is_none()));

        let legacy = Normalizer::new(DebtEquityPolicy::default(), PlaceholderMode::Legacy.source());
        let metrics = legacy.normalize(&RawPayload::new());
        assert_eq!(metrics.get(Metric::Moat), Some(MetricValue::Flag(true)));
        assert_eq!(metrics.get(Metric::Tam), Some(MetricValue::Number(20_000_000_000.0)));
    }
}
