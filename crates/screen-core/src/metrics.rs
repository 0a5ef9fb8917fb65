//! Canonical metric set
//!
//! Every screening works on the same closed set of metrics, always in the same
//! order. [`CanonicalMetrics`] stores one slot per [`Metric`] so an entry can
//! be absent but never missing.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ScreenError;

/// One of the fixed financial indicators the screener evaluates.
///
/// Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "PB")]
    Pb,
    #[serde(rename = "Debt/Equity")]
    DebtToEquity,
    #[serde(rename = "Free Cashflow yield")]
    FreeCashflowYield,
    #[serde(rename = "Current ratio")]
    CurrentRatio,
    #[serde(rename = "P/S")]
    PriceToSales,
    #[serde(rename = "ROE")]
    Roe,
    #[serde(rename = "ROIC")]
    Roic,
    #[serde(rename = "Earning Growth")]
    EarningGrowth,
    #[serde(rename = "Revenue Growth YOY")]
    RevenueGrowthYoy,
    #[serde(rename = "EPS Growth YOY")]
    EpsGrowthYoy,
    #[serde(rename = "Gross margin")]
    GrossMargin,
    #[serde(rename = "Revenue Growth + Cash flow Margin")]
    RevenueGrowthCashflowMargin,
    #[serde(rename = "TAM")]
    Tam,
    #[serde(rename = "Retention Rate")]
    RetentionRate,
    #[serde(rename = "Moat")]
    Moat,
    #[serde(rename = "Cashflow 5 Years")]
    Cashflow5Years,
    #[serde(rename = "Insider Buying")]
    InsiderBuying,
}

impl Metric {
    /// Number of metrics in the canonical set
    pub const COUNT: usize = 18;

    /// All metrics in canonical order
    pub const ALL: [Metric; Self::COUNT] = [
        Metric::Pe,
        Metric::Pb,
        Metric::DebtToEquity,
        Metric::FreeCashflowYield,
        Metric::CurrentRatio,
        Metric::PriceToSales,
        Metric::Roe,
        Metric::Roic,
        Metric::EarningGrowth,
        Metric::RevenueGrowthYoy,
        Metric::EpsGrowthYoy,
        Metric::GrossMargin,
        Metric::RevenueGrowthCashflowMargin,
        Metric::Tam,
        Metric::RetentionRate,
        Metric::Moat,
        Metric::Cashflow5Years,
        Metric::InsiderBuying,
    ];

    /// Metrics with no live upstream field; their values come from a
    /// [`SupplementalSource`](crate::supplement::SupplementalSource).
    pub const UNSOURCED: [Metric; 6] = [
        Metric::RevenueGrowthCashflowMargin,
        Metric::Tam,
        Metric::RetentionRate,
        Metric::Moat,
        Metric::Cashflow5Years,
        Metric::InsiderBuying,
    ];

    /// Display name, as shown in the result table
    pub fn name(self) -> &'static str {
        match self {
            Metric::Pe => "PE",
            Metric::Pb => "PB",
            Metric::DebtToEquity => "Debt/Equity",
            Metric::FreeCashflowYield => "Free Cashflow yield",
            Metric::CurrentRatio => "Current ratio",
            Metric::PriceToSales => "P/S",
            Metric::Roe => "ROE",
            Metric::Roic => "ROIC",
            Metric::EarningGrowth => "Earning Growth",
            Metric::RevenueGrowthYoy => "Revenue Growth YOY",
            Metric::EpsGrowthYoy => "EPS Growth YOY",
            Metric::GrossMargin => "Gross margin",
            Metric::RevenueGrowthCashflowMargin => "Revenue Growth + Cash flow Margin",
            Metric::Tam => "TAM",
            Metric::RetentionRate => "Retention Rate",
            Metric::Moat => "Moat",
            Metric::Cashflow5Years => "Cashflow 5 Years",
            Metric::InsiderBuying => "Insider Buying",
        }
    }

    /// Short command-line friendly key, e.g. `retention-rate`
    pub fn slug(self) -> &'static str {
        match self {
            Metric::Pe => "pe",
            Metric::Pb => "pb",
            Metric::DebtToEquity => "debt-equity",
            Metric::FreeCashflowYield => "fcf-yield",
            Metric::CurrentRatio => "current-ratio",
            Metric::PriceToSales => "ps",
            Metric::Roe => "roe",
            Metric::Roic => "roic",
            Metric::EarningGrowth => "earning-growth",
            Metric::RevenueGrowthYoy => "revenue-growth",
            Metric::EpsGrowthYoy => "eps-growth",
            Metric::GrossMargin => "gross-margin",
            Metric::RevenueGrowthCashflowMargin => "revenue-growth-cf-margin",
            Metric::Tam => "tam",
            Metric::RetentionRate => "retention-rate",
            Metric::Moat => "moat",
            Metric::Cashflow5Years => "cashflow-5-years",
            Metric::InsiderBuying => "insider-buying",
        }
    }

    /// Whether the metric has no live upstream field
    pub fn is_unsourced(self) -> bool {
        Self::UNSOURCED.contains(&self)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ScreenError;

    /// Accepts either the slug or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.slug().eq_ignore_ascii_case(needle) || m.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ScreenError::Config(format!("Unknown metric: {needle}")))
    }
}

/// A present metric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Flag(bool),
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Flag(value)
    }
}

impl FromStr for MetricValue {
    type Err = ScreenError;

    /// `true`/`false` (also `yes`/`no`) become flags, anything numeric a number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" => return Ok(MetricValue::Flag(true)),
            "false" | "no" => return Ok(MetricValue::Flag(false)),
            _ => {}
        }
        raw.replace('_', "")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(MetricValue::Number)
            .ok_or_else(|| ScreenError::Config(format!("Invalid metric value: {raw}")))
    }
}

/// Fixed mapping from every [`Metric`] to an optional value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalMetrics {
    values: [Option<MetricValue>; Metric::COUNT],
}

impl CanonicalMetrics {
    /// All metrics absent
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<MetricValue>) {
        self.values[metric.index()] = value;
    }

    pub fn with(mut self, metric: Metric, value: impl Into<MetricValue>) -> Self {
        self.set(metric, Some(value.into()));
        self
    }

    /// Iterate every metric with its value, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<MetricValue>)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Number of metrics that carry a value
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl Serialize for CanonicalMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Metric::COUNT))?;
        for (metric, value) in self.iter() {
            map.serialize_entry(metric.name(), &value)?;
        }
        map.end()
    }
}
