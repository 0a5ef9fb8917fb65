//! Declarative screening rules
//!
//! A [`RuleTable`] maps each metric to at most one [`Predicate`] per investing
//! [`Category`]. The table is plain data: it can be inspected, serialized to
//! JSON and replaced without touching the evaluator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Result, ScreenError};
use crate::metrics::{Metric, MetricValue};

/// Investing style a stock is screened against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Deep Value")]
    DeepValue,
    #[serde(rename = "Value")]
    Value,
    #[serde(rename = "Growth")]
    Growth,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::DeepValue, Category::Value, Category::Growth];

    pub fn name(self) -> &'static str {
        match self {
            Category::DeepValue => "Deep Value",
            Category::Value => "Value",
            Category::Growth => "Growth",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison applied to a present metric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Strictly below the bound
    LessThan(f64),
    /// Strictly above the bound
    GreaterThan(f64),
    /// Within `[min, max]`, both ends inclusive
    Between { min: f64, max: f64 },
    /// The flag is set
    IsTrue,
}

impl Predicate {
    /// Test a value.
    ///
    /// Returns `None` when the value's kind doesn't fit the predicate (a flag
    /// under a numeric bound, a number under `IsTrue`).
    pub fn test(&self, value: MetricValue) -> Option<bool> {
        match (*self, value) {
            (Predicate::LessThan(bound), MetricValue::Number(x)) => Some(x < bound),
            (Predicate::GreaterThan(bound), MetricValue::Number(x)) => Some(x > bound),
            (Predicate::Between { min, max }, MetricValue::Number(x)) => Some(min <= x && x <= max),
            (Predicate::IsTrue, MetricValue::Flag(flag)) => Some(flag),
            _ => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::LessThan(bound) => write!(f, "< {bound}"),
            Predicate::GreaterThan(bound) => write!(f, "> {bound}"),
            Predicate::Between { min, max } => write!(f, "in [{min}, {max}]"),
            Predicate::IsTrue => f.write_str("is true"),
        }
    }
}

/// Immutable metric → category → predicate table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: BTreeMap<Metric, BTreeMap<Category, Predicate>>,
}

impl RuleTable {
    /// A table with no rules; every mark is neutral
    pub fn empty() -> Self {
        Self::default()
    }

    /// The Deep Value / Value / Growth thresholds
    pub fn standard() -> Self {
        use Category::{DeepValue, Growth, Value};
        use Predicate::{Between, GreaterThan, IsTrue, LessThan};

        Self::empty()
            .with_rule(Metric::Pe, DeepValue, LessThan(8.0))
            .with_rule(Metric::Pe, Value, LessThan(20.0))
            .with_rule(Metric::Pb, DeepValue, LessThan(1.0))
            .with_rule(Metric::Pb, Value, LessThan(1.5))
            .with_rule(Metric::DebtToEquity, DeepValue, LessThan(0.5))
            .with_rule(Metric::DebtToEquity, Value, LessThan(1.5))
            .with_rule(Metric::DebtToEquity, Growth, LessThan(2.0))
            .with_rule(Metric::FreeCashflowYield, DeepValue, GreaterThan(8.0))
            .with_rule(Metric::CurrentRatio, DeepValue, GreaterThan(1.5))
            .with_rule(Metric::PriceToSales, DeepValue, LessThan(1.0))
            .with_rule(Metric::Roe, Value, GreaterThan(15.0))
            .with_rule(Metric::Roic, Value, GreaterThan(12.0))
            .with_rule(Metric::EarningGrowth, Value, Between { min: 5.0, max: 10.0 })
            .with_rule(Metric::RevenueGrowthYoy, Growth, GreaterThan(20.0))
            .with_rule(Metric::EpsGrowthYoy, Value, GreaterThan(5.0))
            .with_rule(Metric::EpsGrowthYoy, Growth, GreaterThan(20.0))
            .with_rule(Metric::GrossMargin, Growth, GreaterThan(60.0))
            .with_rule(Metric::RevenueGrowthCashflowMargin, Growth, GreaterThan(40.0))
            .with_rule(Metric::Tam, Growth, GreaterThan(10_000_000_000.0))
            .with_rule(Metric::RetentionRate, Growth, GreaterThan(110.0))
            .with_rule(Metric::Moat, Growth, IsTrue)
            .with_rule(Metric::Cashflow5Years, Growth, IsTrue)
            .with_rule(Metric::InsiderBuying, DeepValue, IsTrue)
    }

    /// Add or replace the rule for a (metric, category) pair
    pub fn with_rule(mut self, metric: Metric, category: Category, predicate: Predicate) -> Self {
        self.rules.entry(metric).or_default().insert(category, predicate);
        self
    }

    pub fn rule(&self, metric: Metric, category: Category) -> Option<&Predicate> {
        self.rules.get(&metric)?.get(&category)
    }

    /// Number of (metric, category) pairs carrying a rule
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a table from JSON, e.g. `{"PE": {"Value": {"less_than": 20.0}}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a JSON table from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading rule table");
        Self::from_json(&json)
    }

    /// Reject bounds that can never be compared meaningfully
    pub fn validate(&self) -> Result<()> {
        for (metric, by_category) in &self.rules {
            for (category, predicate) in by_category {
                let valid = match *predicate {
                    Predicate::LessThan(bound) | Predicate::GreaterThan(bound) => bound.is_finite(),
                    Predicate::Between { min, max } => min.is_finite() && max.is_finite() && min <= max,
                    Predicate::IsTrue => true,
                };
                if !valid {
                    return Err(ScreenError::Config(format!(
                        "Invalid rule for {metric} / {category}: {predicate}"
                    )));
                }
            }
        }
        Ok(())
    }
}
