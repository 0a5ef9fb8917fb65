//! Scores canonical metrics against a rule table

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::metrics::{CanonicalMetrics, Metric, MetricValue};
use crate::rules::{Category, Predicate, RuleTable};

/// Per-category outcome for one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Pass,
    Fail,
    /// No rule applies, or the value is missing
    Neutral,
}

impl Mark {
    /// Glyph used in rendered tables
    pub fn symbol(self) -> &'static str {
        match self {
            Mark::Pass => "✔️",
            Mark::Fail => "❌",
            Mark::Neutral => "",
        }
    }
}

/// Value as it should be displayed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayValue {
    NotAvailable,
    /// Rounded to two decimals
    Number(f64),
    Flag(bool),
}

impl DisplayValue {
    pub fn from_value(value: Option<MetricValue>) -> Self {
        match value {
            None => DisplayValue::NotAvailable,
            Some(MetricValue::Number(n)) => DisplayValue::Number(round2(n)),
            Some(MetricValue::Flag(b)) => DisplayValue::Flag(b),
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::NotAvailable => f.write_str("N/A"),
            DisplayValue::Number(n) => write!(f, "{n}"),
            DisplayValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for DisplayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DisplayValue::NotAvailable => serializer.serialize_str("N/A"),
            DisplayValue::Number(n) => serializer.serialize_f64(*n),
            DisplayValue::Flag(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Two decimals, ties to even (`0.125` shows as `0.12`)
fn round2(n: f64) -> f64 {
    let scaled = n * 100.0;
    if scaled.is_finite() {
        scaled.round_ties_even() / 100.0
    } else {
        n
    }
}

/// One display row of a screening
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub metric: Metric,
    pub value: DisplayValue,
    pub deep_value: Mark,
    pub value_mark: Mark,
    pub growth: Mark,
}

impl ResultRow {
    pub fn mark(&self, category: Category) -> Mark {
        match category {
            Category::DeepValue => self.deep_value,
            Category::Value => self.value_mark,
            Category::Growth => self.growth,
        }
    }

    pub fn marks(&self) -> [Mark; 3] {
        [self.deep_value, self.value_mark, self.growth]
    }
}

/// Pass/fail/neutral counts for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub neutral: usize,
}

impl Tally {
    pub fn of(rows: &[ResultRow], category: Category) -> Self {
        rows.iter().fold(Self::default(), |mut tally, row| {
            match row.mark(category) {
                Mark::Pass => tally.passed += 1,
                Mark::Fail => tally.failed += 1,
                Mark::Neutral => tally.neutral += 1,
            }
            tally
        })
    }

    /// Rules that could actually be evaluated
    pub fn evaluated(&self) -> usize {
        self.passed + self.failed
    }
}

/// Mark for a single (rule, value) pair
pub fn mark_for(rule: Option<&Predicate>, value: Option<MetricValue>) -> Mark {
    let (Some(predicate), Some(value)) = (rule, value) else {
        return Mark::Neutral;
    };
    match predicate.test(value) {
        Some(true) => Mark::Pass,
        Some(false) => Mark::Fail,
        None => Mark::Neutral,
    }
}

/// Applies an injected [`RuleTable`] to canonical metrics
#[derive(Debug, Clone)]
pub struct Evaluator {
    rules: Arc<RuleTable>,
}

impl Evaluator {
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    /// One row per metric, in canonical order
    pub fn evaluate(&self, metrics: &CanonicalMetrics) -> Vec<ResultRow> {
        metrics
            .iter()
            .map(|(metric, value)| {
                let mark = |category| mark_for(self.rules.rule(metric, category), value);
                ResultRow {
                    metric,
                    value: DisplayValue::from_value(value),
                    deep_value: mark(Category::DeepValue),
                    value_mark: mark(Category::Value),
                    growth: mark(Category::Growth),
                }
            })
            .collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Arc::new(RuleTable::standard()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rows: &[ResultRow], metric: Metric) -> &ResultRow {
        rows.iter().find(|r| r.metric == metric).unwrap()
    }

    fn fully_populated() -> CanonicalMetrics {
        Metric::ALL.into_iter().fold(CanonicalMetrics::new(), |metrics, metric| {
            if matches!(metric, Metric::Moat | Metric::Cashflow5Years | Metric::InsiderBuying) {
                metrics.with(metric, true)
            } else {
                metrics.with(metric, 1.0)
            }
        })
    }

    #[test]
    fn test_rows_follow_canonical_order() {
        let rows = Evaluator::default().evaluate(&CanonicalMetrics::new());
        let order: Vec<_> = rows.iter().map(|r| r.metric).collect();
        assert_eq!(order, Metric::ALL.to_vec());
    }

    #[test]
    fn test_absent_values_are_never_failed() {
        let rows = Evaluator::default().evaluate(&CanonicalMetrics::new());
        for row in &rows {
            assert_eq!(row.value, DisplayValue::NotAvailable);
            assert_eq!(row.marks(), [Mark::Neutral; 3]);
        }
    }

    #[test]
    fn test_pairs_without_rules_are_neutral() {
        let rules = RuleTable::standard();
        let rows = Evaluator::new(Arc::new(rules.clone())).evaluate(&fully_populated());
        for row in &rows {
            for category in Category::ALL {
                if rules.rule(row.metric, category).is_none() {
                    assert_eq!(row.mark(category), Mark::Neutral, "{} / {}", row.metric, category);
                } else {
                    assert_ne!(row.mark(category), Mark::Neutral, "{} / {}", row.metric, category);
                }
            }
        }
    }

    #[test]
    fn test_empty_table_is_all_neutral() {
        let rows = Evaluator::new(Arc::new(RuleTable::empty())).evaluate(&fully_populated());
        assert!(rows.iter().all(|r| r.marks() == [Mark::Neutral; 3]));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let evaluator = Evaluator::default();
        let metrics = fully_populated().with(Metric::Pe, 7.5);
        assert_eq!(evaluator.evaluate(&metrics), evaluator.evaluate(&metrics));
    }

    #[test]
    fn test_threshold_marks() {
        let metrics = CanonicalMetrics::new()
            .with(Metric::Pe, 12.0)
            .with(Metric::FreeCashflowYield, 8.0)
            .with(Metric::EarningGrowth, 10.0)
            .with(Metric::EpsGrowthYoy, 12.0)
            .with(Metric::Moat, false)
            .with(Metric::InsiderBuying, true);
        let rows = Evaluator::default().evaluate(&metrics);

        let pe = row(&rows, Metric::Pe);
        assert_eq!(pe.marks(), [Mark::Fail, Mark::Pass, Mark::Neutral]);

        let fcf = row(&rows, Metric::FreeCashflowYield);
        assert_eq!(fcf.deep_value, Mark::Fail);

        assert_eq!(row(&rows, Metric::EarningGrowth).value_mark, Mark::Pass);

        let eps = row(&rows, Metric::EpsGrowthYoy);
        assert_eq!(eps.marks(), [Mark::Neutral, Mark::Pass, Mark::Fail]);

        let moat = row(&rows, Metric::Moat);
        assert_eq!(moat.value, DisplayValue::Flag(false));
        assert_eq!(moat.growth, Mark::Fail);

        assert_eq!(row(&rows, Metric::InsiderBuying).deep_value, Mark::Pass);
    }

    #[test]
    fn test_rules_use_unrounded_value() {
        let metrics = CanonicalMetrics::new().with(Metric::FreeCashflowYield, 8.001);
        let rows = Evaluator::default().evaluate(&metrics);
        let fcf = row(&rows, Metric::FreeCashflowYield);
        assert_eq!(fcf.value, DisplayValue::Number(8.0));
        assert_eq!(fcf.deep_value, Mark::Pass);
    }

    #[test]
    fn test_kind_mismatch_is_neutral() {
        let metrics = CanonicalMetrics::new()
            .with(Metric::Moat, 1.0)
            .with(Metric::Pe, true);
        let rows = Evaluator::default().evaluate(&metrics);
        assert_eq!(row(&rows, Metric::Moat).growth, Mark::Neutral);
        assert_eq!(row(&rows, Metric::Pe).marks(), [Mark::Neutral; 3]);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(DisplayValue::from_value(None).to_string(), "N/A");
        assert_eq!(DisplayValue::from_value(Some(7.5.into())).to_string(), "7.5");
        assert_eq!(DisplayValue::from_value(Some(1.23456.into())).to_string(), "1.23");
        assert_eq!(DisplayValue::from_value(Some(2e10.into())).to_string(), "20000000000");
        assert_eq!(DisplayValue::from_value(Some(true.into())).to_string(), "true");
    }

    #[test]
    fn test_display_rounds_half_to_even() {
        assert_eq!(DisplayValue::from_value(Some(0.125.into())), DisplayValue::Number(0.12));
        assert_eq!(DisplayValue::from_value(Some(0.375.into())), DisplayValue::Number(0.38));
        assert_eq!(DisplayValue::from_value(Some((-0.125).into())), DisplayValue::Number(-0.12));
        assert_eq!(DisplayValue::from_value(Some(2.675.into())), DisplayValue::Number(2.67));
        assert_eq!(DisplayValue::from_value(Some(1e308.into())), DisplayValue::Number(1e308));
    }

    #[test]
    fn test_tally() {
        let metrics = CanonicalMetrics::new()
            .with(Metric::Pe, 7.5)
            .with(Metric::Pb, 3.0);
        let rows = Evaluator::default().evaluate(&metrics);

        let deep = Tally::of(&rows, Category::DeepValue);
        assert_eq!(deep, Tally { passed: 1, failed: 1, neutral: 16 });
        assert_eq!(deep.evaluated(), 2);

        let growth = Tally::of(&rows, Category::Growth);
        assert_eq!(growth.evaluated(), 0);
        assert_eq!(growth.neutral, Metric::COUNT);
    }
}
