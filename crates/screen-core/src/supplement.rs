//! Values for metrics that no upstream provider reports
//!
//! TAM, Retention Rate, Moat, Cashflow 5 Years, Insider Buying and the
//! composite revenue/cash-flow margin have no live field. A
//! [`SupplementalSource`] decides what the normalizer emits for them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::metrics::{Metric, MetricValue};

/// Supplies values for [`Metric::UNSOURCED`] metrics.
pub trait SupplementalSource: Send + Sync {
    /// Value for an unsourced metric, or `None` to leave it absent
    fn value(&self, metric: Metric) -> Option<MetricValue>;
}

/// How unsourced metrics are filled when no override is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderMode {
    /// Leave them absent, so they render neutral
    #[default]
    Absent,
    /// Use fixed stand-in constants
    Legacy,
}

impl PlaceholderMode {
    /// Build the source for this mode
    pub fn source(self) -> Box<dyn SupplementalSource> {
        match self {
            PlaceholderMode::Absent => Box::new(NoSupplement),
            PlaceholderMode::Legacy => Box::new(LegacyPlaceholders),
        }
    }
}

/// Every unsourced metric stays absent
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSupplement;

impl SupplementalSource for NoSupplement {
    fn value(&self, _metric: Metric) -> Option<MetricValue> {
        None
    }
}

/// Fixed stand-in constants, identical for every ticker.
///
/// These are not measurements of the company being screened.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyPlaceholders;

impl SupplementalSource for LegacyPlaceholders {
    fn value(&self, metric: Metric) -> Option<MetricValue> {
        match metric {
            Metric::Tam => Some(MetricValue::Number(20_000_000_000.0)),
            Metric::RetentionRate => Some(MetricValue::Number(120.0)),
            Metric::Moat | Metric::Cashflow5Years => Some(MetricValue::Flag(true)),
            Metric::InsiderBuying => Some(MetricValue::Flag(false)),
            _ => None,
        }
    }
}

/// User-provided values layered over a fallback source
pub struct Overrides {
    values: HashMap<Metric, MetricValue>,
    fallback: Box<dyn SupplementalSource>,
}

impl Overrides {
    pub fn new(values: HashMap<Metric, MetricValue>, fallback: Box<dyn SupplementalSource>) -> Self {
        Self { values, fallback }
    }
}

impl SupplementalSource for Overrides {
    fn value(&self, metric: Metric) -> Option<MetricValue> {
        self.values
            .get(&metric)
            .copied()
            .or_else(|| self.fallback.value(metric))
    }
}
