//! Experiment result records and per-variant aggregation

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable observation recorded against an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    experiment: String,
    variant: String,
    session_id: String,
    metrics: HashMap<String, Value>,
    timestamp: DateTime<Utc>,
}

impl ExperimentResult {
    pub fn new(
        experiment: impl Into<String>,
        variant: impl Into<String>,
        session_id: impl Into<String>,
        metrics: HashMap<String, Value>,
    ) -> Self {
        Self {
            experiment: experiment.into(),
            variant: variant.into(),
            session_id: session_id.into(),
            metrics,
            timestamp: Utc::now(),
        }
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn metrics(&self) -> &HashMap<String, Value> {
        &self.metrics
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Aggregate of one numeric metric across a variant's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        let sum: f64 = values.iter().sum();
        Self {
            avg: sum / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Per-variant aggregation over recorded results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStats {
    pub count: u64,
    pub metrics: BTreeMap<String, MetricSummary>,
}

impl VariantStats {
    /// Aggregate the metric maps of one variant's results. Only keys with
    /// at least one numeric value appear in the output.
    pub fn from_metrics(records: &[&HashMap<String, Value>]) -> Self {
        let mut keys: Vec<&str> = records
            .iter()
            .flat_map(|metrics| metrics.keys().map(String::as_str))
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let mut summaries = BTreeMap::new();
        for key in keys {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|metrics| metrics.get(key).and_then(Value::as_f64))
                .collect();
            if !values.is_empty() {
                summaries.insert(key.to_string(), MetricSummary::from_values(&values));
            }
        }

        Self {
            count: records.len() as u64,
            metrics: summaries,
        }
    }
}

/// Stats report for one experiment, grouped by variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentStats {
    pub experiment: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub variants: BTreeMap<String, VariantStats>,
}
