//! Traffic allocator: experiment registry and result log
//!
//! Assignment is pure function of (experiment, session), so no assignment
//! table is kept. Results are an append-only in-process log.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, info};

use crate::domain::error::GatewayError;
use crate::domain::experiment::{
    Experiment, ExperimentResult, ExperimentStats, Variant, VariantStats,
};

use super::bucketing::SessionBucketer;

/// Variant name returned for experiments that don't exist
const UNKNOWN_EXPERIMENT_VARIANT: &str = "default";

/// In-process experiment registry with deterministic assignment
#[derive(Debug, Default)]
pub struct TrafficAllocator {
    experiments: RwLock<HashMap<String, Experiment>>,
    results: RwLock<Vec<ExperimentResult>>,
}

impl TrafficAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    fn read_experiments(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<String, Experiment>>, GatewayError> {
        self.experiments
            .read()
            .map_err(|e| GatewayError::internal(format!("Experiment lock poisoned: {}", e)))
    }

    fn write_experiments(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, Experiment>>, GatewayError> {
        self.experiments
            .write()
            .map_err(|e| GatewayError::internal(format!("Experiment lock poisoned: {}", e)))
    }

    fn read_results(&self) -> Result<RwLockReadGuard<'_, Vec<ExperimentResult>>, GatewayError> {
        self.results
            .read()
            .map_err(|e| GatewayError::internal(format!("Result lock poisoned: {}", e)))
    }

    fn write_results(&self) -> Result<RwLockWriteGuard<'_, Vec<ExperimentResult>>, GatewayError> {
        self.results
            .write()
            .map_err(|e| GatewayError::internal(format!("Result lock poisoned: {}", e)))
    }

    /// Register a new experiment, rejecting duplicates
    pub fn create_experiment(&self, experiment: Experiment) -> Result<(), GatewayError> {
        let mut experiments = self.write_experiments()?;

        if experiments.contains_key(experiment.name()) {
            return Err(GatewayError::conflict(format!(
                "Experiment '{}' already exists",
                experiment.name()
            )));
        }

        info!(
            experiment = %experiment.name(),
            variants = experiment.variants().len(),
            "Experiment created"
        );
        experiments.insert(experiment.name().to_string(), experiment);
        Ok(())
    }

    /// Resolve the variant for a session
    ///
    /// Unknown experiments resolve to "default"; disabled experiments
    /// route everyone to the first declared variant.
    pub fn get_variant(&self, name: &str, session_id: &str) -> Result<String, GatewayError> {
        let experiments = self.read_experiments()?;

        let Some(experiment) = experiments.get(name) else {
            return Ok(UNKNOWN_EXPERIMENT_VARIANT.to_string());
        };

        if !experiment.is_enabled() {
            return Ok(experiment.first_variant().to_string());
        }

        let bucket = SessionBucketer::bucket(name, session_id);
        Ok(experiment.variant_for_bucket(bucket).to_string())
    }

    /// Append a result record, resolving the variant for the session
    pub fn record_result(
        &self,
        name: &str,
        session_id: &str,
        metrics: HashMap<String, Value>,
    ) -> Result<(), GatewayError> {
        let variant = self.get_variant(name, session_id)?;

        debug!(experiment = name, variant = %variant, "Experiment result recorded");

        let result = ExperimentResult::new(name, variant, session_id, metrics);
        self.write_results()?.push(result);
        Ok(())
    }

    /// Per-variant counts and numeric metric summaries for one experiment
    pub fn experiment_stats(&self, name: &str) -> Result<ExperimentStats, GatewayError> {
        let experiments = self.read_experiments()?;
        let experiment = experiments.get(name).ok_or_else(|| {
            GatewayError::not_found(format!("Experiment '{}' not found", name))
        })?;

        let results = self.read_results()?;

        let mut grouped: BTreeMap<String, Vec<&HashMap<String, Value>>> = BTreeMap::new();
        for result in results.iter().filter(|r| r.experiment() == name) {
            grouped
                .entry(result.variant().to_string())
                .or_default()
                .push(result.metrics());
        }

        let variants = grouped
            .into_iter()
            .map(|(variant, records)| (variant, VariantStats::from_metrics(&records)))
            .collect();

        Ok(ExperimentStats {
            experiment: experiment.name().to_string(),
            description: experiment.description().map(str::to_string),
            enabled: experiment.is_enabled(),
            variants,
        })
    }

    /// Replace an experiment's weights after sum validation
    pub fn update_traffic(&self, name: &str, variants: Vec<Variant>) -> Result<(), GatewayError> {
        let mut experiments = self.write_experiments()?;
        let experiment = experiments.get_mut(name).ok_or_else(|| {
            GatewayError::not_found(format!("Experiment '{}' not found", name))
        })?;

        experiment.set_variants(variants)?;
        info!(experiment = name, "Experiment traffic updated");
        Ok(())
    }

    /// Toggle routing for an experiment without touching recorded history
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), GatewayError> {
        let mut experiments = self.write_experiments()?;
        let experiment = experiments.get_mut(name).ok_or_else(|| {
            GatewayError::not_found(format!("Experiment '{}' not found", name))
        })?;

        experiment.set_enabled(enabled);
        info!(experiment = name, enabled, "Experiment toggled");
        Ok(())
    }

    /// Snapshot all registered experiments
    pub fn all_experiments(&self) -> Result<Vec<Experiment>, GatewayError> {
        let experiments = self.read_experiments()?;
        let mut all: Vec<Experiment> = experiments.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    /// Stats for every registered experiment, for operator inspection
    pub fn export(&self) -> Result<Vec<ExperimentStats>, GatewayError> {
        let names: Vec<String> = {
            let experiments = self.read_experiments()?;
            let mut names: Vec<String> = experiments.keys().cloned().collect();
            names.sort();
            names
        };

        names.iter().map(|name| self.experiment_stats(name)).collect()
    }
}
