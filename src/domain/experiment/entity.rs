//! Experiment domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GatewayError;

/// Allowed drift when validating that variant weights sum to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

// ============================================================================
// Variant
// ============================================================================

/// A variant in an experiment, carrying its traffic-share weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    name: String,
    weight: f64,
}

impl Variant {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

// ============================================================================
// Experiment
// ============================================================================

/// An experiment definition.
///
/// Variants keep their declared order; bucket resolution walks them in that
/// order, so reordering variants changes assignments even when weights do
/// not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    variants: Vec<Variant>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a new experiment, validating the variant weights
    pub fn new(name: impl Into<String>, variants: Vec<Variant>) -> Result<Self, GatewayError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GatewayError::validation("experiment name must not be empty"));
        }
        validate_weights(&variants)?;

        let now = Utc::now();
        Ok(Self {
            name,
            description: None,
            variants,
            enabled: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    // Getters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// First declared variant name, the stable default for disabled
    /// experiments
    pub fn first_variant(&self) -> &str {
        // validate_weights rejects empty variant lists
        &self.variants[0].name
    }

    /// Resolve the variant for a bucket value in [0, 1).
    ///
    /// Walks variants in declared order accumulating weight and returns the
    /// first whose cumulative weight exceeds the bucket. Falls back to the
    /// last variant when rounding leaves the bucket unmatched.
    pub fn variant_for_bucket(&self, bucket: f64) -> &str {
        let mut cumulative = 0.0;
        for variant in &self.variants {
            cumulative += variant.weight;
            if bucket < cumulative {
                return &variant.name;
            }
        }
        &self.variants[self.variants.len() - 1].name
    }

    // Mutators

    /// Replace the variant weights, validating the new set first. The
    /// previous configuration is untouched when validation fails.
    pub fn set_variants(&mut self, variants: Vec<Variant>) -> Result<(), GatewayError> {
        validate_weights(&variants)?;
        self.variants = variants;
        self.touch();
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Validate a variant set: non-empty, finite non-negative weights, sum
/// within [`WEIGHT_SUM_TOLERANCE`] of 1.0.
pub fn validate_weights(variants: &[Variant]) -> Result<(), GatewayError> {
    if variants.is_empty() {
        return Err(GatewayError::configuration(
            "experiment must declare at least one variant",
        ));
    }

    for variant in variants {
        if !variant.weight.is_finite() || variant.weight < 0.0 {
            return Err(GatewayError::configuration(format!(
                "variant '{}' has invalid weight {}",
                variant.name, variant.weight
            )));
        }
    }

    let total: f64 = variants.iter().map(|v| v.weight).sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(GatewayError::configuration(format!(
            "variant weights must sum to 1.0, got {total}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rollout() -> Experiment {
        Experiment::new(
            "rollout",
            vec![Variant::new("A", 0.3), Variant::new("B", 0.7)],
        )
        .unwrap()
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_weights_must_sum_to_one() {
            let result = Experiment::new(
                "bad",
                vec![Variant::new("A", 0.5), Variant::new("B", 0.3)],
            );
            assert!(matches!(
                result,
                Err(GatewayError::Configuration { .. })
            ));
        }

        #[test]
        fn test_weight_sum_tolerance() {
            // 0.995 is within the 0.01 tolerance
            let result = Experiment::new(
                "close-enough",
                vec![Variant::new("A", 0.5), Variant::new("B", 0.495)],
            );
            assert!(result.is_ok());
        }

        #[test]
        fn test_rejects_empty_variants() {
            assert!(Experiment::new("empty", vec![]).is_err());
        }

        #[test]
        fn test_rejects_negative_weight() {
            let result = Experiment::new(
                "negative",
                vec![Variant::new("A", -0.5), Variant::new("B", 1.5)],
            );
            assert!(result.is_err());
        }

        #[test]
        fn test_set_variants_keeps_previous_on_failure() {
            let mut experiment = rollout();
            let result = experiment.set_variants(vec![Variant::new("A", 0.2)]);
            assert!(result.is_err());
            assert_eq!(experiment.variants().len(), 2);
            assert_eq!(experiment.variants()[0].weight(), 0.3);
        }
    }

    mod bucket_tests {
        use super::*;

        #[test]
        fn test_bucket_walks_declared_order() {
            let experiment = rollout();
            assert_eq!(experiment.variant_for_bucket(0.0), "A");
            assert_eq!(experiment.variant_for_bucket(0.29), "A");
            assert_eq!(experiment.variant_for_bucket(0.3), "B");
            assert_eq!(experiment.variant_for_bucket(0.9999), "B");
        }

        #[test]
        fn test_bucket_falls_back_to_last_variant() {
            // weights that underflow 1.0 within tolerance leave a sliver of
            // bucket space owned by the last variant
            let experiment = Experiment::new(
                "sliver",
                vec![Variant::new("A", 0.5), Variant::new("B", 0.495)],
            )
            .unwrap();
            assert_eq!(experiment.variant_for_bucket(0.999), "B");
        }

        #[test]
        fn test_zero_weight_variant_gets_no_traffic() {
            let experiment = Experiment::new(
                "one-sided",
                vec![Variant::new("on", 1.0), Variant::new("off", 0.0)],
            )
            .unwrap();
            assert_eq!(experiment.variant_for_bucket(0.0), "on");
            assert_eq!(experiment.variant_for_bucket(0.9999), "on");
        }
    }
}
