//! Experiment domain module for traffic splitting
//!
//! Experiment definitions with weighted variants, plus the append-only
//! result records the allocator aggregates per variant.

mod entity;
mod result;

pub use entity::{Experiment, Variant, WEIGHT_SUM_TOLERANCE, validate_weights};
pub use result::{ExperimentResult, ExperimentStats, MetricSummary, VariantStats};
