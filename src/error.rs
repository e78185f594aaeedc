//! Error types
//!
//! Evaluation itself is infallible: missing data degrades to skipped traits or
//! fallback estimates. Errors only come from configuration validation and from
//! batch requests that cannot be attributed.

use thiserror::Error;

/// Malformed `GeneticParameters` / `PopulationStatistics`, caught at load time
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("category weights sum to {sum:.3}, expected 1.0 (±{tolerance})")]
    CategoryWeightSum { sum: f64, tolerance: f64 },

    #[error("trait weights in category '{category}' sum to {sum:.3}, expected 1.0 (±{tolerance})")]
    TraitWeightSum {
        category: String,
        sum: f64,
        tolerance: f64,
    },

    #[error("category '{category}' has a weight but no trait weights")]
    UnknownCategory { category: String },

    #[error("negative weight {weight} for '{key}'")]
    NegativeWeight { key: String, weight: f64 },

    #[error("inbreeding thresholds out of order: ideal {ideal} < acceptable {acceptable} < warning {warning} required")]
    ThresholdOrder {
        ideal: f64,
        acceptable: f64,
        warning: f64,
    },

    #[error("inbreeding penalty lambda must be non-negative, got {0}")]
    NegativePenalty(f64),

    #[error("default {role} reliability {value} outside [0, 100]")]
    DefaultReliability { role: &'static str, value: f64 },

    #[error("heritability for '{trait_key}' must be in (0, 1], got {value}")]
    Heritability { trait_key: String, value: f64 },

    #[error("population statistics for '{trait_key}' need a positive finite std, got {std}")]
    PopulationStd { trait_key: String, std: f64 },
}

/// Batch-level failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("no candidate sires supplied")]
    NoCandidates,

    #[error("dam at position {index} has no identifier")]
    MissingDamIdentity { index: usize },
}
