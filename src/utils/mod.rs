//! Utility modules for mating evaluation
//!
//! - Normalization: population z-scores, interpretation tiers, letter grades

pub mod normalization;

// Re-export commonly used types
pub use normalization::{Grade, Interpretation, PopulationStatistics, TraitStats};
