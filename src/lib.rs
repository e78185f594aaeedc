//! Mating Scorer
//!
//! Genetic mating evaluation for dairy cattle: given a dam and one or more
//! candidate sires, predicts progeny values, estimates inbreeding, screens
//! lethal haplotypes and ranks sires by a weighted economic index.
//!
//! Layout:
//! - `record` / `resolver`: trait records and alias-aware value lookup
//! - `params` / `utils`: validated parameters and population statistics
//! - `metrics/`: PPPV, inbreeding, haplotypes, economic index, bonuses
//! - `scorer` / `ranker`: compatibility contract and sire ranking
//! - `explanation/`: recommendations and JSON/Markdown output
//! - `data`: record loading with Polars

pub mod error;
pub mod record;
pub mod params;
pub mod resolver;
pub mod utils;
pub mod metrics;
pub mod scorer;
pub mod ranker;
pub mod explanation;
pub mod data;

// Re-export commonly used types
pub use error::{ConfigError, EngineError};
pub use record::{AnimalIdentity, Blob, FieldValue, Role, TraitRecord};
pub use params::GeneticParameters;
pub use utils::{Grade, Interpretation, PopulationStatistics, TraitStats};
pub use metrics::{
    calculate_economic_index, calculate_inbreeding, calculate_pppv, EconomicIndex,
    HaplotypeRisk, HaplotypeStatus, InbreedingMethod, InbreedingResult, InbreedingRisk,
    PppvMap, PppvResult, RiskSeverity,
};
pub use scorer::{CompatibilityResult, CompatibilityScorer};
pub use ranker::{
    DamOutcome, Eligibility, HerdRanking, MatingEvaluation, RankOptions, RankedCandidate,
    SireRanker,
};
pub use explanation::{
    JsonFormatter, MarkdownFormatter, Recommendation, RecommendationGenerator,
    RecommendationStatus,
};
