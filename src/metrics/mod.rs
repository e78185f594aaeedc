//! Metric modules for mating evaluation
//!
//! Each computation lives in its own module; the scorer and ranker combine them.

pub mod bonuses;
pub mod economic_index;
pub mod haplotype;
pub mod inbreeding;
pub mod pppv;

// Re-export metric functions
pub use bonuses::{genotype_bonus, sustainability_bonus};
pub use economic_index::{calculate_economic_index, CategoryScore, EconomicIndex, TraitContribution};
pub use haplotype::{detect_haplotype_risks, haplotype_status, HaplotypeRisk, HaplotypeStatus, RiskSeverity};
pub use inbreeding::{
    calculate_inbreeding, InbreedingDetails, InbreedingMethod, InbreedingResult, InbreedingRisk,
};
pub use pppv::{calculate_pppv, PppvMap, PppvResult, DEFAULT_PPPV_TRAITS};
