//! PPPV: Predicted Producing Progeny Value
//!
//! Reliability-weighted mid-parent value per trait:
//!
//! ```text
//! PPPV = (r_sire × PTA_sire + r_dam × PTA_dam) / (r_sire + r_dam)
//! ```
//!
//! falling back to the plain midpoint when both reliabilities are zero. Each
//! entry also carries the Mendelian-sampling variance
//! `0.5 × (1 − 0.5 × r̄) × h² × σ²` (r̄ as a fraction), its 95% interval and a
//! rough progeny reliability `(r_dam + r_sire)/4 + 25`.

use crate::params::GeneticParameters;
use crate::record::{Role, TraitRecord};
use crate::resolver::{resolve, resolve_reliability};
use crate::utils::{Interpretation, PopulationStatistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Traits evaluated when the caller does not name any
pub const DEFAULT_PPPV_TRAITS: [&str; 18] = [
    "milk",
    "protein",
    "fat",
    "fat_percent",
    "protein_percent",
    "productive_life",
    "scs",
    "dpr",
    "fertility_index",
    "udc",
    "flc",
    "ptat",
    "net_merit",
    "tpi",
    "hcr",
    "ccr",
    "feed_saved",
    "rfi",
];

/// z-multiplier of a two-sided 95% interval
const Z_95: f64 = 1.96;

/// PPPV of one trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PppvResult {
    pub dam_value: f64,
    pub sire_value: f64,
    pub dam_reliability: f64,
    pub sire_reliability: f64,
    pub pppv: f64,
    /// Mendelian-sampling variance
    pub variance: f64,
    pub std_dev: f64,
    pub ci_95_lower: f64,
    pub ci_95_upper: f64,
    pub combined_reliability: f64,
    pub interpretation: Interpretation,
}

/// trait → PPPV, sorted by trait name
pub type PppvMap = BTreeMap<String, PppvResult>;

/// Reliability-weighted average, midpoint when both weights are zero
pub fn weighted_pppv(dam_value: f64, dam_rel: f64, sire_value: f64, sire_rel: f64) -> f64 {
    let total = dam_rel + sire_rel;
    if total > 0.0 {
        (sire_rel * sire_value + dam_rel * dam_value) / total
    } else {
        (sire_value + dam_value) / 2.0
    }
}

/// Mendelian-sampling variance given parent reliabilities on the 0-100 scale
pub fn mendelian_sampling_variance(
    dam_rel: f64,
    sire_rel: f64,
    heritability: f64,
    population_variance: f64,
) -> f64 {
    let avg_rel_fraction = (dam_rel + sire_rel) / 200.0;
    0.5 * (1.0 - 0.5 * avg_rel_fraction) * heritability * population_variance
}

/// Approximate reliability of the progeny's own prediction
pub fn combined_reliability(dam_rel: f64, sire_rel: f64) -> f64 {
    (dam_rel + sire_rel) / 4.0 + 25.0
}

/// Direction-adjusted interpretation of a value against the population
pub fn interpret(
    trait_key: &str,
    value: f64,
    params: &GeneticParameters,
    stats: &PopulationStatistics,
) -> Interpretation {
    let mut z = stats.z_score(trait_key, value);
    if params.is_lower_better(trait_key) {
        z = -z;
    }
    Interpretation::from_z(z)
}

/// Compute PPPV for one trait, `None` when either parent lacks a value
pub fn calculate_trait(
    dam: &TraitRecord,
    sire: &TraitRecord,
    trait_key: &str,
    params: &GeneticParameters,
    stats: &PopulationStatistics,
) -> Option<PppvResult> {
    let (Some(dam_value), Some(sire_value)) = (resolve(dam, trait_key), resolve(sire, trait_key))
    else {
        tracing::debug!(trait_key, "trait unavailable for one parent, skipped");
        return None;
    };

    let dam_rel = resolve_reliability(dam, trait_key, Role::Dam, params).value;
    let sire_rel = resolve_reliability(sire, trait_key, Role::Sire, params).value;

    let pppv = weighted_pppv(dam_value, dam_rel, sire_value, sire_rel);

    let variance = mendelian_sampling_variance(
        dam_rel,
        sire_rel,
        params.heritability(trait_key),
        stats.variance(trait_key),
    );
    let std_dev = if variance > 0.0 { variance.sqrt() } else { 0.0 };

    Some(PppvResult {
        dam_value,
        sire_value,
        dam_reliability: dam_rel,
        sire_reliability: sire_rel,
        pppv,
        variance,
        std_dev,
        ci_95_lower: pppv - Z_95 * std_dev,
        ci_95_upper: pppv + Z_95 * std_dev,
        combined_reliability: combined_reliability(dam_rel, sire_rel),
        interpretation: interpret(trait_key, pppv, params, stats),
    })
}

/// Compute PPPV for `traits` (default set when `None`); missing traits are skipped
pub fn calculate_pppv<S: AsRef<str>>(
    dam: &TraitRecord,
    sire: &TraitRecord,
    traits: Option<&[S]>,
    params: &GeneticParameters,
    stats: &PopulationStatistics,
) -> PppvMap {
    let mut results = PppvMap::new();

    let mut push = |trait_key: &str| {
        if let Some(result) = calculate_trait(dam, sire, trait_key, params, stats) {
            results.insert(trait_key.to_string(), result);
        }
    };

    match traits {
        Some(list) if !list.is_empty() => list.iter().for_each(|t| push(t.as_ref())),
        _ => DEFAULT_PPPV_TRAITS.iter().for_each(|t| push(*t)),
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup() -> (GeneticParameters, PopulationStatistics) {
        (GeneticParameters::default(), PopulationStatistics::default())
    }

    #[test]
    fn test_weighted_pppv() {
        assert_relative_eq!(weighted_pppv(500.0, 55.0, 1500.0, 99.0), 1142.857142857, epsilon = 1e-6);
        assert_relative_eq!(weighted_pppv(100.0, 60.0, 300.0, 60.0), 200.0, epsilon = 1e-12);
        assert_relative_eq!(weighted_pppv(100.0, 0.0, 300.0, 0.0), 200.0, epsilon = 1e-12);
        assert_relative_eq!(weighted_pppv(100.0, 0.0, 300.0, 80.0), 300.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mendelian_sampling_variance() {
        // milk: h² 0.30, σ 700 → σ² 490000; reliabilities 55/99 → r̄ 0.77
        let msv = mendelian_sampling_variance(55.0, 99.0, 0.30, 490_000.0);
        assert_relative_eq!(msv, 0.5 * (1.0 - 0.5 * 0.77) * 0.30 * 490_000.0, epsilon = 1e-6);
        assert_relative_eq!(combined_reliability(55.0, 99.0), 63.5, epsilon = 1e-12);
    }

    #[test]
    fn test_calculate_trait_full_entry() {
        let (params, stats) = setup();
        let dam = TraitRecord::new("d").with_value("milk", 500.0).with_reliability("milk", 55.0);
        let sire = TraitRecord::new("s").with_value("milk", 1500.0).with_reliability("milk", 99.0);

        let result = calculate_trait(&dam, &sire, "milk", &params, &stats).unwrap();
        assert_relative_eq!(result.pppv, 1142.857142857, epsilon = 1e-6);
        assert!(result.std_dev > 0.0);
        assert_relative_eq!(result.ci_95_upper - result.pppv, 1.96 * result.std_dev, epsilon = 1e-9);
        assert_relative_eq!(result.pppv - result.ci_95_lower, 1.96 * result.std_dev, epsilon = 1e-9);
        // z = (1142.9 - 500) / 700 ≈ 0.92
        assert_eq!(result.interpretation, Interpretation::High);
    }

    #[test]
    fn test_lower_is_better_interpretation() {
        let (params, stats) = setup();
        // SCS mean 2.85, std 0.15: 2.5 is > 2σ below the mean, which is good
        assert_eq!(interpret("scs", 2.5, &params, &stats), Interpretation::Exceptional);
        assert_eq!(interpret("scs", 3.3, &params, &stats), Interpretation::VeryLow);
    }

    #[test]
    fn test_unknown_trait_uses_unit_variance() {
        let (params, stats) = setup();
        let dam = TraitRecord::new("d").with_value("tpi", 2600.0);
        let sire = TraitRecord::new("s").with_value("tpi", 3000.0);
        let result = calculate_trait(&dam, &sire, "tpi", &params, &stats).unwrap();
        // h² 0.25 default, σ² 1, r 55/75 → r̄ 0.65
        assert_relative_eq!(result.variance, 0.5 * (1.0 - 0.325) * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_parent_value_skips_trait() {
        let (params, stats) = setup();
        let dam = TraitRecord::new("d").with_value("milk", 500.0).with_value("fat", 20.0);
        let sire = TraitRecord::new("s").with_value("milk", 900.0);

        let results = calculate_pppv::<&str>(&dam, &sire, None, &params, &stats);
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("milk"));

        let results = calculate_pppv(&dam, &sire, Some(&["fat"][..]), &params, &stats);
        assert!(results.is_empty());
    }
}
