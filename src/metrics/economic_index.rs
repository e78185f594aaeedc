//! Economic Index
//!
//! PPPVs of every weighted trait are turned into population z-scores (negated
//! for lower-is-better traits) and aggregated:
//!
//! ```text
//! category_score = Σ w_trait × z
//! base           = Σ category_score × w_category
//! penalty        = λ × max(0, F − F_ideal)
//! raw            = base − penalty
//! normalized     = clamp(50 + 15 × raw, 0, 100)
//! ```
//!
//! The 15× scale assumes aggregated z-scores mostly stay within ±3; heavily
//! skewed category weights clip at 0 or 100 more often.

use super::inbreeding::{calculate_inbreeding, InbreedingResult};
use super::pppv::{calculate_pppv, PppvMap};
use crate::params::GeneticParameters;
use crate::record::TraitRecord;
use crate::utils::{Grade, PopulationStatistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reliability reported when no PPPV could be computed
const FALLBACK_RELIABILITY: f64 = 50.0;

/// One trait's share of a category score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitContribution {
    pub pppv: f64,
    /// Direction-adjusted z-score (higher = better)
    pub z_score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Σ trait weight × z over the traits available for this pair
    pub score: f64,
    pub weight: f64,
    /// `score × weight`
    pub contribution: f64,
    pub traits: BTreeMap<String, TraitContribution>,
}

/// Full economic index of one mating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicIndex {
    /// Σ category contributions, before the inbreeding penalty
    pub base: f64,
    pub inbreeding_penalty: f64,
    pub raw: f64,
    /// Display score in [0, 100]
    pub normalized: f64,
    pub grade: Grade,
    pub categories: BTreeMap<String, CategoryScore>,
    pub inbreeding: InbreedingResult,
    /// Mean combined reliability of the PPPVs used
    pub reliability: f64,
    pub pppv: PppvMap,
}

/// `λ × max(0, F − ideal)`
pub fn inbreeding_penalty(expected_inbreeding: f64, params: &GeneticParameters) -> f64 {
    params.penalty_lambda * (expected_inbreeding - params.inbreeding.ideal).max(0.0)
}

/// Weighted, direction-adjusted z-score sum of one category
pub fn score_category(
    trait_weights: &BTreeMap<String, f64>,
    category_weight: f64,
    pppv: &PppvMap,
    params: &GeneticParameters,
    stats: &PopulationStatistics,
) -> CategoryScore {
    let traits: BTreeMap<String, TraitContribution> = trait_weights
        .iter()
        .filter_map(|(trait_key, &weight)| {
            let entry = pppv.get(trait_key)?;
            let mut z_score = stats.z_score(trait_key, entry.pppv);
            if params.is_lower_better(trait_key) {
                z_score = -z_score;
            }
            Some((
                trait_key.clone(),
                TraitContribution {
                    pppv: entry.pppv,
                    z_score,
                    weight,
                    contribution: weight * z_score,
                },
            ))
        })
        .collect();

    let score: f64 = traits.values().map(|t| t.contribution).sum();

    CategoryScore {
        score,
        weight: category_weight,
        contribution: score * category_weight,
        traits,
    }
}

/// Mean combined reliability over the PPPV entries
pub fn average_reliability(pppv: &PppvMap) -> f64 {
    if pppv.is_empty() {
        return FALLBACK_RELIABILITY;
    }
    pppv.values().map(|p| p.combined_reliability).sum::<f64>() / pppv.len() as f64
}

/// Economic index of one mating
///
/// `category_weights` overrides the configured priorities for this call; the
/// caller validates it beforehand. Categories without a trait-weight table are
/// ignored.
pub fn calculate_economic_index(
    dam: &TraitRecord,
    sire: &TraitRecord,
    category_weights: Option<&BTreeMap<String, f64>>,
    params: &GeneticParameters,
    stats: &PopulationStatistics,
) -> EconomicIndex {
    let category_weights = category_weights.unwrap_or(&params.category_weights);

    let index_traits = params.index_traits();
    let pppv = calculate_pppv(dam, sire, Some(index_traits.as_slice()), params, stats);

    let categories: BTreeMap<String, CategoryScore> = category_weights
        .iter()
        .filter_map(|(category, &weight)| {
            let trait_weights = params.trait_weights.get(category)?;
            Some((
                category.clone(),
                score_category(trait_weights, weight, &pppv, params, stats),
            ))
        })
        .collect();

    let base: f64 = categories.values().map(|c| c.contribution).sum();

    let inbreeding = calculate_inbreeding(dam, sire, params);
    let penalty = inbreeding_penalty(inbreeding.expected_inbreeding, params);

    let raw = base - penalty;
    let normalized = params.score_scale.apply(raw);

    EconomicIndex {
        base,
        inbreeding_penalty: penalty,
        raw,
        normalized,
        grade: Grade::from_score(normalized),
        categories,
        inbreeding,
        reliability: average_reliability(&pppv),
        pppv,
    }
}
