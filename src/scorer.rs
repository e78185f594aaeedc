//! Compatibility Scorer - stable external shape of one mating's score
//!
//! Wraps the economic index into the contract callers depend on (`score`,
//! `base_score`, `adjustments`, `categories`, `inbreeding`, `grade`,
//! `reliability`). Adjustments are expressed in display points (×15).
//!
//! Genotype and sustainability bonuses are always reported; they only move
//! `score` when `GeneticParameters::apply_bonuses` is set.

use crate::metrics::haplotype::panel_for;
use crate::metrics::{
    calculate_economic_index, genotype_bonus, sustainability_bonus, EconomicIndex,
    InbreedingResult,
};
use crate::params::GeneticParameters;
use crate::record::TraitRecord;
use crate::utils::{Grade, PopulationStatistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display-point adjustments relative to `base_score`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    /// `−penalty × 15`, zero when inbreeding is at or below ideal
    pub inbreeding_penalty: f64,
    pub genotype_bonus: f64,
    pub sustainability_bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryContribution {
    pub weight: f64,
    pub contribution: f64,
}

/// Score of one dam × sire pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    /// Bounded display score in [0, 100]
    pub score: f64,
    /// `50 + 15 × base` before penalty and clamping
    pub base_score: f64,
    pub adjustments: Adjustments,
    pub categories: BTreeMap<String, CategoryContribution>,
    pub inbreeding: InbreedingResult,
    pub grade: Grade,
    pub reliability: f64,
}

impl CompatibilityResult {
    pub fn expected_inbreeding(&self) -> f64 {
        self.inbreeding.expected_inbreeding
    }

    pub fn has_critical_haplotype(&self) -> bool {
        self.inbreeding.has_critical_haplotype()
    }
}

/// Main compatibility scorer
///
/// Holds validated parameters and reference statistics; every call is a pure
/// function of its inputs, so one scorer is shared across threads.
#[derive(Debug, Clone)]
pub struct CompatibilityScorer {
    params: GeneticParameters,
    stats: PopulationStatistics,
}

impl Default for CompatibilityScorer {
    fn default() -> Self {
        Self::new(GeneticParameters::default(), PopulationStatistics::default())
    }
}

impl CompatibilityScorer {
    /// Both inputs are expected to be validated already (see `GeneticParameters::load`)
    pub fn new(params: GeneticParameters, stats: PopulationStatistics) -> Self {
        Self { params, stats }
    }

    pub fn params(&self) -> &GeneticParameters {
        &self.params
    }

    pub fn stats(&self) -> &PopulationStatistics {
        &self.stats
    }

    /// Internal aggregation (categories with per-trait detail, PPPVs used)
    pub fn economic_index(
        &self,
        dam: &TraitRecord,
        sire: &TraitRecord,
        category_weights: Option<&BTreeMap<String, f64>>,
    ) -> EconomicIndex {
        calculate_economic_index(dam, sire, category_weights, &self.params, &self.stats)
    }

    /// Score one pairing
    pub fn score(
        &self,
        dam: &TraitRecord,
        sire: &TraitRecord,
        category_weights: Option<&BTreeMap<String, f64>>,
    ) -> CompatibilityResult {
        let index = self.economic_index(dam, sire, category_weights);
        self.project(index, dam, sire)
    }

    /// Re-shape an economic index into the external contract
    pub fn project(
        &self,
        index: EconomicIndex,
        dam: &TraitRecord,
        sire: &TraitRecord,
    ) -> CompatibilityResult {
        let scale = &self.params.score_scale;

        let adjustments = Adjustments {
            inbreeding_penalty: if index.inbreeding_penalty > 0.0 {
                -index.inbreeding_penalty * scale.scale
            } else {
                0.0
            },
            genotype_bonus: genotype_bonus(sire, panel_for(dam, sire, &self.params)),
            sustainability_bonus: sustainability_bonus(sire),
        };

        let (score, grade) = if self.params.apply_bonuses {
            let boosted = (index.normalized
                + adjustments.genotype_bonus
                + adjustments.sustainability_bonus)
                .clamp(0.0, 100.0);
            (boosted, Grade::from_score(boosted))
        } else {
            (index.normalized, index.grade)
        };

        let categories = index
            .categories
            .iter()
            .map(|(name, category)| {
                (
                    name.clone(),
                    CategoryContribution {
                        weight: category.weight,
                        contribution: category.contribution,
                    },
                )
            })
            .collect();

        CompatibilityResult {
            score,
            base_score: scale.unclamped(index.base),
            adjustments,
            categories,
            inbreeding: index.inbreeding,
            grade,
            reliability: index.reliability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn premium_sire() -> TraitRecord {
        TraitRecord::new("s")
            .with_value("milk", 1500.0)
            .with_text("beta_casein", "A2A2")
            .with_text("kappa_casein", "BB")
            .with_value("feed_efficiency", 110.0)
    }

    #[test]
    fn test_projection_matches_index() {
        let scorer = CompatibilityScorer::default();
        let dam = TraitRecord::new("d").with_value("milk", 500.0);
        let sire = premium_sire();

        let index = scorer.economic_index(&dam, &sire, None);
        let result = scorer.score(&dam, &sire, None);

        assert_relative_eq!(result.score, index.normalized);
        assert_relative_eq!(result.base_score, 50.0 + 15.0 * index.base, epsilon = 1e-12);
        assert_eq!(result.grade, index.grade);
        assert_eq!(result.categories.len(), index.categories.len());
        assert_relative_eq!(result.adjustments.inbreeding_penalty, 0.0);
        assert_relative_eq!(result.adjustments.genotype_bonus, 8.0);
        assert_relative_eq!(result.adjustments.sustainability_bonus, 3.0);
    }

    #[test]
    fn test_penalty_in_display_points() {
        let scorer = CompatibilityScorer::default();
        let dam = TraitRecord::new("d").with_value("genomic_inbreeding", 10.0);
        let sire = TraitRecord::new("s").with_value("gfi", 5.0);

        // F = 2.5 + 2.5 = 5.0, below ideal
        let result = scorer.score(&dam, &sire, None);
        assert_relative_eq!(result.adjustments.inbreeding_penalty, 0.0);

        let sire = TraitRecord::new("s").with_value("gfi", 9.0);
        // F = 2.5 + 4.5 = 7.0, penalty 3 × 0.75 = 2.25
        let result = scorer.score(&dam, &sire, None);
        assert_relative_eq!(result.adjustments.inbreeding_penalty, -33.75, epsilon = 1e-9);
        assert_relative_eq!(result.score, 50.0 - 33.75, epsilon = 1e-9);
    }

    #[test]
    fn test_bonuses_applied_when_enabled() {
        let params = GeneticParameters {
            apply_bonuses: true,
            ..GeneticParameters::default()
        };
        let scorer = CompatibilityScorer::new(params, PopulationStatistics::default());
        let dam = TraitRecord::new("d");
        let sire = TraitRecord::new("s").with_text("beta_casein", "A2A2");

        let result = scorer.score(&dam, &sire, None);
        assert_relative_eq!(result.score, 55.0);
        assert_eq!(result.grade, Grade::B);
    }
}
