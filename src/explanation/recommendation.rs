//! Recommendation generator
//!
//! Status thresholds are checked in fixed priority: a critical haplotype
//! collision always wins, then score/inbreeding tiers from the policy.

use crate::explanation::types::{Recommendation, RecommendationStatus};
use crate::params::GeneticParameters;
use crate::scorer::CompatibilityResult;

pub struct RecommendationGenerator;

impl RecommendationGenerator {
    /// Status from score, expected inbreeding and critical collisions
    pub fn status(
        score: f64,
        inbreeding: f64,
        has_critical_haplotype: bool,
        params: &GeneticParameters,
    ) -> RecommendationStatus {
        let policy = &params.recommendation;

        if has_critical_haplotype {
            RecommendationStatus::NotRecommended
        } else if score >= policy.highly_recommended_score
            && inbreeding <= policy.recommended_max_inbreeding
        {
            RecommendationStatus::HighlyRecommended
        } else if score >= policy.recommended_score && inbreeding <= policy.recommended_max_inbreeding
        {
            RecommendationStatus::Recommended
        } else if score >= policy.acceptable_score || inbreeding <= policy.acceptable_max_inbreeding {
            RecommendationStatus::Acceptable
        } else {
            RecommendationStatus::NotRecommended
        }
    }

    pub fn generate(result: &CompatibilityResult, params: &GeneticParameters) -> Recommendation {
        let score = result.score;
        let inbreeding = result.inbreeding.expected_inbreeding;
        let has_critical = result.has_critical_haplotype();
        let ideal = params.inbreeding.ideal;

        let status = Self::status(score, inbreeding, has_critical, params);
        let message = match (status, has_critical) {
            (RecommendationStatus::NotRecommended, true) => "Mating NOT recommended - lethal risk",
            (RecommendationStatus::HighlyRecommended, _) => "Highly recommended!",
            (RecommendationStatus::Recommended, _) => "Recommended",
            (RecommendationStatus::Acceptable, _) => "Acceptable - monitor results",
            (RecommendationStatus::NotRecommended, false) => "Not recommended",
        };

        let mut positives = Vec::new();
        if score >= params.recommendation.excellent_score {
            positives.push("Excellent genetic compatibility".to_string());
        }
        if inbreeding <= ideal {
            positives.push(format!("Ideal inbreeding ({:.1}%)", inbreeding));
        }
        if result.inbreeding.haplotype_risks.is_empty() {
            positives.push("No haplotype risks".to_string());
        }

        let mut negatives = Vec::new();
        if score < params.recommendation.acceptable_score {
            negatives.push(format!("Low compatibility (score: {:.0})", score));
        }
        if inbreeding > ideal {
            negatives.push(format!("Inbreeding above ideal ({:.1}%)", inbreeding));
        }
        for risk in result.inbreeding.critical_haplotypes() {
            negatives.push(format!("Critical risk: {}", risk.haplotype));
        }

        Recommendation {
            status,
            message: format!("{} {}", status.icon(), message),
            positives,
            negatives,
            grade: result.grade,
            confidence: result.reliability,
        }
    }
}
