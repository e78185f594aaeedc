//! Sire Ranker - single-pair evaluation and sire ranking
//!
//! `evaluate` scores one dam × sire pairing with PPPVs and a recommendation.
//! `rank` drops candidates above the inbreeding ceiling or with a critical
//! haplotype collision, sorts the rest by score (ties broken by sire id, then
//! input order) and keeps the top N. `rank_herd` repeats this for every dam in
//! parallel with Rayon; one bad dam is reported without failing its siblings.

use crate::error::EngineError;
use crate::explanation::{Recommendation, RecommendationGenerator};
use crate::metrics::{calculate_pppv, InbreedingRisk, PppvMap};
use crate::record::{AnimalIdentity, TraitRecord};
use crate::resolver::resolve;
use crate::scorer::{CategoryContribution, CompatibilityResult, CompatibilityScorer};
use crate::utils::Grade;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

/// Headline indices echoed back for each parent
pub const MAIN_INDEX_KEYS: [&str; 11] = [
    "milk",
    "protein",
    "fat",
    "net_merit",
    "productive_life",
    "fertility_index",
    "udc",
    "scs",
    "ptat",
    "gfi",
    "genomic_inbreeding",
];

/// Identity plus the headline indices available for an animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalDigest {
    #[serde(flatten)]
    pub identity: AnimalIdentity,
    pub main_indices: BTreeMap<String, f64>,
}

impl AnimalDigest {
    pub fn from_record(record: &TraitRecord) -> Self {
        Self {
            identity: record.identity(),
            main_indices: main_indices(record),
        }
    }
}

pub fn main_indices(record: &TraitRecord) -> BTreeMap<String, f64> {
    MAIN_INDEX_KEYS
        .iter()
        .filter_map(|key| resolve(record, key).map(|v| (key.to_string(), v)))
        .collect()
}

/// Complete single-pair analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatingEvaluation {
    pub dam: AnimalDigest,
    pub sire: AnimalDigest,
    pub pppv: PppvMap,
    pub compatibility: CompatibilityResult,
    pub recommendation: Recommendation,
}

/// Ranking request options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankOptions {
    pub top_n: usize,
    /// Candidates with a higher expected inbreeding (percent) are dropped
    pub max_inbreeding: f64,
    /// Per-request category priorities, validated by the caller
    pub category_weights: Option<BTreeMap<String, f64>>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            max_inbreeding: 8.0,
            category_weights: None,
        }
    }
}

/// Outcome of the ranking safety filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    ExceedsInbreeding,
    CriticalHaplotype,
}

impl Eligibility {
    pub fn of(result: &CompatibilityResult, max_inbreeding: f64) -> Self {
        if result.expected_inbreeding() > max_inbreeding {
            Eligibility::ExceedsInbreeding
        } else if result.has_critical_haplotype() {
            Eligibility::CriticalHaplotype
        } else {
            Eligibility::Eligible
        }
    }

    pub fn is_eligible(&self) -> bool {
        *self == Eligibility::Eligible
    }
}

/// A candidate scored against one dam, eligible or not
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenedCandidate {
    /// Position in the candidate list
    pub index: usize,
    pub sire: AnimalIdentity,
    pub compatibility: CompatibilityResult,
    pub eligibility: Eligibility,
}

/// An eligible candidate in rank order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// 1-based
    pub rank: usize,
    pub sire: AnimalIdentity,
    pub score: f64,
    pub grade: Grade,
    pub expected_inbreeding: f64,
    pub inbreeding_risk: InbreedingRisk,
    pub reliability: f64,
    pub categories: BTreeMap<String, CategoryContribution>,
    pub eligibility: Eligibility,
}

/// Ranking of one dam inside a herd batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamRanking {
    pub dam: AnimalDigest,
    pub top_sires: Vec<RankedCandidate>,
}

/// Per-dam entry of a herd batch, in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DamOutcome {
    Ranked(DamRanking),
    Failed { index: usize, error: String },
}

/// Priorities a herd batch was scored with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrioritiesUsed {
    Default,
    Custom(BTreeMap<String, f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HerdSummary {
    pub total_dams: usize,
    pub total_sires_analysed: usize,
    pub top_n: usize,
    pub max_inbreeding: f64,
    pub priorities_used: PrioritiesUsed,
    /// Mean score over every recommended sire (0 when none)
    pub average_score: f64,
    pub average_inbreeding: f64,
    pub unique_sires_recommended: usize,
    pub failed_dams: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HerdRanking {
    pub summary: HerdSummary,
    pub results: Vec<DamOutcome>,
}

/// Main sire ranker
#[derive(Debug, Clone, Default)]
pub struct SireRanker {
    scorer: CompatibilityScorer,
}

impl SireRanker {
    pub fn new(scorer: CompatibilityScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    /// Full analysis of one pairing under the configured priorities
    pub fn evaluate(&self, dam: &TraitRecord, sire: &TraitRecord) -> MatingEvaluation {
        let params = self.scorer.params();

        let pppv = calculate_pppv::<&str>(dam, sire, None, params, self.scorer.stats());
        let compatibility = self.scorer.score(dam, sire, None);
        let recommendation = RecommendationGenerator::generate(&compatibility, params);

        MatingEvaluation {
            dam: AnimalDigest::from_record(dam),
            sire: AnimalDigest::from_record(sire),
            pppv,
            compatibility,
            recommendation,
        }
    }

    /// Score every candidate and report which ones pass the safety filters
    pub fn screen(
        &self,
        dam: &TraitRecord,
        candidates: &[TraitRecord],
        options: &RankOptions,
    ) -> Vec<ScreenedCandidate> {
        candidates
            .iter()
            .enumerate()
            .map(|(index, sire)| {
                let compatibility = self.scorer.score(dam, sire, options.category_weights.as_ref());
                let eligibility = Eligibility::of(&compatibility, options.max_inbreeding);
                if !eligibility.is_eligible() {
                    let sire_id = sire.id();
                    tracing::debug!(
                        index,
                        sire = sire_id.as_deref().unwrap_or("?"),
                        ?eligibility,
                        "candidate filtered"
                    );
                }
                ScreenedCandidate {
                    index,
                    sire: sire.identity(),
                    compatibility,
                    eligibility,
                }
            })
            .collect()
    }

    /// Eligible candidates sorted by descending score, truncated to `top_n`
    pub fn rank(
        &self,
        dam: &TraitRecord,
        candidates: &[TraitRecord],
        options: &RankOptions,
    ) -> Vec<RankedCandidate> {
        let mut eligible: Vec<ScreenedCandidate> = self
            .screen(dam, candidates, options)
            .into_iter()
            .filter(|c| c.eligibility.is_eligible())
            .collect();

        eligible.sort_by(compare_candidates);

        eligible
            .into_iter()
            .take(options.top_n)
            .enumerate()
            .map(|(i, candidate)| RankedCandidate {
                rank: i + 1,
                sire: candidate.sire,
                score: candidate.compatibility.score,
                grade: candidate.compatibility.grade,
                expected_inbreeding: candidate.compatibility.expected_inbreeding(),
                inbreeding_risk: candidate.compatibility.inbreeding.risk_level,
                reliability: candidate.compatibility.reliability,
                categories: candidate.compatibility.categories,
                eligibility: candidate.eligibility,
            })
            .collect()
    }

    /// Rank the candidates for every dam (parallel across dams)
    pub fn rank_herd(
        &self,
        dams: &[TraitRecord],
        candidates: &[TraitRecord],
        options: &RankOptions,
    ) -> Result<HerdRanking, EngineError> {
        if candidates.is_empty() {
            return Err(EngineError::NoCandidates);
        }

        let start = Instant::now();

        let results: Vec<DamOutcome> = dams
            .par_iter()
            .enumerate()
            .map(|(index, dam)| {
                if dam.id().is_none() {
                    let error = EngineError::MissingDamIdentity { index };
                    tracing::warn!(index, %error, "dam skipped");
                    return DamOutcome::Failed {
                        index,
                        error: error.to_string(),
                    };
                }
                DamOutcome::Ranked(DamRanking {
                    dam: AnimalDigest::from_record(dam),
                    top_sires: self.rank(dam, candidates, options),
                })
            })
            .collect();

        let summary = summarize(&results, dams.len(), candidates.len(), options);

        tracing::info!(
            dams = dams.len(),
            sires = candidates.len(),
            failed = summary.failed_dams,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "herd ranking complete"
        );

        Ok(HerdRanking { summary, results })
    }
}

/// Descending score, then sire id, then input position
fn compare_candidates(a: &ScreenedCandidate, b: &ScreenedCandidate) -> Ordering {
    b.compatibility
        .score
        .total_cmp(&a.compatibility.score)
        .then_with(|| a.sire.id.cmp(&b.sire.id))
        .then_with(|| a.index.cmp(&b.index))
}

fn summarize(
    results: &[DamOutcome],
    total_dams: usize,
    total_sires: usize,
    options: &RankOptions,
) -> HerdSummary {
    let recommended: Vec<&RankedCandidate> = results
        .iter()
        .filter_map(|outcome| match outcome {
            DamOutcome::Ranked(ranking) => Some(&ranking.top_sires),
            DamOutcome::Failed { .. } => None,
        })
        .flatten()
        .collect();

    let mean = |values: Vec<f64>| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };

    let unique: FxHashSet<(&Option<String>, &Option<String>)> = recommended
        .iter()
        .map(|c| (&c.sire.id, &c.sire.code))
        .collect();

    HerdSummary {
        total_dams,
        total_sires_analysed: total_sires,
        top_n: options.top_n,
        max_inbreeding: options.max_inbreeding,
        priorities_used: match &options.category_weights {
            Some(weights) => PrioritiesUsed::Custom(weights.clone()),
            None => PrioritiesUsed::Default,
        },
        average_score: mean(recommended.iter().map(|c| c.score).collect()),
        average_inbreeding: mean(recommended.iter().map(|c| c.expected_inbreeding).collect()),
        unique_sires_recommended: unique.len(),
        failed_dams: results
            .iter()
            .filter(|o| matches!(o, DamOutcome::Failed { .. }))
            .count(),
    }
}
