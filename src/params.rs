//! Genetic Parameters
//!
//! Configuration bundle for one evaluation: heritabilities, economic weights,
//! inbreeding thresholds and the empirically tuned constants of the inbreeding
//! estimator. Defaults reproduce the Holstein (US 2024) setup; a JSON file may
//! override any subset of fields.
//!
//! Validation happens once, at load time (`load`, `with_category_weights`).
//! Evaluation code trusts the values it receives.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Allowed deviation from 1.0 for weight sums
pub const WEIGHT_TOLERANCE: f64 = 0.02;

/// Heritability used for traits missing from the table
pub const DEFAULT_HERITABILITY: f64 = 0.25;

/// Breed whose haplotype panel is used when a record has no usable `breed`
pub const DEFAULT_BREED: &str = "Holstein";

/// Inbreeding thresholds (percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InbreedingThresholds {
    pub ideal: f64,
    pub acceptable: f64,
    pub warning: f64,
}

impl Default for InbreedingThresholds {
    fn default() -> Self {
        Self {
            ideal: 6.25,
            acceptable: 8.0,
            warning: 10.0,
        }
    }
}

/// Constants of the expected-inbreeding estimator
///
/// These are tuned values carried over from field practice; none of them has a
/// derivation beyond "matches typical Holstein figures".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InbreedingEstimation {
    /// Added to `gINB/4` when only the dam's genomic inbreeding is known
    pub dam_only_offset: f64,
    /// Added to `GFI/2` when only the sire's genomic future inbreeding is known
    pub sire_only_offset: f64,
    /// Population coancestry used when pedigree ids exist but no relationship is found
    pub baseline_coancestry: f64,
    /// Estimate (percent) when neither genomic figures nor pedigree ids exist
    pub fallback_inbreeding: f64,
}

impl Default for InbreedingEstimation {
    fn default() -> Self {
        Self {
            dam_only_offset: 4.0,
            sire_only_offset: 3.0,
            baseline_coancestry: 0.04,
            fallback_inbreeding: 4.0,
        }
    }
}

/// Mapping of the raw index onto the 0-100 display scale
///
/// `score = clamp(midpoint + raw * scale, 0, 100)`. Calibrated for aggregated
/// z-scores spanning roughly ±3; heavily skewed weights clip more often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreScale {
    pub midpoint: f64,
    pub scale: f64,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            midpoint: 50.0,
            scale: 15.0,
        }
    }
}

impl ScoreScale {
    pub fn unclamped(&self, raw: f64) -> f64 {
        self.midpoint + raw * self.scale
    }

    pub fn apply(&self, raw: f64) -> f64 {
        self.unclamped(raw).clamp(0.0, 100.0)
    }
}

/// Thresholds of the single-pair recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationPolicy {
    pub highly_recommended_score: f64,
    pub recommended_score: f64,
    pub acceptable_score: f64,
    /// Inbreeding ceiling for the two "recommended" tiers
    pub recommended_max_inbreeding: f64,
    /// Inbreeding that still qualifies as acceptable regardless of score
    pub acceptable_max_inbreeding: f64,
    /// Score from which "excellent compatibility" is listed as a positive
    pub excellent_score: f64,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            highly_recommended_score: 75.0,
            recommended_score: 60.0,
            acceptable_score: 50.0,
            recommended_max_inbreeding: 6.0,
            acceptable_max_inbreeding: 8.0,
            excellent_score: 70.0,
        }
    }
}

/// Full configuration bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParameters {
    /// h² per trait
    pub heritabilities: BTreeMap<String, f64>,
    /// Economic weight per category (sum ≈ 1.0)
    pub category_weights: BTreeMap<String, f64>,
    /// Trait weights within each category (sum ≈ 1.0 per category)
    pub trait_weights: BTreeMap<String, BTreeMap<String, f64>>,
    /// Traits where a lower value is better (z-score is negated)
    pub lower_is_better: BTreeSet<String>,
    pub inbreeding: InbreedingThresholds,
    /// Index points lost per inbreeding percent above the ideal
    pub penalty_lambda: f64,
    pub default_sire_reliability: f64,
    pub default_dam_reliability: f64,
    pub estimation: InbreedingEstimation,
    pub score_scale: ScoreScale,
    pub recommendation: RecommendationPolicy,
    /// Lethal recessive markers by breed
    pub haplotype_panels: BTreeMap<String, Vec<String>>,
    /// Fold genotype/sustainability bonuses into the final score
    pub apply_bonuses: bool,
}

fn string_map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl Default for GeneticParameters {
    fn default() -> Self {
        let heritabilities = string_map(&[
            ("milk", 0.30),
            ("fat", 0.30),
            ("protein", 0.30),
            ("fat_percent", 0.50),
            ("protein_percent", 0.50),
            ("net_merit", 0.25),
            ("cheese_merit", 0.25),
            ("fluid_merit", 0.25),
            ("grazing_merit", 0.25),
            ("ptat", 0.30),
            ("udc", 0.25),
            ("flc", 0.15),
            ("bwc", 0.40),
            ("productive_life", 0.08),
            ("scs", 0.12),
            ("cow_livability", 0.02),
            ("heifer_livability", 0.02),
            ("dpr", 0.04),
            ("hcr", 0.01),
            ("ccr", 0.02),
            ("fertility_index", 0.04),
            ("early_first_calving", 0.10),
            ("mastitis", 0.04),
            ("metritis", 0.02),
            ("retained_placenta", 0.02),
            ("displaced_abomasum", 0.03),
            ("ketosis", 0.02),
            ("milk_fever", 0.05),
            ("sire_calving_ease", 0.08),
            ("daughter_calving_ease", 0.06),
            ("sire_stillbirth", 0.03),
            ("daughter_stillbirth", 0.02),
            ("gestation_length", 0.45),
            ("feed_saved", 0.15),
            ("rfi", 0.20),
            ("milking_speed", 0.15),
        ]);

        let category_weights = string_map(&[
            ("production", 0.30),
            ("health", 0.20),
            ("fertility", 0.18),
            ("type", 0.12),
            ("efficiency", 0.12),
            ("calving", 0.08),
        ]);

        let trait_weights = [
            (
                "production",
                string_map(&[
                    ("milk", 0.40),
                    ("protein", 0.30),
                    ("fat", 0.20),
                    ("protein_percent", 0.05),
                    ("fat_percent", 0.05),
                ]),
            ),
            (
                "health",
                string_map(&[
                    ("productive_life", 0.35),
                    ("scs", 0.20),
                    ("cow_livability", 0.15),
                    ("mastitis", 0.10),
                    ("metritis", 0.05),
                    ("displaced_abomasum", 0.05),
                    ("ketosis", 0.05),
                    ("milk_fever", 0.05),
                ]),
            ),
            (
                "fertility",
                string_map(&[
                    ("fertility_index", 0.30),
                    ("dpr", 0.25),
                    ("ccr", 0.20),
                    ("hcr", 0.15),
                    ("early_first_calving", 0.10),
                ]),
            ),
            (
                "type",
                string_map(&[("udc", 0.40), ("flc", 0.30), ("ptat", 0.20), ("bwc", 0.10)]),
            ),
            (
                "efficiency",
                string_map(&[("feed_saved", 0.40), ("rfi", 0.40), ("milking_speed", 0.20)]),
            ),
            (
                "calving",
                string_map(&[
                    ("sire_calving_ease", 0.30),
                    ("daughter_calving_ease", 0.30),
                    ("sire_stillbirth", 0.20),
                    ("daughter_stillbirth", 0.20),
                ]),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let lower_is_better = [
            "scs",
            "rfi",
            "sire_calving_ease",
            "daughter_calving_ease",
            "sire_stillbirth",
            "daughter_stillbirth",
            "gestation_length",
            "mastitis",
            "metritis",
            "retained_placenta",
            "displaced_abomasum",
            "ketosis",
            "milk_fever",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let panel = |markers: &[&str]| markers.iter().map(|m| m.to_string()).collect::<Vec<_>>();
        let haplotype_panels = [
            ("Holstein", panel(&["HH1", "HH2", "HH3", "HH4", "HH5", "HH6"])),
            ("Jersey", panel(&["JH1", "JH2"])),
            ("Ayrshire", panel(&["AH1", "AH2"])),
            ("Brown Swiss", panel(&["BH1", "BH2"])),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            heritabilities,
            category_weights,
            trait_weights,
            lower_is_better,
            inbreeding: InbreedingThresholds::default(),
            penalty_lambda: 3.0,
            default_sire_reliability: 75.0,
            default_dam_reliability: 55.0,
            estimation: InbreedingEstimation::default(),
            score_scale: ScoreScale::default(),
            recommendation: RecommendationPolicy::default(),
            haplotype_panels,
            apply_bonuses: false,
        }
    }
}

impl GeneticParameters {
    /// Load parameters from JSON (missing fields keep their defaults) and validate
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read genetic parameters: {:?}", path))?;

        let params: GeneticParameters = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse genetic parameters JSON")?;

        params
            .validate()
            .with_context(|| format!("Invalid genetic parameters in {:?}", path))?;

        Ok(params)
    }

    /// Copy with custom category priorities, validated
    pub fn with_category_weights(
        &self,
        category_weights: BTreeMap<String, f64>,
    ) -> Result<Self, ConfigError> {
        let mut params = self.clone();
        params.category_weights = category_weights;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_category_weights(&self.category_weights, &self.trait_weights)?;

        for (category, weights) in &self.trait_weights {
            for (trait_key, &weight) in weights {
                if weight < 0.0 {
                    return Err(ConfigError::NegativeWeight {
                        key: format!("{category}.{trait_key}"),
                        weight,
                    });
                }
            }
            let sum: f64 = weights.values().sum();
            if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(ConfigError::TraitWeightSum {
                    category: category.clone(),
                    sum,
                    tolerance: WEIGHT_TOLERANCE,
                });
            }
        }

        let t = &self.inbreeding;
        if !(t.ideal < t.acceptable && t.acceptable < t.warning) {
            return Err(ConfigError::ThresholdOrder {
                ideal: t.ideal,
                acceptable: t.acceptable,
                warning: t.warning,
            });
        }

        if self.penalty_lambda < 0.0 {
            return Err(ConfigError::NegativePenalty(self.penalty_lambda));
        }

        for (role, value) in [
            ("sire", self.default_sire_reliability),
            ("dam", self.default_dam_reliability),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::DefaultReliability { role, value });
            }
        }

        for (trait_key, &value) in &self.heritabilities {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Heritability {
                    trait_key: trait_key.clone(),
                    value,
                });
            }
        }

        Ok(())
    }

    pub fn heritability(&self, trait_key: &str) -> f64 {
        self.heritabilities
            .get(trait_key)
            .copied()
            .unwrap_or(DEFAULT_HERITABILITY)
    }

    pub fn is_lower_better(&self, trait_key: &str) -> bool {
        self.lower_is_better.contains(trait_key)
    }

    /// Every trait referenced by the category → trait weight table, sorted
    pub fn index_traits(&self) -> Vec<String> {
        self.trait_weights
            .values()
            .flat_map(|w| w.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Haplotype markers for a breed, falling back to the Holstein panel
    pub fn haplotype_panel(&self, breed: Option<&str>) -> &[String] {
        breed
            .and_then(|b| {
                self.haplotype_panels
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(b.trim()))
                    .map(|(_, markers)| markers)
            })
            .or_else(|| self.haplotype_panels.get(DEFAULT_BREED))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Check a category-weight map against the trait-weight table
pub fn validate_category_weights(
    category_weights: &BTreeMap<String, f64>,
    trait_weights: &BTreeMap<String, BTreeMap<String, f64>>,
) -> Result<(), ConfigError> {
    for (category, &weight) in category_weights {
        if weight < 0.0 {
            return Err(ConfigError::NegativeWeight {
                key: category.clone(),
                weight,
            });
        }
        if !trait_weights.contains_key(category) {
            return Err(ConfigError::UnknownCategory {
                category: category.clone(),
            });
        }
    }

    let sum: f64 = category_weights.values().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ConfigError::CategoryWeightSum {
            sum,
            tolerance: WEIGHT_TOLERANCE,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = GeneticParameters::default();
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.index_traits().len(), 29);
        assert!(params.is_lower_better("scs"));
        assert!(!params.is_lower_better("milk"));
    }

    #[test]
    fn test_category_weight_sum_rejected() {
        let params = GeneticParameters::default();
        let weights = string_map(&[("production", 0.5), ("health", 0.2)]);
        let err = params.with_category_weights(weights).unwrap_err();
        assert!(matches!(err, ConfigError::CategoryWeightSum { .. }));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let params = GeneticParameters::default();
        let weights = string_map(&[("production", 0.5), ("beauty", 0.5)]);
        let err = params.with_category_weights(weights).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownCategory {
                category: "beauty".to_string()
            }
        );
    }

    #[test]
    fn test_custom_priorities_accepted() {
        let params = GeneticParameters::default();
        let weights = string_map(&[("production", 0.6), ("health", 0.4)]);
        let custom = params.with_category_weights(weights).unwrap();
        assert_eq!(custom.category_weights.len(), 2);
    }

    #[test]
    fn test_threshold_order_rejected() {
        let mut params = GeneticParameters::default();
        params.inbreeding.acceptable = 11.0;
        assert!(matches!(
            params.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"penalty_lambda": 2.0, "inbreeding": {"ideal": 5.0}}"#;
        let params: GeneticParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.penalty_lambda, 2.0);
        assert_eq!(params.inbreeding.ideal, 5.0);
        assert_eq!(params.inbreeding.acceptable, 8.0);
        assert_eq!(params.category_weights.len(), 6);
    }

    #[test]
    fn test_haplotype_panel_lookup() {
        let params = GeneticParameters::default();
        assert_eq!(params.haplotype_panel(Some("jersey")), ["JH1", "JH2"]);
        assert_eq!(params.haplotype_panel(Some("Unknown")).len(), 6);
        assert_eq!(params.haplotype_panel(None)[0], "HH1");
    }

    #[test]
    fn test_score_scale() {
        let scale = ScoreScale::default();
        assert_eq!(scale.apply(0.0), 50.0);
        assert_eq!(scale.apply(10.0), 100.0);
        assert_eq!(scale.apply(-10.0), 0.0);
        assert_eq!(scale.unclamped(-10.0), -100.0);
    }
}
