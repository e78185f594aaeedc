//! Normalization Utilities
//!
//! Population reference statistics (mean, std per trait) used to turn PPPVs into
//! comparable z-scores, plus the fixed banding of z-scores into interpretation
//! tiers and of display scores into letter grades.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Mean and standard deviation of one trait in the reference population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitStats {
    pub mean: f64,
    pub std: f64,
}

impl TraitStats {
    /// Unit variance around zero, used for traits without reference data
    pub const UNIT: TraitStats = TraitStats { mean: 0.0, std: 1.0 };

    pub fn variance(&self) -> f64 {
        self.std * self.std
    }

    pub fn z_score(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            return 0.0;
        }
        (value - self.mean) / self.std
    }
}

/// Static reference table: trait → (mean, std)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopulationStatistics {
    traits: BTreeMap<String, TraitStats>,
}

impl Default for PopulationStatistics {
    /// Holstein (US, 2024) reference figures
    fn default() -> Self {
        let table: [(&str, f64, f64); 29] = [
            ("milk", 500.0, 700.0),
            ("protein", 20.0, 25.0),
            ("fat", 25.0, 35.0),
            ("fat_percent", 0.0, 0.15),
            ("protein_percent", 0.0, 0.08),
            ("net_merit", 400.0, 350.0),
            ("cheese_merit", 450.0, 380.0),
            ("fluid_merit", 350.0, 320.0),
            ("grazing_merit", 300.0, 280.0),
            ("productive_life", 3.0, 2.5),
            ("scs", 2.85, 0.15),
            ("dpr", 0.5, 2.0),
            ("hcr", 0.5, 2.5),
            ("ccr", 0.5, 2.5),
            ("fertility_index", 0.5, 1.5),
            ("ptat", 0.5, 1.5),
            ("udc", 0.5, 1.2),
            ("flc", 0.3, 1.0),
            ("bwc", 0.0, 1.5),
            ("feed_saved", 100.0, 80.0),
            ("rfi", 0.0, 50.0),
            ("sire_calving_ease", 2.5, 0.8),
            ("daughter_calving_ease", 2.5, 0.6),
            ("sire_stillbirth", 7.0, 2.0),
            ("daughter_stillbirth", 6.0, 1.5),
            ("mastitis", 100.0, 5.0),
            ("metritis", 100.0, 3.0),
            ("cow_livability", 2.0, 2.5),
            ("heifer_livability", 1.0, 1.5),
        ];

        Self {
            traits: table
                .into_iter()
                .map(|(name, mean, std)| (name.to_string(), TraitStats { mean, std }))
                .collect(),
        }
    }
}

impl PopulationStatistics {
    pub fn new(traits: BTreeMap<String, TraitStats>) -> Result<Self, ConfigError> {
        let stats = Self { traits };
        stats.validate()?;
        Ok(stats)
    }

    /// Load statistics from a JSON object `{trait: {mean, std}}`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read population statistics: {:?}", path))?;

        let stats: PopulationStatistics = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse population statistics JSON")?;

        stats
            .validate()
            .with_context(|| format!("Invalid population statistics in {:?}", path))?;

        Ok(stats)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (trait_key, stats) in &self.traits {
            if !(stats.std.is_finite() && stats.std > 0.0 && stats.mean.is_finite()) {
                return Err(ConfigError::PopulationStd {
                    trait_key: trait_key.clone(),
                    std: stats.std,
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, trait_key: &str) -> Option<&TraitStats> {
        self.traits.get(trait_key)
    }

    /// Stats for a trait, unit variance when unknown
    pub fn stats_or_unit(&self, trait_key: &str) -> TraitStats {
        self.traits.get(trait_key).copied().unwrap_or(TraitStats::UNIT)
    }

    pub fn variance(&self, trait_key: &str) -> f64 {
        self.stats_or_unit(trait_key).variance()
    }

    /// z-score against the reference population (mean 0 / std 1 when unknown)
    pub fn z_score(&self, trait_key: &str, value: f64) -> f64 {
        self.stats_or_unit(trait_key).z_score(value)
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

/// Qualitative reading of a PPPV relative to the population
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    VeryLow,
    Low,
    Average,
    High,
    VeryHigh,
    Exceptional,
}

impl Interpretation {
    /// Bucket a direction-adjusted z-score (higher = better)
    pub fn from_z(z: f64) -> Self {
        match z {
            z if z >= 2.0 => Interpretation::Exceptional,
            z if z >= 1.0 => Interpretation::VeryHigh,
            z if z >= 0.5 => Interpretation::High,
            z if z >= -0.5 => Interpretation::Average,
            z if z >= -1.0 => Interpretation::Low,
            _ => Interpretation::VeryLow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interpretation::Exceptional => "Exceptional",
            Interpretation::VeryHigh => "Very High",
            Interpretation::High => "High",
            Interpretation::Average => "Average",
            Interpretation::Low => "Low",
            Interpretation::VeryLow => "Very Low",
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Letter grade of a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "F")]
    F,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// Fixed bands: A+ ≥ 85, A ≥ 75, B+ ≥ 65, B ≥ 55, C ≥ 45, D ≥ 35, F below
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 85.0 => Grade::APlus,
            s if s >= 75.0 => Grade::A,
            s if s >= 65.0 => Grade::BPlus,
            s if s >= 55.0 => Grade::B,
            s if s >= 45.0 => Grade::C,
            s if s >= 35.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Grade::APlus => "Exceptional",
            Grade::A => "Excellent",
            Grade::BPlus => "Very Good",
            Grade::B => "Good",
            Grade::C => "Average",
            Grade::D => "Below Average",
            Grade::F => "Inadequate",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol(), self.description())
    }
}
