//! Lethal recessive haplotypes
//!
//! For every marker of the breed panel, both parents' carrier status is looked
//! up and a risk record is emitted when at least one parent carries the allele:
//! `critical` when both do (25% of calves affected), `low` when only one does
//! (progeny may be carriers, no lethal calves). `Unknown` is never read as free.

use crate::params::GeneticParameters;
use crate::record::{Blob, FieldValue, TraitRecord};
use crate::resolver::resolve_text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Carrier status of one animal for one marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaplotypeStatus {
    Free,
    Carrier,
    Unknown,
    Affected,
}

impl HaplotypeStatus {
    /// Text encodings seen in evaluation sheets (T/TF/FREE, C/TC/CARRIER, ...)
    pub fn parse_text(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "T" | "F" | "TF" | "FREE" | "TESTED FREE" => Some(HaplotypeStatus::Free),
            "C" | "TC" | "CARRIER" => Some(HaplotypeStatus::Carrier),
            "A" | "AFFECTED" => Some(HaplotypeStatus::Affected),
            _ => None,
        }
    }

    /// Numeric encoding: 0 free, 2 affected, any other non-zero value carrier
    pub fn from_copies(copies: f64) -> Option<Self> {
        if !copies.is_finite() {
            None
        } else if copies == 0.0 {
            Some(HaplotypeStatus::Free)
        } else if copies == 2.0 {
            Some(HaplotypeStatus::Affected)
        } else {
            Some(HaplotypeStatus::Carrier)
        }
    }

    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Self::parse_text(s),
            FieldValue::Number(n) => Self::from_copies(*n),
            FieldValue::Missing => None,
        }
    }

    /// Animal transmits the lethal allele to some of its progeny
    pub fn carries_allele(&self) -> bool {
        matches!(self, HaplotypeStatus::Carrier | HaplotypeStatus::Affected)
    }
}

impl fmt::Display for HaplotypeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HaplotypeStatus::Free => "Free",
            HaplotypeStatus::Carrier => "Carrier",
            HaplotypeStatus::Unknown => "Unknown",
            HaplotypeStatus::Affected => "Affected",
        };
        f.write_str(label)
    }
}

/// Severity of a haplotype finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Critical,
}

/// One marker where at least one parent carries the allele
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaplotypeRisk {
    pub haplotype: String,
    pub dam_status: HaplotypeStatus,
    pub sire_status: HaplotypeStatus,
    pub severity: RiskSeverity,
    pub probability: String,
    pub recommendation: String,
}

impl HaplotypeRisk {
    pub fn is_critical(&self) -> bool {
        self.severity == RiskSeverity::Critical
    }
}

/// Carrier status of `record` for `marker`
///
/// Searched in order: the marker as a direct field (as given, UPPER, lower),
/// the raw `genetic_data` blob, then the `haplotypes` blob. Values that match
/// no known encoding are skipped, not treated as free.
pub fn haplotype_status(record: &TraitRecord, marker: &str) -> HaplotypeStatus {
    let keys = [marker.to_string(), marker.to_uppercase(), marker.to_lowercase()];

    let direct = keys
        .iter()
        .find_map(|k| record.field(k).and_then(HaplotypeStatus::from_field));

    direct
        .or_else(|| {
            [Blob::GeneticData, Blob::Haplotypes].into_iter().find_map(|blob| {
                keys.iter()
                    .find_map(|k| record.blob_field(blob, k).and_then(HaplotypeStatus::from_field))
            })
        })
        .unwrap_or(HaplotypeStatus::Unknown)
}

/// Panel for this mating: dam's breed, then sire's, then the default breed
pub fn panel_for<'p>(
    dam: &TraitRecord,
    sire: &TraitRecord,
    params: &'p GeneticParameters,
) -> &'p [String] {
    let breed = resolve_text(dam, &["breed"]).or_else(|| resolve_text(sire, &["breed"]));
    params.haplotype_panel(breed)
}

/// Risk records for every panel marker carried by at least one parent
pub fn detect_haplotype_risks(
    dam: &TraitRecord,
    sire: &TraitRecord,
    params: &GeneticParameters,
) -> Vec<HaplotypeRisk> {
    panel_for(dam, sire, params)
        .iter()
        .filter_map(|marker| {
            let dam_status = haplotype_status(dam, marker);
            let sire_status = haplotype_status(sire, marker);
            let name = marker.to_uppercase();

            match (dam_status.carries_allele(), sire_status.carries_allele()) {
                (true, true) => Some(HaplotypeRisk {
                    recommendation: format!("AVOID - 25% chance of a calf affected by {name}"),
                    haplotype: name,
                    dam_status,
                    sire_status,
                    severity: RiskSeverity::Critical,
                    probability: "25% lethal".to_string(),
                }),
                (dam_carrier, true) | (dam_carrier @ true, _) => {
                    let carrier = if dam_carrier { "dam" } else { "sire" };
                    Some(HaplotypeRisk {
                        recommendation: format!(
                            "Acceptable - {carrier} carries {name}, progeny may be carriers"
                        ),
                        haplotype: name,
                        dam_status,
                        sire_status,
                        severity: RiskSeverity::Low,
                        probability: "50% carrier".to_string(),
                    })
                }
                _ => None,
            }
        })
        .collect()
}

/// Sire tested free for every marker of its breed panel
pub fn is_panel_free(record: &TraitRecord, panel: &[String]) -> bool {
    !panel.is_empty()
        && panel
            .iter()
            .all(|marker| haplotype_status(record, marker) == HaplotypeStatus::Free)
}
