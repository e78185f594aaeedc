//! Expected Inbreeding
//!
//! Estimation precedence, first applicable wins:
//!
//! 1. Genomic: dam gINB and sire GFI both known → `gINB/4 + GFI/2`
//! 2. Partial genomic: only one of them → its contribution plus a fixed offset
//! 3. Pedigree: coancestry from shared sires / maternal grandsires × 100,
//!    attempted only when either record carries pedigree ids
//! 4. Estimated: fixed fallback figure
//!
//! Haplotype collisions are analysed independently of the numeric estimate;
//! a critical collision makes the mating unacceptable whatever the figure.

use super::haplotype::{detect_haplotype_risks, HaplotypeRisk};
use crate::params::{GeneticParameters, InbreedingThresholds};
use crate::record::TraitRecord;
use crate::resolver::{resolve, resolve_text};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pedigree field names (NAAB code preferred over registration number)
const SIRE_KEYS: [&str; 2] = ["sire_naab", "sire_reg"];
const MGS_KEYS: [&str; 2] = ["mgs_naab", "mgs_reg"];
const OWN_CODE_KEYS: [&str; 2] = ["naab_code", "code"];

/// Coancestry of the recognised relationships
const COANCESTRY_SIRE_IS_DAMS_SIRE: f64 = 0.25;
const COANCESTRY_SIRE_IS_DAMS_MGS: f64 = 0.125;
const COANCESTRY_SHARED_SIRE: f64 = 0.125;
const COANCESTRY_SHARED_MGS: f64 = 0.0625;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InbreedingMethod {
    Genomic,
    PartialGenomic,
    Pedigree,
    Estimated,
}

impl fmt::Display for InbreedingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InbreedingMethod::Genomic => "genomic",
            InbreedingMethod::PartialGenomic => "partial genomic",
            InbreedingMethod::Pedigree => "pedigree",
            InbreedingMethod::Estimated => "estimated",
        };
        f.write_str(label)
    }
}

/// Numeric risk tier of the expected inbreeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InbreedingRisk {
    Low,
    Moderate,
    High,
    Critical,
}

impl InbreedingRisk {
    /// `Low < ideal ≤ Moderate < acceptable ≤ High < warning ≤ Critical`
    pub fn classify(inbreeding: f64, thresholds: &InbreedingThresholds) -> Self {
        if inbreeding < thresholds.ideal {
            InbreedingRisk::Low
        } else if inbreeding < thresholds.acceptable {
            InbreedingRisk::Moderate
        } else if inbreeding < thresholds.warning {
            InbreedingRisk::High
        } else {
            InbreedingRisk::Critical
        }
    }
}

impl fmt::Display for InbreedingRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InbreedingRisk::Low => "Low",
            InbreedingRisk::Moderate => "Moderate",
            InbreedingRisk::High => "High",
            InbreedingRisk::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Genomic inputs that were available
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InbreedingDetails {
    pub dam_genomic_inbreeding: Option<f64>,
    pub sire_gfi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InbreedingResult {
    /// Expected inbreeding of the progeny (percent)
    pub expected_inbreeding: f64,
    pub method: InbreedingMethod,
    pub risk_level: InbreedingRisk,
    /// `expected_inbreeding ≤ acceptable` and no critical haplotype collision
    pub acceptable: bool,
    pub details: InbreedingDetails,
    pub haplotype_risks: Vec<HaplotypeRisk>,
    pub recommendation: String,
}

impl InbreedingResult {
    pub fn has_critical_haplotype(&self) -> bool {
        self.haplotype_risks.iter().any(HaplotypeRisk::is_critical)
    }

    pub fn critical_haplotypes(&self) -> impl Iterator<Item = &HaplotypeRisk> {
        self.haplotype_risks.iter().filter(|r| r.is_critical())
    }
}

/// Coancestry × 100 from pedigree ids
///
/// `None` when neither record carries a pedigree id; otherwise the strongest
/// recognised relationship, or the population baseline when none matches.
pub fn pedigree_inbreeding(
    dam: &TraitRecord,
    sire: &TraitRecord,
    params: &GeneticParameters,
) -> Option<f64> {
    let dam_sire = resolve_text(dam, &SIRE_KEYS);
    let dam_mgs = resolve_text(dam, &MGS_KEYS);
    let sire_sire = resolve_text(sire, &SIRE_KEYS);
    let sire_mgs = resolve_text(sire, &MGS_KEYS);

    if [dam_sire, dam_mgs, sire_sire, sire_mgs].iter().all(Option::is_none) {
        return None;
    }

    let sire_code = resolve_text(sire, &OWN_CODE_KEYS);
    let same = |a: Option<&str>, b: Option<&str>| matches!((a, b), (Some(x), Some(y)) if x == y);

    let coancestry = if same(dam_sire, sire_code) {
        COANCESTRY_SIRE_IS_DAMS_SIRE
    } else if same(dam_mgs, sire_code) {
        COANCESTRY_SIRE_IS_DAMS_MGS
    } else if same(dam_sire, sire_sire) {
        COANCESTRY_SHARED_SIRE
    } else if same(dam_mgs, sire_mgs) {
        COANCESTRY_SHARED_MGS
    } else {
        params.estimation.baseline_coancestry
    };

    (coancestry > 0.0).then_some(coancestry * 100.0)
}

/// Deterministic advice from the risk tier and critical collisions
pub fn inbreeding_recommendation(risk: InbreedingRisk, haplotype_risks: &[HaplotypeRisk]) -> String {
    let critical: Vec<&str> = haplotype_risks
        .iter()
        .filter(|r| r.is_critical())
        .map(|r| r.haplotype.as_str())
        .collect();

    if !critical.is_empty() {
        return format!(
            "Mating not recommended - lethal haplotype risk ({})",
            critical.join(", ")
        );
    }

    match risk {
        InbreedingRisk::Low => "Mating recommended - ideal inbreeding",
        InbreedingRisk::Moderate => "Mating acceptable - monitor progeny",
        InbreedingRisk::High => "Caution - consider alternatives if available",
        InbreedingRisk::Critical => "Mating not recommended - inbreeding too high",
    }
    .to_string()
}

/// Expected inbreeding and haplotype analysis of one mating
pub fn calculate_inbreeding(
    dam: &TraitRecord,
    sire: &TraitRecord,
    params: &GeneticParameters,
) -> InbreedingResult {
    let dam_ginb = resolve(dam, "genomic_inbreeding");
    let sire_gfi = resolve(sire, "gfi");
    let estimation = &params.estimation;

    let (expected_inbreeding, method) = match (dam_ginb, sire_gfi) {
        (Some(ginb), Some(gfi)) => (ginb / 4.0 + gfi / 2.0, InbreedingMethod::Genomic),
        (Some(ginb), None) => (
            ginb / 4.0 + estimation.dam_only_offset,
            InbreedingMethod::PartialGenomic,
        ),
        (None, Some(gfi)) => (
            gfi / 2.0 + estimation.sire_only_offset,
            InbreedingMethod::PartialGenomic,
        ),
        (None, None) => match pedigree_inbreeding(dam, sire, params) {
            Some(value) => (value, InbreedingMethod::Pedigree),
            None => {
                tracing::debug!("no genomic or pedigree data, using fallback inbreeding estimate");
                (estimation.fallback_inbreeding, InbreedingMethod::Estimated)
            }
        },
    };

    let haplotype_risks = detect_haplotype_risks(dam, sire, params);
    let risk_level = InbreedingRisk::classify(expected_inbreeding, &params.inbreeding);
    let has_critical = haplotype_risks.iter().any(HaplotypeRisk::is_critical);

    InbreedingResult {
        expected_inbreeding,
        method,
        risk_level,
        acceptable: expected_inbreeding <= params.inbreeding.acceptable && !has_critical,
        details: InbreedingDetails {
            dam_genomic_inbreeding: dam_ginb,
            sire_gfi,
        },
        recommendation: inbreeding_recommendation(risk_level, &haplotype_risks),
        haplotype_risks,
    }
}
