//! Sire genotype and sustainability bonuses (display points)
//!
//! Genotype: beta-casein A2A2 +5 / A1A2 +2, kappa-casein BB +3 / AB +1, free of
//! every lethal haplotype in the breed panel +5.
//! Sustainability: feed efficiency > 105 +3, RFI < −100 +3, Eco$ > 200 +2.

use super::haplotype::is_panel_free;
use crate::record::TraitRecord;
use crate::resolver::{resolve, resolve_text};

pub fn beta_casein_bonus(genotype: Option<&str>) -> f64 {
    match genotype.map(str::to_ascii_uppercase).as_deref() {
        Some("A2A2") => 5.0,
        Some("A1A2") => 2.0,
        _ => 0.0,
    }
}

pub fn kappa_casein_bonus(genotype: Option<&str>) -> f64 {
    match genotype.map(str::to_ascii_uppercase).as_deref() {
        Some("BB") => 3.0,
        Some("AB") => 1.0,
        _ => 0.0,
    }
}

/// Casein genotypes plus the haplotype-free bonus
pub fn genotype_bonus(sire: &TraitRecord, panel: &[String]) -> f64 {
    let mut bonus = beta_casein_bonus(resolve_text(sire, &["beta_casein"]))
        + kappa_casein_bonus(resolve_text(sire, &["kappa_casein"]));

    if is_panel_free(sire, panel) {
        bonus += 5.0;
    }
    bonus
}

pub fn sustainability_bonus(sire: &TraitRecord) -> f64 {
    let mut bonus = 0.0;

    if resolve(sire, "feed_efficiency").is_some_and(|v| v > 105.0) {
        bonus += 3.0;
    }
    if resolve(sire, "rfi").is_some_and(|v| v < -100.0) {
        bonus += 3.0;
    }
    if resolve(sire, "eco_dollars").is_some_and(|v| v > 200.0) {
        bonus += 2.0;
    }
    bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GeneticParameters;
    use crate::record::Blob;
    use approx::assert_relative_eq;

    #[test]
    fn test_casein_bonuses() {
        assert_relative_eq!(beta_casein_bonus(Some("a2a2")), 5.0);
        assert_relative_eq!(beta_casein_bonus(Some("A1A2")), 2.0);
        assert_relative_eq!(beta_casein_bonus(Some("A1A1")), 0.0);
        assert_relative_eq!(beta_casein_bonus(None), 0.0);
        assert_relative_eq!(kappa_casein_bonus(Some("BB")), 3.0);
        assert_relative_eq!(kappa_casein_bonus(Some("AB")), 1.0);
        assert_relative_eq!(kappa_casein_bonus(Some("AA")), 0.0);
    }

    #[test]
    fn test_genotype_bonus_with_free_panel() {
        let params = GeneticParameters::default();
        let panel = params.haplotype_panel(None);

        let mut sire = TraitRecord::new("s")
            .with_text("beta_casein", "A2A2")
            .with_blob_value(Blob::GeneticData, "kappa_casein", "AB");
        assert_relative_eq!(genotype_bonus(&sire, panel), 6.0);

        for marker in panel {
            sire = sire.with_text(marker.clone(), "TF");
        }
        assert_relative_eq!(genotype_bonus(&sire, panel), 11.0);
    }

    #[test]
    fn test_sustainability_bonus() {
        let sire = TraitRecord::new("s")
            .with_value("feed_efficiency", 108.0)
            .with_value("rfi", -120.0)
            .with_value("eco_dollars", 150.0);
        assert_relative_eq!(sustainability_bonus(&sire), 6.0);
        assert_relative_eq!(sustainability_bonus(&TraitRecord::new("s")), 0.0);
    }
}
