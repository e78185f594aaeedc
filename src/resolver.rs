//! Trait Resolver
//!
//! Finds a trait's value and reliability in a heterogeneous record. The search
//! order is explicit: a static alias table gives the candidate keys for a
//! canonical trait, and each key is probed in a fixed list of locations (top
//! level first, then the nested blobs). Absence is `None`, never an error.

use crate::params::GeneticParameters;
use crate::record::{Blob, FieldValue, Role, TraitRecord};
use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;

/// Where a key is probed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    TopLevel,
    Nested(Blob),
}

/// Probe order for trait values
pub const VALUE_LOCATIONS: [Location; 3] = [
    Location::TopLevel,
    Location::Nested(Blob::MainIndices),
    Location::Nested(Blob::GeneticData),
];

/// Canonical trait → ordered aliases (canonical name first)
static ALIASES: &[(&str, &[&str])] = &[
    ("genomic_inbreeding", &["genomic_inbreeding", "gINB", "ginb", "gInb"]),
    ("gfi", &["gfi", "GFI", "genomic_future_inbreeding"]),
    ("productive_life", &["productive_life", "PRODUCTIVE LIFE", "PL"]),
    ("fertility_index", &["fertility_index", "FERTILITY INDEX", "FI"]),
    ("scs", &["scs", "SCS", "SOMATIC CELL SCORE"]),
    ("dpr", &["dpr", "DPR", "DAUGHTER PREGNANCY RATE"]),
    ("hcr", &["hcr", "HCR", "HEIFER CONCEPTION RATE", "heifer_conception_rate"]),
    ("ccr", &["ccr", "CCR", "COW CONCEPTION RATE", "cow_conception_rate"]),
];

/// Progeny-count fields used to infer a sire's reliability
const PROGENY_COUNT_KEYS: [&str; 2] = ["daughters", "num_daughters"];

pub type KeyList<'a> = SmallVec<[Cow<'a, str>; 4]>;

/// Candidate keys for a trait: its alias list, or the name plus UPPER/lower variants
pub fn trait_keys(trait_key: &str) -> KeyList<'_> {
    if let Some((_, aliases)) = ALIASES.iter().find(|(canonical, _)| *canonical == trait_key) {
        return aliases.iter().map(|a| Cow::Borrowed(*a)).collect();
    }

    let mut keys: KeyList<'_> = SmallVec::new();
    keys.push(Cow::Borrowed(trait_key));
    for variant in [trait_key.to_uppercase(), trait_key.to_lowercase()] {
        if !keys.iter().any(|k| *k == variant) {
            keys.push(Cow::Owned(variant));
        }
    }
    keys
}

/// Full ordered resolution plan for a trait value
pub fn lookup_plan(trait_key: &str) -> Vec<(Location, Cow<'_, str>)> {
    let keys = trait_keys(trait_key);
    VALUE_LOCATIONS
        .iter()
        .flat_map(|location| keys.iter().map(move |key| (*location, key.clone())))
        .collect()
}

fn probe<'r>(record: &'r TraitRecord, location: Location, key: &str) -> Option<&'r FieldValue> {
    match location {
        Location::TopLevel => record.field(key),
        Location::Nested(blob) => record.blob_field(blob, key),
    }
}

/// First value along the plan that parses as a finite number
pub fn resolve(record: &TraitRecord, trait_key: &str) -> Option<f64> {
    let keys = trait_keys(trait_key);
    VALUE_LOCATIONS.iter().find_map(|&location| {
        keys.iter()
            .find_map(|key| probe(record, location, key).and_then(FieldValue::as_f64))
    })
}

/// First non-empty text value among `keys`, searched like trait values
pub fn resolve_text<'r>(record: &'r TraitRecord, keys: &[&str]) -> Option<&'r str> {
    VALUE_LOCATIONS.iter().find_map(|&location| {
        keys.iter().find_map(|key| {
            probe(record, location, key)
                .and_then(FieldValue::as_text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
    })
}

/// Where a reliability figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilitySource {
    /// `{trait}_rel` at the top level
    Explicit,
    /// The `reliabilities` blob
    ReliabilityBlob,
    /// The raw `genetic_data` blob
    GeneticData,
    /// Inferred from the sire's documented daughters
    ProgenyCount,
    /// Role default from the parameters
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedReliability {
    pub value: f64,
    pub source: ReliabilitySource,
}

fn as_reliability(value: Option<&FieldValue>) -> Option<f64> {
    value
        .and_then(FieldValue::as_f64)
        .filter(|v| (0.0..=100.0).contains(v))
}

/// Step function: more documented daughters ⇒ higher reliability (capped at 99)
pub fn reliability_from_progeny(daughters: u64) -> Option<f64> {
    match daughters {
        0 => None,
        d if d >= 1000 => Some(99.0),
        d if d >= 500 => Some(95.0),
        d if d >= 100 => Some(85.0),
        d if d >= 50 => Some(80.0),
        _ => Some(75.0),
    }
}

/// Reliability (0-100) of a parent's evaluation for one trait
pub fn resolve_reliability(
    record: &TraitRecord,
    trait_key: &str,
    role: Role,
    params: &GeneticParameters,
) -> ResolvedReliability {
    let rel_key = format!("{trait_key}_rel");

    if let Some(value) = as_reliability(record.field(&rel_key)) {
        return ResolvedReliability { value, source: ReliabilitySource::Explicit };
    }

    let from_blob = as_reliability(record.blob_field(Blob::Reliabilities, &rel_key))
        .or_else(|| as_reliability(record.blob_field(Blob::Reliabilities, trait_key)));
    if let Some(value) = from_blob {
        return ResolvedReliability { value, source: ReliabilitySource::ReliabilityBlob };
    }

    let genetic_keys = [
        rel_key.clone(),
        format!("{}_REL", trait_key.to_uppercase()),
        format!("{trait_key} REL"),
    ];
    if let Some(value) = genetic_keys
        .iter()
        .find_map(|k| as_reliability(record.blob_field(Blob::GeneticData, k)))
    {
        return ResolvedReliability { value, source: ReliabilitySource::GeneticData };
    }

    if role == Role::Sire {
        let inferred = PROGENY_COUNT_KEYS
            .iter()
            .find_map(|k| record.field(k).and_then(FieldValue::as_f64))
            .filter(|d| *d > 0.0)
            .and_then(|d| reliability_from_progeny(d.floor() as u64));
        if let Some(value) = inferred {
            return ResolvedReliability { value, source: ReliabilitySource::ProgenyCount };
        }
    }

    let value = match role {
        Role::Sire => params.default_sire_reliability,
        Role::Dam => params.default_dam_reliability,
    };
    tracing::debug!(trait_key, ?role, value, "reliability not found, using role default");
    ResolvedReliability { value, source: ReliabilitySource::Default }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_keys_alias_and_case_variants() {
        let keys = trait_keys("dpr");
        assert_eq!(keys.as_slice(), ["dpr", "DPR", "DAUGHTER PREGNANCY RATE"]);

        let keys = trait_keys("milk");
        assert_eq!(keys.as_slice(), ["milk", "MILK"]);

        let keys = trait_keys("Net_Merit");
        assert_eq!(keys.as_slice(), ["Net_Merit", "NET_MERIT", "net_merit"]);
    }

    #[test]
    fn test_lookup_plan_order() {
        let plan = lookup_plan("milk");
        assert_eq!(plan.len(), 6);
        assert_eq!(plan[0], (Location::TopLevel, Cow::Borrowed("milk")));
        assert_eq!(plan[2].0, Location::Nested(Blob::MainIndices));
        assert_eq!(plan[5], (Location::Nested(Blob::GeneticData), Cow::Borrowed("MILK")));
    }

    #[test]
    fn test_resolve_prefers_top_level() {
        let record = TraitRecord::new("c1")
            .with_value("milk", 900.0)
            .with_blob_value(Blob::GeneticData, "MILK", 100.0);
        assert_eq!(resolve(&record, "milk"), Some(900.0));
    }

    #[test]
    fn test_resolve_nested_and_alias() {
        let record = TraitRecord::new("c1")
            .with_blob_value(Blob::GeneticData, "gINB", "7.5")
            .with_blob_value(Blob::MainIndices, "PL", 4.2);
        assert_eq!(resolve(&record, "genomic_inbreeding"), Some(7.5));
        assert_eq!(resolve(&record, "productive_life"), Some(4.2));
        assert_eq!(resolve(&record, "fat"), None);
    }

    #[test]
    fn test_resolve_skips_unparseable_values() {
        let record = TraitRecord::new("c1")
            .with_text("milk", "pending")
            .with_blob_value(Blob::MainIndices, "milk", 640.0);
        assert_eq!(resolve(&record, "milk"), Some(640.0));
    }

    #[test]
    fn test_reliability_search_order() {
        let params = GeneticParameters::default();

        let record = TraitRecord::new("b").with_reliability("milk", 92.0);
        let rel = resolve_reliability(&record, "milk", Role::Sire, &params);
        assert_eq!(rel, ResolvedReliability { value: 92.0, source: ReliabilitySource::Explicit });

        let record = TraitRecord::new("b").with_blob_value(Blob::Reliabilities, "milk", 88.0);
        let rel = resolve_reliability(&record, "milk", Role::Sire, &params);
        assert_eq!(rel.source, ReliabilitySource::ReliabilityBlob);

        let record = TraitRecord::new("b").with_blob_value(Blob::GeneticData, "MILK_REL", 70.0);
        let rel = resolve_reliability(&record, "milk", Role::Dam, &params);
        assert_eq!(rel, ResolvedReliability { value: 70.0, source: ReliabilitySource::GeneticData });
    }

    #[test]
    fn test_reliability_out_of_range_ignored() {
        let params = GeneticParameters::default();
        let record = TraitRecord::new("b").with_reliability("milk", 140.0);
        let rel = resolve_reliability(&record, "milk", Role::Dam, &params);
        assert_eq!(rel, ResolvedReliability { value: 55.0, source: ReliabilitySource::Default });
    }

    #[test]
    fn test_reliability_from_progeny_count() {
        let params = GeneticParameters::default();
        let record = TraitRecord::new("b").with_value("num_daughters", 1250.0);
        let rel = resolve_reliability(&record, "milk", Role::Sire, &params);
        assert_eq!(rel, ResolvedReliability { value: 99.0, source: ReliabilitySource::ProgenyCount });

        // progeny counts are ignored for dams
        let rel = resolve_reliability(&record, "milk", Role::Dam, &params);
        assert_eq!(rel.value, 55.0);

        assert_eq!(reliability_from_progeny(0), None);
        assert_eq!(reliability_from_progeny(12), Some(75.0));
        assert_eq!(reliability_from_progeny(50), Some(80.0));
        assert_eq!(reliability_from_progeny(100), Some(85.0));
        assert_eq!(reliability_from_progeny(500), Some(95.0));
    }

    #[test]
    fn test_resolve_text() {
        let record = TraitRecord::new("b")
            .with_text("beta_casein", " ")
            .with_blob_value(Blob::GeneticData, "beta_casein", "A2A2");
        assert_eq!(resolve_text(&record, &["beta_casein"]), Some("A2A2"));
        assert_eq!(resolve_text(&record, &["kappa_casein"]), None);
    }
}
