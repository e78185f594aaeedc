// Engine integration tests
//
// End-to-end behaviour through the public API: PPPV, inbreeding, haplotype
// screening, scoring and ranking on hand-built and seeded random herds.
// Run with: cargo test --test engine_integration_tests

use approx::assert_relative_eq;
use mating_scorer::metrics::pppv::weighted_pppv;
use mating_scorer::{
    calculate_inbreeding, calculate_pppv, CompatibilityScorer, DamOutcome, Eligibility,
    GeneticParameters, InbreedingMethod, JsonFormatter, PopulationStatistics, RankOptions,
    RecommendationStatus, RiskSeverity, SireRanker, TraitRecord,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const TRAITS: [(&str, f64, f64); 8] = [
    ("milk", 500.0, 1500.0),
    ("protein", 20.0, 40.0),
    ("fat", 30.0, 50.0),
    ("productive_life", 2.0, 5.0),
    ("scs", 2.9, 0.4),
    ("dpr", 0.5, 4.0),
    ("udc", 0.5, 2.0),
    ("ptat", 1.0, 2.0),
];

const CATEGORIES: [&str; 6] = ["production", "health", "fertility", "type", "efficiency", "calving"];

fn random_animal(rng: &mut StdRng, id: String, is_sire: bool) -> TraitRecord {
    let mut record = TraitRecord::new(id);
    for (trait_key, mean, spread) in TRAITS {
        // Some traits stay missing
        if rng.gen_bool(0.15) {
            continue;
        }
        record = record
            .with_value(trait_key, mean + rng.gen_range(-3.0..3.0) * spread)
            .with_reliability(trait_key, rng.gen_range(0.0..=100.0));
    }
    for marker in ["HH1", "HH3", "HH5"] {
        let status = if rng.gen_bool(0.1) { "C" } else { "F" };
        record = record.with_text(marker, status);
    }
    if is_sire {
        if rng.gen_bool(0.8) {
            record = record.with_value("gfi", rng.gen_range(0.0..20.0));
        }
    } else if rng.gen_bool(0.8) {
        record = record.with_value("genomic_inbreeding", rng.gen_range(0.0..20.0));
    }
    record
}

fn random_herd(seed: u64, dams: usize, sires: usize) -> (Vec<TraitRecord>, Vec<TraitRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let dams = (0..dams)
        .map(|i| random_animal(&mut rng, format!("cow-{i}"), false))
        .collect();
    let sires = (0..sires)
        .map(|i| random_animal(&mut rng, format!("7HO{i:04}"), true))
        .collect();
    (dams, sires)
}

fn random_category_weights(rng: &mut StdRng) -> BTreeMap<String, f64> {
    let raw: Vec<f64> = CATEGORIES.iter().map(|_| rng.gen_range(0.05..1.0)).collect();
    let total: f64 = raw.iter().sum();
    CATEGORIES
        .iter()
        .zip(raw)
        .map(|(category, w)| (category.to_string(), w / total))
        .collect()
}

// =========================================================================
// Reference scenarios
// =========================================================================

#[test]
fn test_reliability_weighted_milk_pppv() {
    let dam = TraitRecord::new("cow-a")
        .with_value("milk", 500.0)
        .with_value("net_merit", 400.0)
        .with_reliability("milk", 55.0)
        .with_reliability("net_merit", 55.0);
    let sire = TraitRecord::new("7HO-a")
        .with_value("milk", 1500.0)
        .with_value("net_merit", 700.0)
        .with_reliability("milk", 99.0)
        .with_reliability("net_merit", 99.0);

    let pppv = calculate_pppv::<&str>(
        &dam,
        &sire,
        None,
        &GeneticParameters::default(),
        &PopulationStatistics::default(),
    );

    assert_relative_eq!(pppv["milk"].pppv, 176_000.0 / 154.0, epsilon = 1e-9);
    assert_relative_eq!(pppv["milk"].pppv, 1142.857, epsilon = 1e-3);
    assert_relative_eq!(pppv["net_merit"].pppv, (99.0 * 700.0 + 55.0 * 400.0) / 154.0, epsilon = 1e-9);
    assert!(pppv["milk"].ci_95_lower < pppv["milk"].pppv);
    assert!(pppv["milk"].ci_95_upper > pppv["milk"].pppv);
}

#[test]
fn test_shared_carrier_is_critical_at_zero_inbreeding() {
    let params = GeneticParameters::default();
    let dam = TraitRecord::new("cow-b")
        .with_value("genomic_inbreeding", 0.0)
        .with_text("HH1", "Carrier");
    let sire = TraitRecord::new("7HO-b").with_value("gfi", 0.0).with_text("HH1", "C");

    let result = calculate_inbreeding(&dam, &sire, &params);

    assert_eq!(result.method, InbreedingMethod::Genomic);
    assert_relative_eq!(result.expected_inbreeding, 0.0);
    assert!(!result.acceptable);
    let risk = result
        .haplotype_risks
        .iter()
        .find(|r| r.haplotype == "HH1")
        .unwrap();
    assert_eq!(risk.severity, RiskSeverity::Critical);

    let ranker = SireRanker::default();
    let evaluation = ranker.evaluate(&dam, &sire);
    assert_eq!(evaluation.recommendation.status, RecommendationStatus::NotRecommended);
    assert!(ranker.rank(&dam, &[sire], &RankOptions::default()).is_empty());
}

#[test]
fn test_max_inbreeding_excludes_candidate() {
    let dam = TraitRecord::new("cow-c").with_value("genomic_inbreeding", 4.8);
    let close = TraitRecord::new("7HO-close").with_value("gfi", 12.0);
    let distant = TraitRecord::new("7HO-distant").with_value("gfi", 8.0);
    let options = RankOptions {
        max_inbreeding: 6.0,
        ..RankOptions::default()
    };

    let ranker = SireRanker::default();
    let screened = ranker.screen(&dam, &[close.clone(), distant.clone()], &options);
    assert_relative_eq!(screened[0].compatibility.expected_inbreeding(), 7.2, epsilon = 1e-9);
    assert_eq!(screened[0].eligibility, Eligibility::ExceedsInbreeding);

    let ranked = ranker.rank(&dam, &[close, distant], &options);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].sire.id.as_deref(), Some("7HO-distant"));
    assert_relative_eq!(ranked[0].expected_inbreeding, 5.2, epsilon = 1e-9);
}

#[test]
fn test_empty_records_degrade_gracefully() {
    let params = GeneticParameters::default();
    let stats = PopulationStatistics::default();
    let dam = TraitRecord::default();
    let sire = TraitRecord::default();

    let pppv = calculate_pppv::<&str>(&dam, &sire, None, &params, &stats);
    assert!(pppv.is_empty());

    let inbreeding = calculate_inbreeding(&dam, &sire, &params);
    assert_eq!(inbreeding.method, InbreedingMethod::Estimated);
    assert_relative_eq!(inbreeding.expected_inbreeding, params.estimation.fallback_inbreeding);

    let result = CompatibilityScorer::new(params, stats).score(&dam, &sire, None);
    assert_relative_eq!(result.score, 50.0);
    assert_relative_eq!(result.adjustments.inbreeding_penalty, 0.0);
    assert!(result.categories.values().all(|c| c.contribution == 0.0));
}

// =========================================================================
// Properties on seeded random herds
// =========================================================================

#[test]
fn test_equal_reliability_gives_midpoint() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let a = rng.gen_range(-2000.0..2000.0);
        let b = rng.gen_range(-2000.0..2000.0);
        let r = rng.gen_range(0.0..=100.0);
        assert_relative_eq!(weighted_pppv(a, r, b, r), (a + b) / 2.0, epsilon = 1e-9);
    }
}

#[test]
fn test_pppv_between_parents() {
    let (dams, sires) = random_herd(21, 20, 20);
    let params = GeneticParameters::default();
    let stats = PopulationStatistics::default();

    for (dam, sire) in dams.iter().zip(&sires) {
        for p in calculate_pppv::<&str>(dam, sire, None, &params, &stats).values() {
            let lo = p.dam_value.min(p.sire_value);
            let hi = p.dam_value.max(p.sire_value);
            assert!(p.pppv >= lo - 1e-9 && p.pppv <= hi + 1e-9);
            assert!(p.variance >= 0.0);
        }
    }
}

#[test]
fn test_score_bounded_under_any_priorities() {
    let mut rng = StdRng::seed_from_u64(99);
    let (dams, sires) = random_herd(5, 15, 15);
    let scorer = CompatibilityScorer::default();

    for dam in &dams {
        let weights = random_category_weights(&mut rng);
        scorer.params().with_category_weights(weights.clone()).unwrap();

        for sire in &sires {
            let result = scorer.score(dam, sire, Some(&weights));
            assert!(result.score.is_finite());
            assert!((0.0..=100.0).contains(&result.score), "score {}", result.score);
            if result.has_critical_haplotype() {
                assert!(!result.inbreeding.acceptable);
            }
        }
    }
}

#[test]
fn test_rank_respects_filters_and_order() {
    let (dams, sires) = random_herd(3, 10, 40);
    let options = RankOptions {
        top_n: 5,
        max_inbreeding: 7.0,
        category_weights: None,
    };
    let ranker = SireRanker::default();

    for dam in &dams {
        let ranked = ranker.rank(dam, &sires, &options);
        assert!(ranked.len() <= options.top_n);
        for (i, candidate) in ranked.iter().enumerate() {
            assert_eq!(candidate.rank, i + 1);
            assert!(candidate.expected_inbreeding <= options.max_inbreeding);
            assert_eq!(candidate.eligibility, Eligibility::Eligible);
        }
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_herd_ranking_is_deterministic() {
    let (dams, sires) = random_herd(77, 12, 30);
    let ranker = SireRanker::default();
    let options = RankOptions::default();

    let first = ranker.rank_herd(&dams, &sires, &options).unwrap();
    let second = ranker.rank_herd(&dams, &sires, &options).unwrap();

    assert_eq!(
        JsonFormatter::format_compact(&first).unwrap(),
        JsonFormatter::format_compact(&second).unwrap()
    );
    assert_eq!(first.summary.total_dams, 12);
    assert_eq!(first.summary.failed_dams, 0);
}

#[test]
fn test_evaluation_is_deterministic() {
    let (dams, sires) = random_herd(41, 5, 5);
    let ranker = SireRanker::default();

    for (dam, sire) in dams.iter().zip(&sires) {
        let first = JsonFormatter::format_compact(&ranker.evaluate(dam, sire)).unwrap();
        let second = JsonFormatter::format_compact(&ranker.evaluate(dam, sire)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_numeric_ids_rank_in_herd() {
    let dams: Vec<TraitRecord> =
        serde_json::from_str(r#"[{"id": 1, "milk": 600}, {"id": 2, "milk": 700}]"#).unwrap();
    let sires: Vec<TraitRecord> = serde_json::from_str(
        r#"[{"id": 10, "milk": 1200, "gfi": 5}, {"id": 11, "milk": 900, "gfi": 6}]"#,
    )
    .unwrap();

    let herd = SireRanker::default()
        .rank_herd(&dams, &sires, &RankOptions::default())
        .unwrap();

    assert_eq!(herd.summary.failed_dams, 0);
    assert_eq!(herd.summary.unique_sires_recommended, 2);
    for (outcome, dam_id) in herd.results.iter().zip(["1", "2"]) {
        let DamOutcome::Ranked(ranking) = outcome else {
            panic!("dam {dam_id} was not ranked");
        };
        assert_eq!(ranking.dam.identity.id.as_deref(), Some(dam_id));
        let ids: Vec<_> = ranking
            .top_sires
            .iter()
            .map(|c| c.sire.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, ["10", "11"]);
    }
}
