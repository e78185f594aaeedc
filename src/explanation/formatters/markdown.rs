use crate::metrics::RiskSeverity;
use crate::ranker::{AnimalDigest, DamOutcome, HerdRanking, MatingEvaluation, PrioritiesUsed, RankedCandidate};
use crate::record::AnimalIdentity;

/// Markdown formatter for evaluations and herd rankings
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format a single-pair evaluation as markdown
    pub fn format(evaluation: &MatingEvaluation) -> String {
        let mut md = String::with_capacity(2048);
        let compatibility = &evaluation.compatibility;
        let recommendation = &evaluation.recommendation;

        md.push_str(&format!(
            "# {} × {}\n\n",
            display_name(&evaluation.dam.identity),
            display_name(&evaluation.sire.identity)
        ));
        md.push_str(&format!(
            "**Score:** {:.1}/100 ({})  \n",
            compatibility.score, compatibility.grade
        ));
        md.push_str(&format!("**Reliability:** {:.1}%\n\n", compatibility.reliability));
        md.push_str(&format!("{}\n\n", recommendation.message));

        if !recommendation.positives.is_empty() {
            md.push_str("## Strengths\n\n");
            for point in &recommendation.positives {
                md.push_str(&format!("- {}\n", point));
            }
            md.push('\n');
        }

        if !recommendation.negatives.is_empty() {
            md.push_str("## Concerns\n\n");
            for point in &recommendation.negatives {
                md.push_str(&format!("- {}\n", point));
            }
            md.push('\n');
        }

        // Inbreeding and haplotypes
        let inbreeding = &compatibility.inbreeding;
        md.push_str("## Inbreeding\n\n");
        md.push_str(&format!(
            "**Expected:** {:.2}% ({}, risk {})  \n",
            inbreeding.expected_inbreeding, inbreeding.method, inbreeding.risk_level
        ));
        md.push_str(&format!("{}\n\n", inbreeding.recommendation));

        if !inbreeding.haplotype_risks.is_empty() {
            md.push_str("| Haplotype | Dam | Sire | Severity | Advice |\n");
            md.push_str("|-----------|-----|------|----------|--------|\n");
            for risk in &inbreeding.haplotype_risks {
                let severity = match risk.severity {
                    RiskSeverity::Critical => "🚨 critical",
                    RiskSeverity::Low => "low",
                };
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    risk.haplotype, risk.dam_status, risk.sire_status, severity, risk.recommendation
                ));
            }
            md.push('\n');
        }

        // Score breakdown
        md.push_str("## Score Breakdown\n\n");
        md.push_str(&format!("**Base score:** {:.1}  \n", compatibility.base_score));
        let adjustments = &compatibility.adjustments;
        md.push_str(&format!(
            "**Adjustments:** inbreeding {:+.1}, genotype {:+.1}, sustainability {:+.1}\n\n",
            adjustments.inbreeding_penalty,
            adjustments.genotype_bonus,
            adjustments.sustainability_bonus
        ));

        if !compatibility.categories.is_empty() {
            md.push_str("| Category | Weight | Contribution |\n");
            md.push_str("|----------|--------|--------------|\n");
            for (name, category) in &compatibility.categories {
                md.push_str(&format!(
                    "| {} | {:.2} | {:+.3} |\n",
                    name, category.weight, category.contribution
                ));
            }
            md.push('\n');
        }

        if !evaluation.pppv.is_empty() {
            md.push_str("## Predicted Progeny Values\n\n");
            md.push_str("| Trait | Dam | Sire | PPPV | 95% CI | Reliability | Reading |\n");
            md.push_str("|-------|-----|------|------|--------|-------------|---------|\n");
            for (trait_key, p) in &evaluation.pppv {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:.2} | {:.2} to {:.2} | {:.1}% | {} |\n",
                    trait_key,
                    p.dam_value,
                    p.sire_value,
                    p.pppv,
                    p.ci_95_lower,
                    p.ci_95_upper,
                    p.combined_reliability,
                    p.interpretation
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Format a herd batch as markdown
    pub fn format_herd(herd: &HerdRanking) -> String {
        let mut md = String::with_capacity(4096);
        let summary = &herd.summary;

        md.push_str("# Herd Mating Plan\n\n");
        md.push_str(&format!(
            "**Dams:** {} ({} failed)  \n**Sires analysed:** {}  \n",
            summary.total_dams, summary.failed_dams, summary.total_sires_analysed
        ));
        md.push_str(&format!(
            "**Top N:** {}  \n**Max inbreeding:** {:.2}%  \n",
            summary.top_n, summary.max_inbreeding
        ));
        let priorities = match &summary.priorities_used {
            PrioritiesUsed::Default => "default".to_string(),
            PrioritiesUsed::Custom(weights) => weights
                .iter()
                .map(|(category, weight)| format!("{} {:.2}", category, weight))
                .collect::<Vec<_>>()
                .join(", "),
        };
        md.push_str(&format!("**Priorities:** {}  \n", priorities));
        md.push_str(&format!(
            "**Average score:** {:.1}  \n**Average inbreeding:** {:.2}%  \n**Unique sires:** {}\n\n",
            summary.average_score, summary.average_inbreeding, summary.unique_sires_recommended
        ));

        for outcome in &herd.results {
            match outcome {
                DamOutcome::Ranked(ranking) => {
                    Self::format_dam_header(&mut md, &ranking.dam);
                    Self::format_ranking_table(&mut md, &ranking.top_sires);
                }
                DamOutcome::Failed { index, error } => {
                    md.push_str(&format!("## Dam #{}\n\n⚠️ {}\n\n", index + 1, error));
                }
            }
        }

        md
    }

    fn format_dam_header(md: &mut String, dam: &AnimalDigest) {
        md.push_str(&format!("## {}\n\n", display_name(&dam.identity)));
        if !dam.main_indices.is_empty() {
            let indices: Vec<String> = dam
                .main_indices
                .iter()
                .map(|(key, value)| format!("{} {:.2}", key, value))
                .collect();
            md.push_str(&format!("*{}*\n\n", indices.join(" · ")));
        }
    }

    fn format_ranking_table(md: &mut String, ranked: &[RankedCandidate]) {
        if ranked.is_empty() {
            md.push_str("No eligible sires.\n\n");
            return;
        }

        md.push_str("| Rank | Sire | Score | Grade | Inbreeding | Risk | Reliability |\n");
        md.push_str("|------|------|-------|-------|------------|------|-------------|\n");
        for candidate in ranked {
            md.push_str(&format!(
                "| {} | {} | {:.1} | {} | {:.2}% | {} | {:.1}% |\n",
                candidate.rank,
                display_name(&candidate.sire),
                candidate.score,
                candidate.grade.symbol(),
                candidate.expected_inbreeding,
                candidate.inbreeding_risk,
                candidate.reliability
            ));
        }
        md.push('\n');
    }
}

fn display_name(identity: &AnimalIdentity) -> String {
    let id = identity
        .id
        .as_deref()
        .or(identity.code.as_deref())
        .unwrap_or("unidentified");
    match &identity.name {
        Some(name) => format!("{} ({})", name, id),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::{RankOptions, SireRanker};
    use crate::record::TraitRecord;

    #[test]
    fn test_format_evaluation() {
        let dam = TraitRecord::new("cow-7").with_value("milk", 500.0).with_text("hh1", "C");
        let sire = TraitRecord::new("7HO123")
            .with_text("name", "Jet")
            .with_value("milk", 1500.0)
            .with_text("hh1", "C");
        let evaluation = SireRanker::default().evaluate(&dam, &sire);

        let md = MarkdownFormatter::format(&evaluation);

        assert!(md.contains("# cow-7 × Jet (7HO123)"));
        assert!(md.contains("## Inbreeding"));
        assert!(md.contains("| HH1 | Carrier | Carrier | 🚨 critical |"));
        assert!(md.contains("## Concerns"));
        assert!(md.contains("- Critical risk: HH1"));
        assert!(md.contains("| milk |"));
    }

    #[test]
    fn test_format_herd() {
        let dams = vec![TraitRecord::new("cow-1"), TraitRecord::default()];
        let sires = vec![TraitRecord::new("b1").with_value("gfi", 4.0)];
        let herd = SireRanker::default()
            .rank_herd(&dams, &sires, &RankOptions::default())
            .unwrap();

        let md = MarkdownFormatter::format_herd(&herd);

        assert!(md.contains("# Herd Mating Plan"));
        assert!(md.contains("**Priorities:** default"));
        assert!(md.contains("## cow-1"));
        assert!(md.contains("| 1 | b1 |"));
        assert!(md.contains("## Dam #2"));
    }
}
