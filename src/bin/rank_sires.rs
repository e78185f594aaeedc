//! Rank candidate sires for every dam in a herd file
//!
//! Usage:
//!   rank_sires <dams> <sires> [--params p.json] [--stats s.json]
//!              [--priorities w.json] [--top N] [--max-inbreeding X]
//!              [--format json|md]
//!
//! Dam and sire files may be CSV, Parquet or JSON. Logging follows RUST_LOG.

use anyhow::{bail, Context, Result};
use mating_scorer::data::load_records;
use mating_scorer::{
    CompatibilityScorer, GeneticParameters, JsonFormatter, MarkdownFormatter,
    PopulationStatistics, RankOptions, SireRanker,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: rank_sires <dams> <sires> [--params p.json] [--stats s.json] \
[--priorities w.json] [--top N] [--max-inbreeding X] [--format json|md]";

#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Debug)]
struct Args {
    dams: PathBuf,
    sires: PathBuf,
    params: Option<PathBuf>,
    stats: Option<PathBuf>,
    priorities: Option<PathBuf>,
    options: RankOptions,
    format: OutputFormat,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut positional = Vec::new();
    let mut params = None;
    let mut stats = None;
    let mut priorities = None;
    let mut options = RankOptions::default();
    let mut format = OutputFormat::Json;

    while let Some(arg) = raw.next() {
        let mut value = |flag: &str| {
            raw.next()
                .with_context(|| format!("{} needs a value\n{}", flag, USAGE))
        };
        match arg.as_str() {
            "--params" => params = Some(PathBuf::from(value("--params")?)),
            "--stats" => stats = Some(PathBuf::from(value("--stats")?)),
            "--priorities" => priorities = Some(PathBuf::from(value("--priorities")?)),
            "--top" => {
                options.top_n = value("--top")?
                    .parse()
                    .context("--top must be a whole number")?;
            }
            "--max-inbreeding" => {
                options.max_inbreeding = value("--max-inbreeding")?
                    .parse()
                    .context("--max-inbreeding must be a number")?;
            }
            "--format" => {
                format = match value("--format")?.as_str() {
                    "json" => OutputFormat::Json,
                    "md" | "markdown" => OutputFormat::Markdown,
                    other => bail!("unknown format '{}'\n{}", other, USAGE),
                };
            }
            "-h" | "--help" => bail!("{}", USAGE),
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [dams, sires]: [PathBuf; 2] = positional
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected a dam file and a sire file\n{}", USAGE))?;

    Ok(Args {
        dams,
        sires,
        params,
        stats,
        priorities,
        options,
        format,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mating_scorer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = parse_args(std::env::args().skip(1))?;

    let params = match &args.params {
        Some(path) => GeneticParameters::load(path)?,
        None => GeneticParameters::default(),
    };
    let stats = match &args.stats {
        Some(path) => PopulationStatistics::load(path)?,
        None => PopulationStatistics::default(),
    };

    if let Some(path) = &args.priorities {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read priorities: {:?}", path))?;
        let weights: BTreeMap<String, f64> =
            serde_json::from_str(&contents).context("Failed to parse priorities JSON")?;
        params
            .with_category_weights(weights.clone())
            .with_context(|| format!("Invalid priorities in {:?}", path))?;
        args.options.category_weights = Some(weights);
    }

    let load_start = Instant::now();
    let dams = load_records(&args.dams)?;
    let sires = load_records(&args.sires)?;
    tracing::info!(
        dams = dams.len(),
        sires = sires.len(),
        elapsed_ms = load_start.elapsed().as_millis() as u64,
        "records loaded"
    );

    let ranker = SireRanker::new(CompatibilityScorer::new(params, stats));
    let herd = ranker.rank_herd(&dams, &sires, &args.options)?;

    let output = match args.format {
        OutputFormat::Json => JsonFormatter::format(&herd)?,
        OutputFormat::Markdown => MarkdownFormatter::format_herd(&herd),
    };
    println!("{}", output);

    Ok(())
}
