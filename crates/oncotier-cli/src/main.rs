//! oncotier: somatic variant tiering from the command line.
//!
//! `oncotier tier` tiers an annotated variant set against a knowledge-base
//! snapshot and writes the TierResults as JSON. `oncotier purity` only
//! estimates tumor purity for the set.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oncotier_common::{AnalysisType, VariantAnnotation};
use oncotier_config::EngineConfig;
use oncotier_engine::{PurityMetadata, PurpleOutput, TierEngine, TierResult};
use oncotier_kb::{KbSnapshot, OncoKbApiClient};

#[derive(Parser, Debug)]
#[command(name = "oncotier", version, about = "Somatic variant tiering (AMP/ASCO/CAP, VICC/CGC, OncoKB)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tier every variant in a JSON file
    Tier(TierArgs),
    /// Estimate tumor purity from a variant set
    Purity(PurityArgs),
}

/// Purity inputs shared by both subcommands.
#[derive(Args, Debug)]
struct SampleArgs {
    /// JSON array of annotated variants
    #[arg(long)]
    variants: PathBuf,
    /// tumor-only or tumor-normal
    #[arg(long, default_value = "tumor-only", value_parser = parse_analysis)]
    analysis: AnalysisType,
    /// Known tumor purity in [0, 1]
    #[arg(long)]
    purity: Option<f64>,
    /// PURPLE purity TSV for this sample
    #[arg(long)]
    purple: Option<PathBuf>,
    /// TOML or YAML engine configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TierArgs {
    #[command(flatten)]
    sample: SampleArgs,
    /// Knowledge-base snapshot JSON
    #[arg(long)]
    kb: PathBuf,
    #[arg(long)]
    cancer_type: String,
    /// Write results here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PurityArgs {
    #[command(flatten)]
    sample: SampleArgs,
}

/// One line of `tier` output: a result, or the reason the variant was rejected.
#[derive(Serialize)]
#[serde(untagged)]
enum TierOutcome {
    Tiered(Box<TierResult>),
    Rejected { variant: String, error: String },
}

fn parse_analysis(s: &str) -> Result<AnalysisType, String> {
    AnalysisType::from_str(s).ok_or_else(|| format!("unknown analysis type `{}`", s))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oncotier=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Tier(args) => run_tier(args),
        Command::Purity(args) => run_purity(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::from_path(p),
        None => EngineConfig::load(),
    };
    config.context("Failed to load engine configuration")
}

fn load_variants(path: &Path) -> anyhow::Result<Vec<VariantAnnotation>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read variants from {}", path.display()))?;
    let variants: Vec<VariantAnnotation> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of annotated variants", path.display()))?;
    if variants.is_empty() {
        warn!(path = %path.display(), "Variant file is empty");
    }
    Ok(variants)
}

fn load_metadata(sample: &SampleArgs) -> anyhow::Result<PurityMetadata> {
    if let Some(p) = sample.purity {
        if !(0.0..=1.0).contains(&p) {
            bail!("--purity must be within [0, 1], got {}", p);
        }
    }
    let purple = match &sample.purple {
        Some(path) => {
            let tsv = fs::read_to_string(path)
                .with_context(|| format!("Failed to read PURPLE output {}", path.display()))?;
            Some(PurpleOutput::parse(&tsv).with_context(|| format!("Invalid PURPLE output {}", path.display()))?)
        }
        None => None,
    };
    Ok(PurityMetadata { purity: sample.purity, purple })
}

fn build_engine(kb_path: &Path, config: EngineConfig) -> anyhow::Result<TierEngine> {
    let snapshot = KbSnapshot::from_path(kb_path)
        .with_context(|| format!("Failed to load knowledge base {}", kb_path.display()))?;
    let mut kb = snapshot.into_knowledge_base();
    if let Some(api) = &config.oncokb_api {
        let client = OncoKbApiClient::new(api).context("Failed to configure the OncoKB API client")?;
        kb = kb.with_provider(Arc::new(client));
        info!(base_url = %api.base_url, "OncoKB API enabled");
    }
    Ok(TierEngine::new(kb, config))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Results written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_tier(args: TierArgs) -> anyhow::Result<()> {
    let config = load_config(args.sample.config.as_deref())?;
    let variants = load_variants(&args.sample.variants)?;
    let metadata = load_metadata(&args.sample)?;
    let engine = build_engine(&args.kb, config)?;

    let results = engine.assign_tiers(&variants, Some(&args.cancer_type), args.sample.analysis, Some(&metadata));
    let outcomes: Vec<TierOutcome> = variants
        .iter()
        .zip(results)
        .map(|(variant, result)| match result {
            Ok(r) => TierOutcome::Tiered(Box::new(r)),
            Err(e) => TierOutcome::Rejected { variant: variant.variant_key(), error: e.to_string() },
        })
        .collect();
    write_json(&outcomes, args.output.as_deref())
}

fn run_purity(args: PurityArgs) -> anyhow::Result<()> {
    let config = load_config(args.sample.config.as_deref())?;
    let variants = load_variants(&args.sample.variants)?;
    let metadata = load_metadata(&args.sample)?;
    let estimate = oncotier_engine::PurityEstimator::new(&config.vaf, &config.thresholds.purity)
        .estimate_purity(&variants, args.sample.analysis, Some(&metadata));
    write_json(&estimate, None)
}
