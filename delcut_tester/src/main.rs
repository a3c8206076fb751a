mod config;
mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use delcut_vision::{InspectionPipeline, PolicySelection, ReferenceSample, build_reference_pool, decode_rgb};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Auto,
    Single,
    FirstMatch,
}

impl From<PolicyArg> for PolicySelection {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Auto => PolicySelection::Auto,
            PolicyArg::Single => PolicySelection::SingleReference,
            PolicyArg::FirstMatch => PolicySelection::FirstMatch,
        }
    }
}

/// Compares captured parts against known-defect (RED) samples.
#[derive(Debug, Parser)]
#[command(name = "delcut_tester", version)]
struct Args {
    /// Known-defect sample image; repeat for several samples.
    #[arg(short, long = "reference", value_name = "FILE")]
    references: Vec<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long, env = "DELCUT_CONFIG", value_name = "TOML")]
    config: Option<PathBuf>,

    /// Matching policy; overrides the configuration file.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Hue bins of the color signature; overrides the configuration file.
    #[arg(long)]
    hue_bins: Option<usize>,

    /// Saturation bins of the color signature; overrides the configuration file.
    #[arg(long)]
    saturation_bins: Option<usize>,

    /// Part images to inspect.
    #[arg(required = true, value_name = "PART")]
    parts: Vec<PathBuf>,
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_image(path: &Path) -> Result<image::RgbImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    decode_rgb(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = config::load(
        args.config.as_deref(),
        config::Overrides {
            policy: args.policy.map(PolicySelection::from),
            hue_bins: args.hue_bins,
            saturation_bins: args.saturation_bins,
        },
    )?;

    // --- 1. Defect samples ---
    if args.references.is_empty() {
        log::warn!("Please supply at least one RED reference image with --reference");
        bail!("no RED reference images supplied");
    }
    let samples = args
        .references
        .iter()
        .map(|path| Ok(ReferenceSample::new(file_label(path), load_image(path)?)))
        .collect::<Result<Vec<_>>>()?;
    let pool = build_reference_pool(samples, config.extraction)
        .await
        .context("Failed to build the reference pool")?;
    println!("{} RED sample(s) processed.", pool.len());

    let mut pipeline = InspectionPipeline::new(config)?;
    pipeline.set_references(pool);

    // --- 2. Part inspection ---
    let mut red_parts = 0usize;
    for path in &args.parts {
        let label = file_label(path);
        let image = load_image(path)?;
        let verdict = pipeline
            .inspect(&image)
            .with_context(|| format!("Failed to inspect {label}"))?;
        if verdict.is_defect {
            red_parts += 1;
        }
        print!("{}", report::Report::new(&label, &verdict, pipeline.references().len()));
    }

    log::info!("{red_parts} of {} part(s) flagged RED", args.parts.len());
    Ok(if red_parts > 0 { ExitCode::from(2) } else { ExitCode::SUCCESS })
}
