//! Market Calibration CLI Module
//!
//! Command-line interface for scoring single forecasts and evaluating record files.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::EvaluationConfig;
use crate::crps::{crps, crps_step, PiecewiseCdf};
use crate::data::{ForecastLoader, RecordSetInfo};
use crate::evaluation::Evaluator;
use crate::metrics::{mae, pit};
use crate::report::{accent, dim, kv, muted, ok, warn};
use crate::stats::{AggregationPolicy, BootstrapConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mcal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Calibration statistics for market-implied forecast distributions")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a record file and print a calibration report
    Evaluate(EvaluateArgs),

    /// Score one forecast CDF against a realized value
    Score {
        /// Knots as "x:F,x:F,..." in increasing x
        #[arg(short, long, allow_hyphen_values = true)]
        knots: String,

        /// Realized outcome
        #[arg(short, long, allow_negative_numbers = true)]
        realized: f64,
    },

    /// Show an overview of a record file
    Info {
        /// Record file (JSON, CSV or TSV)
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Arguments of `mcal evaluate`; flags override values from `--config`
#[derive(Args, Debug, Clone, Default)]
pub struct EvaluateArgs {
    /// Record file (JSON, CSV or TSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Ratio aggregation (mean-of-ratios, ratio-of-means, median-of-ratios)
    #[arg(short, long)]
    pub aggregation: Option<String>,

    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output JSON summary file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of bootstrap resamples
    #[arg(long)]
    pub resamples: Option<usize>,

    /// Bootstrap confidence level
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Bootstrap random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Compare per-event ratios of two groups
    #[arg(long, num_args = 2, value_names = ["GROUP_A", "GROUP_B"])]
    pub compare: Option<Vec<String>>,

    /// Meaning of quoted probabilities (below, above)
    #[arg(long)]
    pub quote_kind: Option<String>,

    /// Number of PIT histogram bins
    #[arg(long)]
    pub bins: Option<usize>,
}

impl EvaluateArgs {
    /// Merge the config file (if any) with command-line overrides
    pub fn to_config(&self) -> anyhow::Result<EvaluationConfig> {
        let aggregation = self
            .aggregation
            .as_deref()
            .map(str::parse::<AggregationPolicy>)
            .transpose()?;

        let mut config = match (&self.config, aggregation) {
            (Some(path), _) => EvaluationConfig::from_json_file(path)?,
            (None, Some(policy)) => EvaluationConfig::new(policy),
            (None, None) => anyhow::bail!(
                "an aggregation policy is required: pass --aggregation or a --config file that sets it"
            ),
        };

        if let Some(policy) = aggregation {
            config.aggregation = policy;
        }

        let mut bootstrap: BootstrapConfig = config.bootstrap.clone();
        if let Some(n) = self.resamples {
            bootstrap = bootstrap.with_resamples(n);
        }
        if let Some(c) = self.confidence {
            bootstrap = bootstrap.with_confidence(c);
        }
        if let Some(seed) = self.seed {
            bootstrap = bootstrap.with_seed(seed);
        }
        config.bootstrap = bootstrap;

        if let Some(kind) = &self.quote_kind {
            config.ladder.quote_kind = kind.parse()?;
        }
        if let Some(bins) = self.bins {
            config.pit = config.pit.clone().with_bins(bins);
        }
        if let Some(groups) = &self.compare {
            if let [a, b] = groups.as_slice() {
                config.compare_groups = Some((a.clone(), b.clone()));
            }
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse "x:F,x:F,..." into knot pairs
pub fn parse_knots(spec: &str) -> anyhow::Result<Vec<(f64, f64)>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (x, f) = pair
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("knot '{}' is not of the form x:F", pair))?;
            Ok((x.trim().parse::<f64>()?, f.trim().parse::<f64>()?))
        })
        .collect()
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_evaluate(args: &EvaluateArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;

    println!();
    step_run("Loading records");
    let start = Instant::now();
    let records = ForecastLoader::new().load_auto(&args.data)?;
    step_done(&format!("{} records in {:.1?}", records.len(), start.elapsed()));

    step_run("Scoring");
    let start = Instant::now();
    let report = Evaluator::new(config).run(&records)?;
    step_done(&format!("{} scored in {:.1?}", report.n_scored(), start.elapsed()));

    print!("{}", report.render());

    if let Some(path) = &report.config.output {
        report.write_json(path)?;
        println!();
        println!("  {} {}", ok("✓"), kv("Summary written to", &path.display().to_string()));
    }

    println!();
    Ok(())
}

pub fn cmd_score(knots: &str, realized: f64) -> anyhow::Result<()> {
    let pairs = parse_knots(knots)?;
    let cdf = PiecewiseCdf::from_pairs(&pairs)?;
    let score = crps(&cdf, realized)?;
    let mean = cdf.mean();
    let null_score = crps_step(mean, realized)?;
    let (lower, upper) = cdf.support();

    section("Forecast score");
    println!("  {:<14} {}", muted("Knots"), cdf.len());
    println!("  {:<14} [{}, {}]", muted("Support"), lower, upper);
    println!("  {:<14} {:.6}", muted("Implied mean"), mean);
    println!("  {:<14} {:.6}", muted("CRPS"), score);
    println!("  {:<14} {:.6}", muted("Null CRPS"), null_score);
    println!("  {:<14} {:.6}", muted("MAE"), mae(mean, realized));
    println!("  {:<14} {:.4}", muted("PIT"), pit(&cdf, realized));

    let verdict = if score < null_score {
        ok("distribution beats point null")
    } else {
        warn("point null is at least as good")
    };
    println!();
    println!("  {}", verdict);
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Record Info");

    let records = ForecastLoader::new().load_auto(data_path)?;
    let info = RecordSetInfo::from_records(&records);

    println!("  {:<14} {}", muted("File"), data_path.display());
    println!("  {:<14} {}", muted("Records"), info.n_records);
    println!("  {:<14} {}", muted("Quote ladders"), info.n_quote_records);
    println!("  {:<14} {}", muted("Knot CDFs"), info.n_knot_records);
    println!("  {:<14} {}", muted("Empty"), info.n_empty_records);
    println!("  {:<14} {}", muted("Quotes"), info.n_quotes);
    println!();

    println!("  {:<20} {:>8}", muted("Group"), muted("Records"));
    println!("  {}", dim(&"─".repeat(30)));
    for (group, count) in &info.groups {
        println!("  {:<20} {:>8}", group, count);
    }

    println!();
    Ok(())
}
