//! Market Calibration - Main Entry Point
//!
//! Scores market-implied forecast distributions and reports calibration statistics.

use clap::Parser;
use market_calibration::cli::{cmd_evaluate, cmd_info, cmd_score, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_calibration=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate(args) => {
            cmd_evaluate(&args)?;
        }
        Commands::Score { knots, realized } => {
            cmd_score(&knots, realized)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
