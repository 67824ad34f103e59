//! Evaluation reports
//!
//! An [`EvaluationReport`] carries everything a run computed. It renders to a
//! boxed terminal summary and serializes to a pretty JSON file.

mod render;

pub use render::strip_ansi;
pub(crate) use render::{accent, dim, kv, muted, ok, warn};

use crate::config::EvaluationConfig;
use crate::error::Result;
use crate::evaluation::{GroupBreakdown, GroupComparison, ScoredEvent, SkippedRecord};
use crate::metrics::PitDiagnostics;
use crate::stats::{ConfidenceInterval, RankSumTest, StatsSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Result of an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub config: EvaluationConfig,
    /// Records given to the evaluator, scored or not
    pub n_records: usize,

    pub crps: StatsSummary,
    pub mae: StatsSummary,
    /// Summary of the defined per-event ratios
    pub ratios: StatsSummary,
    /// Events whose implied mean hit the outcome exactly
    pub n_zero_mae: usize,
    /// Events where CRPS is below the null CRPS
    pub n_beats_null: usize,

    /// Ratio under the configured policy, with bootstrap CI
    pub aggregated_ratio: Option<ConfidenceInterval>,
    /// Point estimate under every policy where it is defined
    pub ratio_by_policy: BTreeMap<String, f64>,
    pub mean_crps_ci: ConfidenceInterval,
    pub mean_mae_ci: ConfidenceInterval,
    /// Rank-sum test of the CRPS sample against the MAE sample
    pub crps_vs_mae: RankSumTest,
    pub group_comparison: Option<GroupComparison>,
    pub groups: Vec<GroupBreakdown>,
    pub pit: PitDiagnostics,

    pub events: Vec<ScoredEvent>,
    pub skipped: Vec<SkippedRecord>,
}

impl EvaluationReport {
    pub fn n_scored(&self) -> usize {
        self.events.len()
    }

    pub fn n_skipped(&self) -> usize {
        self.skipped.len()
    }

    /// Whether the aggregated ratio CI lies entirely below 1
    pub fn beats_null(&self) -> bool {
        self.aggregated_ratio.as_ref().map(|ci| ci.below(1.0)).unwrap_or(false)
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }

    /// Read a report previously written with [`write_json`](Self::write_json)
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Terminal rendering of the report
    pub fn render(&self) -> String {
        render::render(self)
    }
}
