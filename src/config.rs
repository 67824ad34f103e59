//! Evaluation configuration

use crate::error::{CalibrationError, Result};
use crate::ladder::LadderConfig;
use crate::metrics::PitConfig;
use crate::stats::{AggregationPolicy, BootstrapConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a batch evaluation run.
///
/// `aggregation` has no default and must be present in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// How per-event CRPS/MAE ratios are summarized
    pub aggregation: AggregationPolicy,

    /// Bootstrap settings for confidence intervals
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Quote ladder construction
    #[serde(default)]
    pub ladder: LadderConfig,

    /// PIT histogram and uniformity check
    #[serde(default)]
    pub pit: PitConfig,

    /// Two group labels whose ratios are compared with a rank-sum test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_groups: Option<(String, String)>,

    /// Where to write the JSON summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl EvaluationConfig {
    pub fn new(aggregation: AggregationPolicy) -> Self {
        Self {
            aggregation,
            bootstrap: BootstrapConfig::default(),
            ladder: LadderConfig::default(),
            pit: PitConfig::default(),
            compare_groups: None,
            output: None,
        }
    }

    pub fn with_aggregation(mut self, aggregation: AggregationPolicy) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_ladder(mut self, ladder: LadderConfig) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_pit(mut self, pit: PitConfig) -> Self {
        self.pit = pit;
        self
    }

    pub fn with_compare_groups(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.compare_groups = Some((a.into(), b.into()));
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Check values that serde cannot range-check
    pub fn validate(&self) -> Result<()> {
        if self.bootstrap.n_resamples == 0 {
            return Err(CalibrationError::ConfigError("bootstrap.n_resamples must be positive".to_string()));
        }
        if !(self.bootstrap.confidence > 0.0 && self.bootstrap.confidence < 1.0) {
            return Err(CalibrationError::ConfigError(format!(
                "bootstrap.confidence must be in (0, 1), got {}",
                self.bootstrap.confidence
            )));
        }
        if self.pit.n_bins < 2 {
            return Err(CalibrationError::ConfigError(format!(
                "pit.n_bins must be at least 2, got {}",
                self.pit.n_bins
            )));
        }
        if !(self.pit.ks_alpha > 0.0 && self.pit.ks_alpha < 1.0) {
            return Err(CalibrationError::ConfigError(format!(
                "pit.ks_alpha must be in (0, 1), got {}",
                self.pit.ks_alpha
            )));
        }
        // Probe the bounds policy with a unit range
        self.ladder.bounds.padding(1.0)?;
        if let Some((a, b)) = &self.compare_groups {
            if a == b {
                return Err(CalibrationError::ConfigError(format!(
                    "compare_groups needs two different groups, got '{}' twice",
                    a
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
