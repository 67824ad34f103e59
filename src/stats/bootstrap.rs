//! Percentile bootstrap confidence intervals

use super::aggregation::AggregationPolicy;
use super::summary::{quantile, sorted_copy, StatsSummary};
use crate::error::{CalibrationError, Result};
use ndarray::{Array1, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bootstrap resampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of resamples
    pub n_resamples: usize,
    /// Two-sided confidence level
    pub confidence: f64,
    /// Random seed (None = entropy)
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_resamples: 2000,
            confidence: 0.95,
            seed: None,
        }
    }
}

impl BootstrapConfig {
    /// Set the number of resamples (at least 100)
    pub fn with_resamples(mut self, n: usize) -> Self {
        self.n_resamples = n.max(100);
        self
    }

    /// Set the confidence level, clamped to [0.5, 0.999]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.5, 0.999);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// A bootstrap confidence interval around a point estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Statistic on the full sample
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    /// Confidence level, e.g. 0.95
    pub confidence: f64,
    /// Resamples where the statistic was defined
    pub n_resamples: usize,
    /// Standard deviation of the bootstrap distribution
    pub std_error: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Whether the whole interval lies below `value`
    pub fn below(&self, value: f64) -> bool {
        self.upper < value
    }
}

/// Bootstrap an arbitrary statistic over `n` resampleable units.
///
/// `statistic` receives the resampled unit indices. Resamples where it fails
/// or returns a non-finite value are dropped; if fewer than half survive the
/// interval is reported as undefined.
pub fn bootstrap_statistic<F>(n: usize, config: &BootstrapConfig, statistic: F) -> Result<ConfidenceInterval>
where
    F: Fn(&[usize]) -> Result<f64>,
{
    if n == 0 {
        return Err(CalibrationError::InsufficientData("cannot bootstrap an empty sample".to_string()));
    }
    if config.n_resamples == 0 {
        return Err(CalibrationError::ConfigError("n_resamples must be positive".to_string()));
    }
    if !(config.confidence > 0.0 && config.confidence < 1.0) {
        return Err(CalibrationError::ConfigError(format!(
            "confidence must be in (0, 1), got {}",
            config.confidence
        )));
    }

    let all: Vec<usize> = (0..n).collect();
    let estimate = statistic(&all)?;

    let mut rng = config.rng();
    let mut indices = vec![0usize; n];
    let mut stats = Vec::with_capacity(config.n_resamples);

    for _ in 0..config.n_resamples {
        for slot in indices.iter_mut() {
            *slot = rng.gen_range(0..n);
        }
        if let Ok(value) = statistic(&indices) {
            if value.is_finite() {
                stats.push(value);
            }
        }
    }

    if stats.len() * 2 < config.n_resamples {
        return Err(CalibrationError::InsufficientData(format!(
            "statistic undefined in {} of {} resamples",
            config.n_resamples - stats.len(),
            config.n_resamples
        )));
    }
    if stats.len() < config.n_resamples {
        tracing::debug!(
            dropped = config.n_resamples - stats.len(),
            "bootstrap resamples with undefined statistic dropped"
        );
    }

    let alpha = 1.0 - config.confidence;
    let sorted = sorted_copy(&stats);
    let lower = quantile(&sorted, alpha / 2.0).unwrap_or(estimate);
    let upper = quantile(&sorted, 1.0 - alpha / 2.0).unwrap_or(estimate);

    Ok(ConfidenceInterval {
        estimate,
        lower,
        upper,
        confidence: config.confidence,
        n_resamples: stats.len(),
        std_error: StatsSummary::from_values(&stats).std_dev,
    })
}

/// Bootstrap CI of the sample mean
pub fn bootstrap_mean(values: &Array1<f64>, config: &BootstrapConfig) -> Result<ConfidenceInterval> {
    bootstrap_statistic(values.len(), config, |idx| {
        values
            .select(Axis(0), idx)
            .mean()
            .ok_or_else(|| CalibrationError::InsufficientData("empty resample".to_string()))
    })
}

/// Bootstrap CI of the aggregated CRPS/MAE ratio, resampling events in pairs
pub fn bootstrap_ratio(
    crps: &Array1<f64>,
    mae: &Array1<f64>,
    policy: AggregationPolicy,
    config: &BootstrapConfig,
) -> Result<ConfidenceInterval> {
    if crps.len() != mae.len() {
        return Err(CalibrationError::invalid("CRPS and MAE must have same length"));
    }
    bootstrap_statistic(crps.len(), config, |idx| {
        policy.aggregate(&crps.select(Axis(0), idx), &mae.select(Axis(0), idx))
    })
}
