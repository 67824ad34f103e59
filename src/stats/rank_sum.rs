//! Wilcoxon / Mann-Whitney rank-sum test

use super::distribution::two_sided_p_value;
use super::summary::median;
use crate::error::{CalibrationError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of a two-sample rank-sum test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankSumTest {
    /// Size of the first sample
    pub n_a: usize,
    /// Size of the second sample
    pub n_b: usize,
    /// Mann-Whitney U for the first sample
    pub u_statistic: f64,
    /// Normal approximation with tie and continuity correction
    pub z: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Rank-biserial correlation; positive when `a` tends to exceed `b`
    pub rank_biserial: f64,
    pub median_a: f64,
    pub median_b: f64,
}

impl RankSumTest {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Two-sided Mann-Whitney U test of `a` against `b`
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<RankSumTest> {
    if a.is_empty() || b.is_empty() {
        return Err(CalibrationError::InsufficientData(format!(
            "rank-sum test needs two non-empty samples (got {} and {})",
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(CalibrationError::invalid("rank-sum test received a non-finite value"));
    }

    let n_a = a.len();
    let n_b = b.len();
    let n = n_a + n_b;

    // (value, belongs to a)
    let mut pooled: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    // Midranks; tie_term accumulates sum(t^3 - t) over tie groups
    let mut rank_sum_a = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && pooled[j + 1].0 == pooled[i].0 {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        let ties = (j - i + 1) as f64;
        tie_term += ties * ties * ties - ties;
        rank_sum_a += pooled[i..=j].iter().filter(|(_, in_a)| *in_a).count() as f64 * midrank;
        i = j + 1;
    }

    let n_a_f = n_a as f64;
    let n_b_f = n_b as f64;
    let n_f = n as f64;

    let u_statistic = rank_sum_a - n_a_f * (n_a_f + 1.0) / 2.0;
    let mean_u = n_a_f * n_b_f / 2.0;

    let variance = if n > 1 {
        n_a_f * n_b_f / 12.0 * ((n_f + 1.0) - tie_term / (n_f * (n_f - 1.0)))
    } else {
        0.0
    };

    let (z, p_value) = if variance > 0.0 {
        let diff = u_statistic - mean_u;
        let corrected = (diff.abs() - 0.5).max(0.0) * diff.signum();
        let z = corrected / variance.sqrt();
        (z, two_sided_p_value(z))
    } else {
        (0.0, 1.0)
    };

    Ok(RankSumTest {
        n_a,
        n_b,
        u_statistic,
        z,
        p_value,
        rank_biserial: 2.0 * u_statistic / (n_a_f * n_b_f) - 1.0,
        median_a: median(a).unwrap_or(f64::NAN),
        median_b: median(b).unwrap_or(f64::NAN),
    })
}
