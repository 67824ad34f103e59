//! Per-event scoring

use crate::crps::{crps, crps_step, PiecewiseCdf};
use crate::data::ForecastRecord;
use crate::error::{CalibrationError, Result};
use crate::ladder::{LadderBuilder, LadderConfig};
use crate::metrics::{mae, pit};
use serde::{Deserialize, Serialize};

/// Scores of one forecast event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub realized: f64,
    /// Mean of the forecast CDF, used as the point forecast
    pub implied_mean: f64,
    /// CRPS of the forecast CDF
    pub crps: f64,
    /// CRPS of the step-function null at the implied mean
    pub null_crps: f64,
    /// Absolute error of the implied mean
    pub mae: f64,
    pub pit: f64,
    /// `crps / mae`; undefined when the implied mean hit the outcome exactly
    pub ratio: Option<f64>,
    pub n_knots: usize,
    pub support: (f64, f64),
}

impl ScoredEvent {
    /// Whether the distributional forecast scored better than its point null
    pub fn beats_null(&self) -> bool {
        self.crps < self.null_crps
    }
}

/// A record that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub event_id: String,
    pub reason: String,
}

/// Forecast CDF of a record: explicit knots if present, otherwise built from quotes
pub fn forecast_cdf(record: &ForecastRecord, ladder: &LadderConfig) -> Result<PiecewiseCdf> {
    if !record.knots.is_empty() {
        return PiecewiseCdf::new(record.knots.clone());
    }
    if record.quotes.is_empty() {
        return Err(CalibrationError::invalid("record has neither knots nor quotes"));
    }
    LadderBuilder::new(ladder.clone()).build(&record.quotes, Some(record.realized))
}

/// Score one record against its realized outcome
pub fn score_event(record: &ForecastRecord, ladder: &LadderConfig) -> Result<ScoredEvent> {
    if !record.realized.is_finite() {
        return Err(CalibrationError::invalid(format!(
            "realized value {} is not finite",
            record.realized
        )));
    }

    let cdf = forecast_cdf(record, ladder)?;
    let implied_mean = cdf.mean();
    let score = crps(&cdf, record.realized)?;
    let null_score = crps_step(implied_mean, record.realized)?;
    let error = mae(implied_mean, record.realized);
    let ratio = if error > 0.0 { Some(score / error) } else { None };

    tracing::debug!(
        event_id = %record.event_id,
        crps = score,
        mae = error,
        implied_mean,
        "scored event"
    );

    Ok(ScoredEvent {
        event_id: record.event_id.clone(),
        group: record.group.clone(),
        realized: record.realized,
        implied_mean,
        crps: score,
        null_crps: null_score,
        mae: error,
        pit: pit(&cdf, record.realized),
        ratio,
        n_knots: cdf.len(),
        support: cdf.support(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crps::Knot;
    use crate::ladder::{BoundsPolicy, Quote};

    fn normal_record(realized: f64) -> ForecastRecord {
        ForecastRecord::from_quotes(
            "N01",
            realized,
            vec![
                Quote::new(-2.0, 0.0228),
                Quote::new(-1.0, 0.1587),
                Quote::new(0.0, 0.5),
                Quote::new(1.0, 0.8413),
                Quote::new(2.0, 0.9772),
            ],
        )
    }

    fn fixed_ladder() -> LadderConfig {
        LadderConfig::default().with_bounds(BoundsPolicy::Fixed { padding: 3.0 })
    }

    #[test]
    fn test_null_crps_equals_mae() {
        let event = score_event(&normal_record(1.3), &fixed_ladder()).unwrap();
        assert!((event.null_crps - event.mae).abs() < 1e-10);
        assert!(event.implied_mean.abs() < 1e-9);
        assert!(event.crps < event.null_crps);
        assert!(event.beats_null());
        assert_eq!(event.n_knots, 7);
        assert_eq!(event.support, (-5.0, 5.0));
    }

    #[test]
    fn test_zero_mae_has_no_ratio() {
        let record = ForecastRecord::from_knots(
            "sym",
            1.0,
            vec![Knot::new(0.0, 0.0), Knot::new(2.0, 1.0)],
        );
        let event = score_event(&record, &LadderConfig::default()).unwrap();
        assert_eq!(event.mae, 0.0);
        assert!(event.ratio.is_none());
        assert!(event.crps > 0.0);
        assert_eq!(event.pit, 0.5);
    }

    #[test]
    fn test_explicit_knots_take_precedence() {
        let mut record = normal_record(0.5);
        record.knots = vec![Knot::new(0.0, 0.0), Knot::new(1.0, 1.0)];
        let event = score_event(&record, &fixed_ladder()).unwrap();
        assert_eq!(event.n_knots, 2);
        assert!((event.implied_mean - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unscorable_records() {
        let empty = ForecastRecord::from_quotes("e", 1.0, vec![]);
        assert!(matches!(
            score_event(&empty, &LadderConfig::default()),
            Err(CalibrationError::InvalidInput(_))
        ));

        let outside = ForecastRecord::from_knots("o", 9.0, vec![Knot::new(0.0, 0.0), Knot::new(1.0, 1.0)]);
        assert!(score_event(&outside, &LadderConfig::default()).is_err());

        assert!(score_event(&normal_record(f64::NAN), &fixed_ladder()).is_err());
    }
}
