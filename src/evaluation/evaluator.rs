//! Batch evaluator

use super::scoring::{score_event, ScoredEvent, SkippedRecord};
use crate::config::EvaluationConfig;
use crate::data::{ForecastRecord, UNGROUPED};
use crate::error::{CalibrationError, Result};
use crate::metrics::PitDiagnostics;
use crate::report::EvaluationReport;
use crate::stats::{
    bootstrap_mean, bootstrap_ratio, mann_whitney_u, AggregationPolicy, RankSumTest, StatsSummary,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Scores of one group of events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBreakdown {
    pub group: String,
    pub n_events: usize,
    pub mean_crps: f64,
    pub mean_mae: f64,
    pub mean_pit: f64,
    /// Aggregated ratio under the run's policy; None when undefined for this group
    pub ratio: Option<f64>,
}

/// Rank-sum comparison of per-event ratios between two groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub group_a: String,
    pub group_b: String,
    pub test: RankSumTest,
}

/// Scores a collection of forecast records and summarizes the result
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Score every record; records that cannot be scored are returned as skipped
    pub fn score_all(&self, records: &[ForecastRecord]) -> Result<(Vec<ScoredEvent>, Vec<SkippedRecord>)> {
        let mut scored = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for record in records {
            match score_event(record, &self.config.ladder) {
                Ok(event) => scored.push(event),
                Err(e) if e.is_input_error() => {
                    tracing::warn!(event_id = %record.event_id, reason = %e, "skipping record");
                    skipped.push(SkippedRecord {
                        event_id: record.event_id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok((scored, skipped))
    }

    /// Score and summarize all records
    pub fn run(&self, records: &[ForecastRecord]) -> Result<EvaluationReport> {
        self.config.validate()?;
        let start = Instant::now();

        let (events, skipped) = self.score_all(records)?;
        if events.is_empty() {
            return Err(CalibrationError::InsufficientData(format!(
                "none of {} records could be scored",
                records.len()
            )));
        }

        let policy = self.config.aggregation;
        let crps = Array1::from_iter(events.iter().map(|e| e.crps));
        let mae = Array1::from_iter(events.iter().map(|e| e.mae));
        let defined_ratios: Vec<f64> = events.iter().filter_map(|e| e.ratio).collect();
        let n_zero_mae = events.len() - defined_ratios.len();
        if n_zero_mae > 0 {
            tracing::warn!(n_zero_mae, "events with zero MAE excluded from ratio statistics");
        }

        let aggregated_ratio = match bootstrap_ratio(&crps, &mae, policy, &self.config.bootstrap) {
            Ok(ci) => Some(ci),
            Err(e) if e.is_input_error() => {
                tracing::warn!(policy = %policy, reason = %e, "aggregated ratio undefined");
                None
            }
            Err(e) => return Err(e),
        };

        let ratio_by_policy: BTreeMap<String, f64> = AggregationPolicy::ALL
            .iter()
            .filter_map(|p| p.aggregate(&crps, &mae).ok().map(|r| (p.name().to_string(), r)))
            .collect();

        let mean_crps_ci = bootstrap_mean(&crps, &self.config.bootstrap)?;
        let mean_mae_ci = bootstrap_mean(&mae, &self.config.bootstrap)?;
        let crps_slice: Vec<f64> = crps.to_vec();
        let mae_slice: Vec<f64> = mae.to_vec();
        let crps_vs_mae = mann_whitney_u(&crps_slice, &mae_slice)?;

        let group_comparison = self.compare_groups(&events)?;
        let groups = group_breakdown(&events, policy);

        let pit_values: Vec<f64> = events.iter().map(|e| e.pit).collect();
        let pit = PitDiagnostics::from_values(&pit_values, &self.config.pit)?;

        tracing::info!(
            scored = events.len(),
            skipped = skipped.len(),
            mean_crps = mean_crps_ci.estimate,
            mean_mae = mean_mae_ci.estimate,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "evaluation complete"
        );

        Ok(EvaluationReport {
            generated_at: chrono::Utc::now(),
            config: self.config.clone(),
            n_records: records.len(),
            crps: StatsSummary::from_values(&crps_slice),
            mae: StatsSummary::from_values(&mae_slice),
            ratios: StatsSummary::from_values(&defined_ratios),
            n_zero_mae,
            n_beats_null: events.iter().filter(|e| e.beats_null()).count(),
            aggregated_ratio,
            ratio_by_policy,
            mean_crps_ci,
            mean_mae_ci,
            crps_vs_mae,
            group_comparison,
            groups,
            pit,
            events,
            skipped,
        })
    }

    fn compare_groups(&self, events: &[ScoredEvent]) -> Result<Option<GroupComparison>> {
        let Some((group_a, group_b)) = &self.config.compare_groups else {
            return Ok(None);
        };

        let ratios_of = |label: &str| -> Vec<f64> {
            events
                .iter()
                .filter(|e| e.group.as_deref() == Some(label))
                .filter_map(|e| e.ratio)
                .collect()
        };
        let a = ratios_of(group_a.as_str());
        let b = ratios_of(group_b.as_str());

        match mann_whitney_u(&a, &b) {
            Ok(test) => Ok(Some(GroupComparison {
                group_a: group_a.clone(),
                group_b: group_b.clone(),
                test,
            })),
            Err(CalibrationError::InsufficientData(reason)) => {
                tracing::warn!(group_a = %group_a, group_b = %group_b, %reason, "group comparison skipped");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn group_breakdown(events: &[ScoredEvent], policy: AggregationPolicy) -> Vec<GroupBreakdown> {
    let mut by_group: BTreeMap<&str, Vec<&ScoredEvent>> = BTreeMap::new();
    for event in events {
        by_group
            .entry(event.group.as_deref().unwrap_or(UNGROUPED))
            .or_default()
            .push(event);
    }

    by_group
        .into_iter()
        .map(|(group, members)| {
            let n = members.len() as f64;
            let crps = Array1::from_iter(members.iter().map(|e| e.crps));
            let mae = Array1::from_iter(members.iter().map(|e| e.mae));
            GroupBreakdown {
                group: group.to_string(),
                n_events: members.len(),
                mean_crps: crps.sum() / n,
                mean_mae: mae.sum() / n,
                mean_pit: members.iter().map(|e| e.pit).sum::<f64>() / n,
                ratio: policy.aggregate(&crps, &mae).ok(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crps::Knot;
    use crate::ladder::Quote;
    use crate::stats::BootstrapConfig;

    fn config(policy: AggregationPolicy) -> EvaluationConfig {
        EvaluationConfig::new(policy).with_bootstrap(BootstrapConfig::default().with_resamples(200).with_seed(11))
    }

    fn uniform_record(id: &str, group: &str, realized: f64) -> ForecastRecord {
        ForecastRecord::from_knots(id, realized, vec![Knot::new(0.0, 0.0), Knot::new(10.0, 1.0)]).with_group(group)
    }

    fn sample_records() -> Vec<ForecastRecord> {
        vec![
            uniform_record("a1", "a", 1.0),
            uniform_record("a2", "a", 3.5),
            uniform_record("a3", "a", 7.0),
            uniform_record("b1", "b", 9.0),
            uniform_record("b2", "b", 6.0),
            ForecastRecord::from_quotes("q1", 4.2, vec![Quote::new(3.0, 0.2), Quote::new(5.0, 0.8)]),
        ]
    }

    #[test]
    fn test_run_summarizes_all_events() {
        let report = Evaluator::new(config(AggregationPolicy::RatioOfMeans))
            .run(&sample_records())
            .unwrap();
        assert_eq!(report.n_records, 6);
        assert_eq!(report.events.len(), 6);
        assert!(report.skipped.is_empty());
        assert_eq!(report.crps.count, 6);
        assert!(report.aggregated_ratio.is_some());
        assert_eq!(report.ratio_by_policy.len(), 3);
        assert_eq!(report.pit.n, 6);

        let labels: Vec<&str> = report.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(labels, vec![UNGROUPED, "a", "b"]);
    }

    #[test]
    fn test_unscorable_records_are_skipped() {
        let mut records = sample_records();
        records.push(ForecastRecord::from_quotes("empty", 1.0, vec![]));
        records.push(uniform_record("outside", "a", 42.0));

        let report = Evaluator::new(config(AggregationPolicy::MeanOfRatios)).run(&records).unwrap();
        assert_eq!(report.events.len(), 6);
        let ids: Vec<&str> = report.skipped.iter().map(|s| s.event_id.as_str()).collect();
        assert_eq!(ids, vec!["empty", "outside"]);
    }

    #[test]
    fn test_no_scorable_records() {
        let records = vec![ForecastRecord::from_quotes("empty", 1.0, vec![])];
        let result = Evaluator::new(config(AggregationPolicy::MeanOfRatios)).run(&records);
        assert!(matches!(result, Err(CalibrationError::InsufficientData(_))));
    }

    #[test]
    fn test_zero_mae_events_excluded_from_ratios() {
        let mut records = sample_records();
        records.push(uniform_record("center", "a", 5.0));
        let report = Evaluator::new(config(AggregationPolicy::MedianOfRatios)).run(&records).unwrap();
        assert_eq!(report.n_zero_mae, 1);
        assert_eq!(report.ratios.count, report.events.len() - 1);
    }

    #[test]
    fn test_group_comparison() {
        let cfg = config(AggregationPolicy::MeanOfRatios).with_compare_groups("a", "b");
        let report = Evaluator::new(cfg).run(&sample_records()).unwrap();
        let comparison = report.group_comparison.unwrap();
        assert_eq!(comparison.test.n_a, 3);
        assert_eq!(comparison.test.n_b, 2);

        let missing = config(AggregationPolicy::MeanOfRatios).with_compare_groups("a", "zzz");
        let report = Evaluator::new(missing).run(&sample_records()).unwrap();
        assert!(report.group_comparison.is_none());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = Evaluator::new(config(AggregationPolicy::RatioOfMeans)).run(&sample_records()).unwrap();
        let b = Evaluator::new(config(AggregationPolicy::RatioOfMeans)).run(&sample_records()).unwrap();
        assert_eq!(a.aggregated_ratio, b.aggregated_ratio);
        assert_eq!(a.mean_crps_ci, b.mean_crps_ci);
    }
}
