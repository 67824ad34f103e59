//! Forecast records and flat-file ingestion

mod loader;

pub use loader::ForecastLoader;

use crate::crps::Knot;
use crate::ladder::Quote;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One forecast event: a quote ladder (or explicit knots) and its realized outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Event identifier, e.g. a market ticker
    pub event_id: String,
    /// Optional grouping label (series, category, horizon bucket)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Observed outcome after the forecast period closed
    pub realized: f64,
    /// Raw strike quotes, turned into knots with the ladder builder
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<Quote>,
    /// Pre-built knot sequence; takes precedence over `quotes`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knots: Vec<Knot>,
}

impl ForecastRecord {
    pub fn from_quotes(event_id: impl Into<String>, realized: f64, quotes: Vec<Quote>) -> Self {
        Self {
            event_id: event_id.into(),
            group: None,
            realized,
            quotes,
            knots: Vec::new(),
        }
    }

    pub fn from_knots(event_id: impl Into<String>, realized: f64, knots: Vec<Knot>) -> Self {
        Self {
            event_id: event_id.into(),
            group: None,
            realized,
            quotes: Vec::new(),
            knots,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Group label used for records without one
pub const UNGROUPED: &str = "(none)";

/// Overview of a loaded record set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSetInfo {
    pub n_records: usize,
    /// Records given as quote ladders
    pub n_quote_records: usize,
    /// Records given as explicit knots
    pub n_knot_records: usize,
    /// Records with neither quotes nor knots
    pub n_empty_records: usize,
    pub n_quotes: usize,
    /// Records per group ([`UNGROUPED`] for records without one)
    pub groups: BTreeMap<String, usize>,
}

impl RecordSetInfo {
    pub fn from_records(records: &[ForecastRecord]) -> Self {
        let mut info = Self {
            n_records: records.len(),
            ..Self::default()
        };

        for record in records {
            if !record.knots.is_empty() {
                info.n_knot_records += 1;
            } else if !record.quotes.is_empty() {
                info.n_quote_records += 1;
            } else {
                info.n_empty_records += 1;
            }
            info.n_quotes += record.quotes.len();
            let group = record.group.clone().unwrap_or_else(|| UNGROUPED.to_string());
            *info.groups.entry(group).or_insert(0) += 1;
        }

        info
    }
}
