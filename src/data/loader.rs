//! Forecast record loading from JSON and CSV

use super::ForecastRecord;
use crate::error::{CalibrationError, Result};
use crate::ladder::Quote;
use polars::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Accepted top-level JSON layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    List(Vec<ForecastRecord>),
    Wrapped { events: Vec<ForecastRecord> },
}

/// Loader for forecast record files.
///
/// CSV files are long format, one row per quote, with columns `event_id`,
/// `strike`, `probability`, `realized` and an optional `group`.
#[derive(Debug, Clone)]
pub struct ForecastLoader {
    /// Rows used for CSV schema inference
    infer_schema_length: usize,
}

impl Default for ForecastLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastLoader {
    pub const EVENT_COLUMN: &'static str = "event_id";
    pub const GROUP_COLUMN: &'static str = "group";
    pub const STRIKE_COLUMN: &'static str = "strike";
    pub const PROBABILITY_COLUMN: &'static str = "probability";
    pub const REALIZED_COLUMN: &'static str = "realized";

    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    /// Set number of rows used for CSV schema inference
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = n.max(1);
        self
    }

    /// Load a JSON file: either an array of records or `{"events": [...]}`
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<Vec<ForecastRecord>> {
        let path = path.as_ref();
        let start = Instant::now();
        let content = std::fs::read_to_string(path)?;
        let records = match serde_json::from_str::<RecordFile>(&content)? {
            RecordFile::List(records) => records,
            RecordFile::Wrapped { events } => events,
        };
        tracing::info!(
            path = %path.display(),
            records = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded forecast records"
        );
        Ok(records)
    }

    /// Load a comma-separated long-format file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Vec<ForecastRecord>> {
        self.load_csv_with_delimiter(path, b',')
    }

    /// Load a long-format delimited file
    pub fn load_csv_with_delimiter(&self, path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<ForecastRecord>> {
        let path = path.as_ref();
        let start = Instant::now();
        let mut file = File::open(path)?;
        let label_schema = Self::label_schema(&mut file, delimiter)?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_schema_overwrite(Some(Arc::new(label_schema)))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| CalibrationError::DataError(e.to_string()))?;

        let records = Self::records_from_frame(&df)?;
        tracing::info!(
            path = %path.display(),
            rows = df.height(),
            records = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded forecast records"
        );
        Ok(records)
    }

    /// String dtypes for the label columns present in the header.
    ///
    /// Inference would read ids like `007` as integers and merge them with `7`.
    fn label_schema(file: &mut File, delimiter: u8) -> Result<Schema> {
        let mut header = String::new();
        BufReader::new(&mut *file).read_line(&mut header)?;
        file.seek(SeekFrom::Start(0))?;

        let separator = char::from(delimiter);
        let fields = header
            .trim_end_matches(['\r', '\n'])
            .split(separator)
            .map(|name| name.trim_matches('"'))
            .filter(|name| *name == Self::EVENT_COLUMN || *name == Self::GROUP_COLUMN)
            .map(|name| (PlSmallStr::from(name), DataType::String));
        Ok(Schema::from_iter(fields))
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<Vec<ForecastRecord>> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => self.load_json(path),
            "csv" => self.load_csv(path),
            "tsv" => self.load_csv_with_delimiter(path, b'\t'),
            other => Err(CalibrationError::DataError(format!(
                "unsupported file format '{}' for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Group long-format rows into records, in first-seen event order
    pub fn records_from_frame(df: &DataFrame) -> Result<Vec<ForecastRecord>> {
        let event_ids = string_column(df, Self::EVENT_COLUMN)?;
        let strikes = float_column(df, Self::STRIKE_COLUMN)?;
        let probabilities = float_column(df, Self::PROBABILITY_COLUMN)?;
        let realized = float_column(df, Self::REALIZED_COLUMN)?;
        let groups = if df.get_column_names().iter().any(|c| c.as_str() == Self::GROUP_COLUMN) {
            Some(string_column(df, Self::GROUP_COLUMN)?)
        } else {
            None
        };

        let mut records: Vec<ForecastRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in 0..df.height() {
            let event_id = event_ids[row]
                .clone()
                .ok_or_else(|| missing(Self::EVENT_COLUMN, row))?;
            let strike = strikes[row].ok_or_else(|| missing(Self::STRIKE_COLUMN, row))?;
            let probability = probabilities[row].ok_or_else(|| missing(Self::PROBABILITY_COLUMN, row))?;
            let outcome = realized[row].ok_or_else(|| missing(Self::REALIZED_COLUMN, row))?;
            let group = groups.as_ref().and_then(|g| g[row].clone());

            match index.get(&event_id) {
                Some(&i) => {
                    let record = &mut records[i];
                    if record.realized != outcome {
                        return Err(CalibrationError::DataError(format!(
                            "event '{}' has conflicting realized values {} and {} (row {})",
                            event_id, record.realized, outcome, row
                        )));
                    }
                    if group.is_some() && record.group != group {
                        tracing::warn!(event_id = %event_id, row, "conflicting group label ignored");
                    }
                    record.quotes.push(Quote::new(strike, probability));
                }
                None => {
                    index.insert(event_id.clone(), records.len());
                    records.push(ForecastRecord {
                        event_id,
                        group,
                        realized: outcome,
                        quotes: vec![Quote::new(strike, probability)],
                        knots: Vec::new(),
                    });
                }
            }
        }

        Ok(records)
    }
}

fn missing(column: &str, row: usize) -> CalibrationError {
    CalibrationError::DataError(format!("missing '{}' value in row {}", column, row))
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| CalibrationError::ColumnNotFound(name.to_string()))?;
    let column_f64 = column
        .cast(&DataType::Float64)
        .map_err(|e| CalibrationError::DataError(e.to_string()))?;
    let values = column_f64
        .f64()
        .map_err(|e| CalibrationError::DataError(e.to_string()))?
        .into_iter()
        .collect();
    Ok(values)
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| CalibrationError::ColumnNotFound(name.to_string()))?;
    let column_str = column
        .cast(&DataType::String)
        .map_err(|e| CalibrationError::DataError(e.to_string()))?;
    let values = column_str
        .str()
        .map_err(|e| CalibrationError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with_suffix(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_groups_rows() {
        let file = temp_with_suffix(
            ".csv",
            "event_id,group,strike,probability,realized\n\
             GDP-Q1,gdp,1.0,0.2,2.1\n\
             GDP-Q1,gdp,2.0,0.6,2.1\n\
             CPI-JAN,cpi,3.0,0.5,3.2\n\
             GDP-Q1,gdp,3.0,0.9,2.1\n",
        );
        let records = ForecastLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id, "GDP-Q1");
        assert_eq!(records[0].quotes.len(), 3);
        assert_eq!(records[0].group.as_deref(), Some("gdp"));
        assert_eq!(records[1].event_id, "CPI-JAN");
        assert!((records[1].realized - 3.2).abs() < 1e-12);
    }

    #[test]
    fn test_load_csv_without_group_column() {
        let file = temp_with_suffix(
            ".csv",
            "event_id,strike,probability,realized\n1,10,0.3,12\n1,20,0.8,12\n",
        );
        let records = ForecastLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_id, "1");
        assert!(records[0].group.is_none());
    }

    #[test]
    fn test_load_csv_keeps_numeric_ids_verbatim() {
        let file = temp_with_suffix(
            ".csv",
            "event_id,group,strike,probability,realized\n\
             007,01,1.0,0.2,1.5\n\
             007,01,2.0,0.8,1.5\n\
             7,1,1.0,0.4,1.2\n\
             7,1,2.0,0.9,1.2\n",
        );
        let records = ForecastLoader::new().with_infer_schema_length(1).load_csv(file.path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(ids, vec!["007", "7"]);
        assert_eq!(records[0].group.as_deref(), Some("01"));
        assert_eq!(records[1].quotes.len(), 2);
    }

    #[test]
    fn test_load_tsv_with_quoted_header() {
        let file = temp_with_suffix(
            ".tsv",
            "\"event_id\"\tstrike\tprobability\trealized\n0042\t1.0\t0.5\t1.0\n",
        );
        let records = ForecastLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(records[0].event_id, "0042");
    }

    #[test]
    fn test_load_csv_missing_column() {
        let file = temp_with_suffix(".csv", "event_id,strike,realized\na,1.0,2.0\n");
        let result = ForecastLoader::new().load_csv(file.path());
        assert!(matches!(result, Err(CalibrationError::ColumnNotFound(ref c)) if c == "probability"));
    }

    #[test]
    fn test_load_csv_conflicting_realized() {
        let file = temp_with_suffix(
            ".csv",
            "event_id,strike,probability,realized\na,1.0,0.2,2.0\na,2.0,0.7,2.5\n",
        );
        assert!(matches!(
            ForecastLoader::new().load_csv(file.path()),
            Err(CalibrationError::DataError(_))
        ));
    }

    #[test]
    fn test_load_json_layouts() {
        let list = temp_with_suffix(
            ".json",
            r#"[{"event_id":"a","realized":1.0,"knots":[{"x":0.0,"f":0.0},{"x":2.0,"f":1.0}]}]"#,
        );
        let wrapped = temp_with_suffix(
            ".json",
            r#"{"events":[{"event_id":"b","group":"g","realized":0.5,"quotes":[{"strike":0.0,"probability":0.5}]}]}"#,
        );
        let loader = ForecastLoader::new();
        let a = loader.load_auto(list.path()).unwrap();
        assert_eq!(a[0].knots.len(), 2);
        let b = loader.load_auto(wrapped.path()).unwrap();
        assert_eq!(b[0].group.as_deref(), Some("g"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_with_suffix(".parquet", "");
        assert!(matches!(
            ForecastLoader::new().load_auto(file.path()),
            Err(CalibrationError::DataError(_))
        ));
    }
}
