//! Wide-format CSV frames.
//!
//! ```text
//! Date,Time,11001,11016,12011
//! 2025/9/1,9:00,285,29.1,
//! ```
//!
//! Column `i + 2` of every data row belongs to `station_ids[i]`.

use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord, Trim};
#[allow(unused)]
use log::{debug, error, info, trace, warn};

use crate::aggregate::TimeSeriesSample;
use crate::error::{IngestError, Result};
use crate::time::{normalize_checked, NormalizedTime};
use crate::units::{parse_value, Encoding};

/// Number of leading `Date,Time` columns.
pub const LEADING_COLUMNS: usize = 2;

// forecast rows are descaled before they are merged in, so every cell reads
// with the actuals rule
const ENCODING: Encoding = Encoding::Actuals;

#[derive(Debug, Clone)]
pub struct FrameRow {
    pub date: String,
    pub time: String,
    pub timestamp: NormalizedTime,
    // station cells only, i.e. columns 2.. of the raw row
    pub cells: Vec<String>,
    pub has_any: bool,
}

impl FrameRow {
    fn from_record(record: &StringRecord) -> FrameRow {
        let date = record.get(0).unwrap_or("").to_string();
        let time = record.get(1).unwrap_or("").to_string();
        let timestamp = normalize_checked(&date, &time);

        let cells: Vec<String> = record
            .iter()
            .skip(LEADING_COLUMNS)
            .map(String::from)
            .collect();
        let has_any = cells.iter().any(|c| parse_value(c).is_some());

        FrameRow {
            date,
            time,
            timestamp,
            cells,
            has_any,
        }
    }

    pub fn cell(&self, station_index: usize) -> Option<&str> {
        self.cells.get(station_index).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct WideCsvFrame {
    pub station_ids: Vec<String>,
    pub rows: Vec<FrameRow>,
    master_times: Vec<String>,
}

impl WideCsvFrame {
    /// Parses a wide CSV blob. Blank lines are skipped; a line of empty
    /// fields such as `,,` is kept as a row without readings.
    pub fn parse(csv_text: &str) -> Result<WideCsvFrame> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(csv_text.as_bytes());

        let mut records = vec![];
        for record in rdr.records() {
            let record = record?;
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            records.push(record);
        }

        debug!("CSV records: {}", records.len());

        if records.len() < 2 {
            return Err(IngestError::EmptyOrMalformed {
                rows: records.len(),
            });
        }

        let station_ids: Vec<String> = records[0]
            .iter()
            .skip(LEADING_COLUMNS)
            .map(|id| id.trim().to_string())
            .collect();

        debug!("station ids in header: {}", station_ids.len());

        let rows: Vec<FrameRow> = records[1..].iter().map(FrameRow::from_record).collect();

        let mut master_times = vec![];
        let mut seen = HashSet::new();
        for row in &rows {
            if !row.has_any {
                continue;
            }
            match &row.timestamp {
                NormalizedTime::Normalized(t) => {
                    if seen.insert(t.as_str()) {
                        master_times.push(t.clone());
                    }
                }
                NormalizedTime::Fallback(raw) => {
                    warn!("row '{raw}' has values but an unparseable timestamp, leaving it off the time axis");
                }
            }
        }

        Ok(WideCsvFrame {
            station_ids,
            rows,
            master_times,
        })
    }

    /// De-duplicated canonical timestamps of rows with at least one reading,
    /// in first-seen order.
    pub fn master_times(&self) -> &[String] {
        &self.master_times
    }

    /// Decoded value of one cell. The ×10 rule is applied on every read.
    pub fn value(&self, row_index: usize, station_index: usize) -> Option<f64> {
        let row = self.rows.get(row_index)?;
        ENCODING.read_cell(row.cell(station_index)?)
    }

    /// Every reading of one station in row order, skipping rows whose
    /// timestamp could not be normalized.
    pub fn station_series(&self, station_index: usize) -> Vec<TimeSeriesSample> {
        self.rows
            .iter()
            .filter_map(|row| {
                let wbgt = ENCODING.read_cell(row.cell(station_index)?)?;
                match &row.timestamp {
                    NormalizedTime::Normalized(t) => Some(TimeSeriesSample {
                        time: t.clone(),
                        wbgt,
                    }),
                    NormalizedTime::Fallback(_) => None,
                }
            })
            .collect()
    }
}
