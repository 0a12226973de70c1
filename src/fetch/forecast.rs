//! Forecast file (`yohou_all.csv`).
//!
//! The forecast is laid out the other way round from the actuals:
//!
//! ```text
//! ,,2025090406,2025090409,...
//! 11001,2025/09/04 05:00,263,281,...
//! ```
//!
//! One row per station, one column per forecast hour, every value ×10. It is
//! turned into the actuals layout (`Date,Time,<stations>`) so the rest of the
//! pipeline never has to know forecasts exist.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
#[allow(unused)]
use log::{debug, error, info, trace, warn};

use crate::config::FeedConfig;
use crate::fetch::{fetch_or_none, CsvSource};
use crate::frame::LEADING_COLUMNS;
use crate::units::{CellValue, Encoding};

/// Fetches the forecast file; any failure gives an empty string.
pub async fn fetch_forecast<S: CsvSource>(source: &S, config: &FeedConfig) -> String {
    fetch_or_none(source, &config.forecast_url())
        .await
        .unwrap_or_default()
}

/// Parses `YYYYMMDDHH` exactly: ten digits and a real calendar hour.
pub fn parse_compact_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[0..4].parse().ok()?;
    let month = s[4..6].parse().ok()?;
    let day = s[6..8].parse().ok()?;
    let hour = s[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

/// The actuals feed's own unpadded `date,time` cells, e.g. `2025/9/4,6:00`.
pub fn actuals_date_time(dt: NaiveDateTime) -> (String, String) {
    (
        dt.format("%Y/%-m/%-d").to_string(),
        dt.format("%-H:%M").to_string(),
    )
}

/// Rewrites the forecast file in the actuals' wide layout. Station columns are
/// sorted by id, rows by time, values descaled. Cells a station has no value
/// for are left empty. Returns an empty string when nothing usable is found.
pub fn transcode(forecast_csv: &str) -> String {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(forecast_csv.as_bytes());

    let mut records = rdr.records().filter_map(|r| match r {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("skipping unreadable forecast row: {e}");
            None
        }
    });

    let Some(header) = records.next() else {
        return String::new();
    };

    let columns: Vec<(usize, NaiveDateTime)> = header
        .iter()
        .enumerate()
        .skip(LEADING_COLUMNS)
        .filter_map(|(col, cell)| parse_compact_timestamp(cell).map(|dt| (col, dt)))
        .collect();

    let mut station_ids = BTreeSet::new();
    let mut by_time: BTreeMap<NaiveDateTime, HashMap<String, f64>> = BTreeMap::new();

    for row in records {
        let id = row.get(0).unwrap_or("").trim();
        if id.is_empty() {
            continue;
        }
        station_ids.insert(id.to_string());

        for (col, dt) in &columns {
            let Some(value) = row.get(*col).and_then(|c| Encoding::Forecast.read_cell(c)) else {
                continue;
            };
            by_time.entry(*dt).or_default().insert(id.to_string(), value);
        }
    }

    if by_time.is_empty() {
        debug!("forecast file has no usable values");
        return String::new();
    }

    let mut lines = Vec::with_capacity(by_time.len() + 1);
    lines.push(
        ["Date", "Time"]
            .into_iter()
            .chain(station_ids.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(","),
    );

    for (dt, values) in &by_time {
        let (date, time) = actuals_date_time(*dt);
        let mut cells = vec![date, time];
        cells.extend(station_ids.iter().map(|id| match values.get(id) {
            Some(v) => CellValue(*v).to_string(),
            None => String::new(),
        }));
        lines.push(cells.join(","));
    }

    debug!(
        "forecast transcoded: {} stations, {} hours",
        station_ids.len(),
        by_time.len()
    );

    lines.join("\n")
}

/// Appends the rows of a transcoded forecast to an actuals CSV, keeping the
/// actuals header. Forecast cells are moved to the actuals column of the same
/// station id; forecast-only stations are dropped.
pub fn merge_forecast(actuals_csv: &str, forecast_wide_csv: &str) -> String {
    let forecast_lines: Vec<&str> = forecast_wide_csv
        .trim()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if forecast_lines.len() < 2 {
        return actuals_csv.to_string();
    }

    let actuals = actuals_csv.trim();
    let Some(actuals_header) = actuals.lines().next().filter(|h| !h.trim().is_empty()) else {
        // nothing to align against, the forecast stands on its own
        return forecast_lines.join("\n");
    };

    let forecast_columns: HashMap<&str, usize> = forecast_lines[0]
        .split(',')
        .enumerate()
        .skip(LEADING_COLUMNS)
        .map(|(i, id)| (id.trim(), i))
        .collect();

    let targets: Vec<Option<usize>> = actuals_header
        .split(',')
        .skip(LEADING_COLUMNS)
        .map(|id| forecast_columns.get(id.trim()).copied())
        .collect();

    let mut lines: Vec<String> = actuals.lines().map(String::from).collect();
    for row in &forecast_lines[1..] {
        let cells: Vec<&str> = row.split(',').collect();
        let mut out: Vec<&str> = cells.iter().take(LEADING_COLUMNS).copied().collect();
        out.extend(
            targets
                .iter()
                .map(|t| t.and_then(|i| cells.get(i).copied()).unwrap_or("")),
        );
        lines.push(out.join(","));
    }

    lines.join("\n")
}
