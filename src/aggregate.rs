use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::time::{date_portion, minutes_of_day};

/// Start of the daytime window, 09:00.
pub const DAYTIME_START: u32 = 9 * 60;
/// End of the daytime window, 17:00 (inclusive).
pub const DAYTIME_END: u32 = 17 * 60;

/// One reading at a canonical `YYYY/MM/DD HH:mm` timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub time: String,
    pub wbgt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyValue {
    pub date: String,
    pub wbgt: f64,
}

pub fn round_one_decimal(v: f64) -> f64 {
    (v * 10.).round() / 10.
}

pub fn in_daytime(timestamp: &str) -> bool {
    minutes_of_day(timestamp)
        .map(|m| (DAYTIME_START..=DAYTIME_END).contains(&m))
        .unwrap_or(false)
}

/// Mean of the positive daytime (09:00-17:00) readings on `date`, rounded to
/// one decimal. `date` is matched against the date part of each timestamp as a
/// plain string. Zero when nothing qualifies.
pub fn daily_daytime_average(series: &[TimeSeriesSample], date: &str) -> f64 {
    let (sum, count) = series
        .iter()
        .filter(|s| date_portion(&s.time) == date)
        .filter(|s| in_daytime(&s.time))
        .filter(|s| s.wbgt > 0.) // zero or negative means no reading
        .fold((0., 0usize), |(sum, n), s| (sum + s.wbgt, n + 1));

    if count == 0 {
        return 0.;
    }
    round_one_decimal(sum / count as f64)
}

/// Highest reading per date, dates in first-encountered order.
pub fn daily_maxima(series: &[TimeSeriesSample]) -> Vec<DailyValue> {
    let mut maxima: Vec<DailyValue> = vec![];
    let mut index: HashMap<&str, usize> = HashMap::new();

    for s in series {
        let date = date_portion(&s.time);
        match index.get(date) {
            Some(&i) => {
                if s.wbgt > maxima[i].wbgt {
                    maxima[i].wbgt = s.wbgt;
                }
            }
            None => {
                index.insert(date, maxima.len());
                maxima.push(DailyValue {
                    date: date.to_string(),
                    wbgt: s.wbgt,
                });
            }
        }
    }

    maxima
}

/// Distinct dates of a series, ascending. Canonical dates are zero-padded so
/// string order is calendar order.
pub fn unique_dates(series: &[TimeSeriesSample]) -> Vec<String> {
    let mut dates: Vec<String> = series
        .iter()
        .map(|s| date_portion(&s.time).to_string())
        .collect();
    dates.sort();
    dates.dedup();
    dates
}
