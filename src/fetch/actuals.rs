//! Monthly observation files (`wbgt_all_YYYYMM.csv`).

use chrono::{Days, NaiveDate};
use futures::future::join_all;
#[allow(unused)]
use log::{debug, error, info, trace, warn};

use crate::config::FeedConfig;
use crate::error::{IngestError, Result};
use crate::fetch::{fetch_or_none, CsvSource};
use crate::time::parse_date;

/// Fetches all `urls` at once and glues the results together in URL order.
/// A URL that fails just contributes nothing.
pub async fn combine<S: CsvSource>(source: &S, urls: &[String]) -> Result<String> {
    let bodies = join_all(urls.iter().map(|url| fetch_or_none(source, url))).await;
    let bodies: Vec<String> = bodies.into_iter().flatten().collect();

    info!("fetched {} of {} monthly CSV files", bodies.len(), urls.len());

    combine_texts(&bodies)
}

/// Previous month, then the current one, relative to `today`.
pub async fn fetch_actuals<S: CsvSource>(
    source: &S,
    config: &FeedConfig,
    today: NaiveDate,
) -> Result<String> {
    combine(source, &config.monthly_urls(today)).await
}

/// Header of the first text that has one, then the data rows of every text in
/// the order given. Rows are not re-sorted; each month file is already
/// chronological.
pub fn combine_texts(texts: &[String]) -> Result<String> {
    let header = texts
        .iter()
        .filter_map(|t| t.trim().lines().next())
        .find(|h| !h.trim().is_empty())
        .ok_or(IngestError::NoValidHeader)?;

    let mut lines = vec![header];
    for text in texts {
        lines.extend(text.trim().lines().skip(1).filter(|l| !l.trim().is_empty()));
    }

    debug!("combined CSV has {} data rows", lines.len() - 1);

    Ok(lines.join("\n"))
}

/// Keeps the header and the rows whose date cell is within `[start, end]`.
/// Rows with an empty or unparseable date are dropped. Text with no data rows
/// comes back unchanged.
pub fn filter_by_date_range(csv_text: &str, start: NaiveDate, end: NaiveDate) -> String {
    let lines: Vec<&str> = csv_text.trim().lines().collect();
    if lines.len() < 2 {
        return csv_text.to_string();
    }

    let mut kept = vec![lines[0]];
    kept.extend(lines[1..].iter().copied().filter(|row| {
        let mut columns = row.split(',');
        let (Some(date), Some(_time)) = (columns.next(), columns.next()) else {
            return false;
        };
        match parse_date(date) {
            Some(d) => start <= d && d <= end,
            None => false,
        }
    }));

    kept.join("\n")
}

/// The last `days_back` days up to and including `today`.
pub fn filter_by_days_back(csv_text: &str, days_back: u32, today: NaiveDate) -> String {
    let start = today
        .checked_sub_days(Days::new(days_back.into()))
        .unwrap_or(NaiveDate::MIN);
    filter_by_date_range(csv_text, start, today)
}
