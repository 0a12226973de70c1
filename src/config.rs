//! Feed configuration.
//!
//! Every field has a default, so an empty (or absent) TOML file is valid:
//!
//! ```toml
//! base_url = "https://www.wbgt.env.go.jp"
//! days_back = 14
//! time_zone = "Asia/Tokyo"
//! stations_path = "public/data/stations.json"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://www.wbgt.env.go.jp";
pub const DEFAULT_DAYS_BACK: u32 = 14;
pub const DEFAULT_STATIONS_PATH: &str = "public/data/stations.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    /// How many days of actuals to keep before today.
    pub days_back: u32,
    /// Zone of the feeds' wall-clock timestamps.
    pub time_zone: Tz,
    pub stations_path: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: DEFAULT_BASE_URL.into(),
            days_back: DEFAULT_DAYS_BACK,
            time_zone: chrono_tz::Asia::Tokyo,
            stations_path: DEFAULT_STATIONS_PATH.into(),
        }
    }
}

impl FeedConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `year_month` is `YYYYMM`.
    pub fn actuals_url(&self, year_month: &str) -> String {
        format!("{}/est15WG/dl/wbgt_all_{year_month}.csv", self.base())
    }

    pub fn forecast_url(&self) -> String {
        format!("{}/prev15WG/dl/yohou_all.csv", self.base())
    }

    /// Previous month first, then the current one.
    pub fn monthly_urls(&self, today: NaiveDate) -> Vec<String> {
        let previous = today
            .with_day(1)
            .and_then(|d| d.checked_sub_months(Months::new(1)))
            .unwrap_or(today);

        [previous, today]
            .iter()
            .map(|d| self.actuals_url(&d.format("%Y%m").to_string()))
            .collect()
    }
}

pub fn parse_config(text: &str) -> Result<FeedConfig> {
    Ok(toml::from_str(text)?)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<FeedConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parsing config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), FeedConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let c = parse_config("days_back = 3\ntime_zone = \"UTC\"\nbase_url = \"http://localhost:8080/\"")
            .unwrap();
        assert_eq!(c.days_back, 3);
        assert_eq!(c.time_zone, Tz::UTC);
        assert_eq!(c.stations_path, DEFAULT_STATIONS_PATH);
        assert_eq!(c.forecast_url(), "http://localhost:8080/prev15WG/dl/yohou_all.csv");
    }

    #[test]
    fn bad_zone_is_an_error() {
        assert!(parse_config("time_zone = \"Mars/Olympus\"").is_err());
    }

    #[test]
    fn monthly_urls_cross_year_boundary() {
        let c = FeedConfig::default();
        let urls = c.monthly_urls(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(
            urls,
            vec![
                "https://www.wbgt.env.go.jp/est15WG/dl/wbgt_all_202512.csv",
                "https://www.wbgt.env.go.jp/est15WG/dl/wbgt_all_202601.csv",
            ]
        );

        let urls = c.monthly_urls(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        assert!(urls[0].ends_with("wbgt_all_202502.csv"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config("/nonexistent/wbgt.toml").is_err());
    }
}
