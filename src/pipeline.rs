//! Top-level ingestion: fetch everything, stitch it into one wide CSV, build
//! the map payload.

use chrono::{NaiveDate, Utc};
#[allow(unused)]
use log::{debug, error, info, trace, warn};

use crate::config::FeedConfig;
use crate::error::Result;
use crate::fetch::actuals::{fetch_actuals, filter_by_days_back};
use crate::fetch::forecast::{fetch_forecast, merge_forecast, transcode};
use crate::fetch::CsvSource;
use crate::geojson::{build, WbgtDataResult};
use crate::stations::{load_stations, StationDirectory};

/// Pure half of the pipeline: windows the actuals to the last
/// `config.days_back` days before `today`, appends the forecast and builds
/// the features.
pub fn assemble(
    actuals_csv: &str,
    forecast_csv: &str,
    directory: &StationDirectory,
    config: &FeedConfig,
    today: NaiveDate,
) -> Result<WbgtDataResult> {
    let recent = filter_by_days_back(actuals_csv, config.days_back, today);
    let forecast = transcode(forecast_csv);
    let merged = merge_forecast(&recent, &forecast);

    debug!("merged CSV has {} lines", merged.lines().count());

    build(&merged, directory, config.time_zone)
}

/// Fetch and assemble for `today`. Errors come back as-is.
pub async fn try_fetch_wbgt_data<S: CsvSource>(
    source: &S,
    config: &FeedConfig,
    directory: &StationDirectory,
    today: NaiveDate,
) -> Result<WbgtDataResult> {
    let (actuals, forecast) = futures::join!(
        fetch_actuals(source, config, today),
        fetch_forecast(source, config)
    );
    assemble(&actuals?, &forecast, directory, config, today)
}

/// What the map asks for. Stations are read from `config.stations_path` on
/// every call. Never fails: any error is logged and the empty result
/// returned.
pub async fn fetch_wbgt_data<S: CsvSource>(source: &S, config: &FeedConfig) -> WbgtDataResult {
    let directory = load_stations(&config.stations_path);
    fetch_wbgt_data_with(source, config, &directory).await
}

/// [`fetch_wbgt_data`] against an already loaded station directory.
pub async fn fetch_wbgt_data_with<S: CsvSource>(
    source: &S,
    config: &FeedConfig,
    directory: &StationDirectory,
) -> WbgtDataResult {
    let today = Utc::now().with_timezone(&config.time_zone).date_naive();

    match try_fetch_wbgt_data(source, config, directory, today).await {
        Ok(result) => {
            info!(
                "WBGT data ready: {} stations, {} hourly points",
                result.geojson.features.len(),
                result.hourly_time_points.len()
            );
            result
        }
        Err(e) => {
            error!("failed to build WBGT data: {e}");
            WbgtDataResult::empty()
        }
    }
}
