//! GeoJSON output for the map.
//!
//! Every feature carries dense arrays that line up index-for-index with the
//! shared time axes of [`WbgtDataResult`]: `valueByDateTime[k]` belongs to
//! `hourlyTimePoints[k]`, and `maxByDate[k]` / `valueByDateAverage[k]` belong
//! to `dailyTimePoints[k]`. Missing readings are `0`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
#[allow(unused)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::aggregate::{daily_daytime_average, daily_maxima, DailyValue, TimeSeriesSample};
use crate::error::Result;
use crate::frame::WideCsvFrame;
use crate::stations::{Station, StationDirectory};
use crate::time::{canonical_to_iso, date_portion, date_to_iso, parse_iso};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayMode {
    Hourly,
    DailyMax,
    DailyAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WbgtProperties {
    pub id: String,
    pub name: String,
    /// One value per hourly time point.
    pub value_by_date_time: Vec<f64>,
    /// Daily maximum per date the station reported, first-seen order.
    pub value_by_date: Vec<DailyValue>,
    /// One value per daily time point.
    pub max_by_date: Vec<f64>,
    /// One value per daily time point.
    pub value_by_date_average: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct StationFeature {
    pub id: String,
    pub name: String,
    pub geometry: Geometry,
    pub properties: WbgtProperties,
}

impl StationFeature {
    pub fn values(&self, mode: DisplayMode) -> &[f64] {
        match mode {
            DisplayMode::Hourly => &self.properties.value_by_date_time,
            DisplayMode::DailyMax => &self.properties.max_by_date,
            DisplayMode::DailyAverage => &self.properties.value_by_date_average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<StationFeature>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WbgtDataResult {
    pub geojson: FeatureCollection,
    /// UTC ISO instants of each hourly bucket.
    pub hourly_time_points: Vec<String>,
    /// UTC ISO instants of local midnight of each day.
    pub daily_time_points: Vec<String>,
}

impl WbgtDataResult {
    /// What callers get when ingestion fails: no features, no time points.
    pub fn empty() -> WbgtDataResult {
        WbgtDataResult::default()
    }

    pub fn time_points(&self, mode: DisplayMode) -> &[String] {
        match mode {
            DisplayMode::Hourly => &self.hourly_time_points,
            DisplayMode::DailyMax | DisplayMode::DailyAverage => &self.daily_time_points,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A time axis: canonical keys and their ISO instants, index-aligned.
struct Axis<'a> {
    keys: Vec<&'a str>,
    iso: Vec<String>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Axis<'a> {
    fn new<I, F>(keys: I, to_iso: F) -> Axis<'a>
    where
        I: IntoIterator<Item = &'a str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut axis = Axis {
            keys: vec![],
            iso: vec![],
            index: HashMap::new(),
        };
        for key in keys {
            if axis.index.contains_key(key) {
                continue;
            }
            match to_iso(key) {
                Some(iso) => {
                    axis.index.insert(key, axis.keys.len());
                    axis.keys.push(key);
                    axis.iso.push(iso);
                }
                None => warn!("cannot place '{key}' on the time axis"),
            }
        }
        axis
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }
}

/// Parses a wide CSV and builds one feature per known station with data.
pub fn build(csv_text: &str, directory: &StationDirectory, tz: Tz) -> Result<WbgtDataResult> {
    let frame = WideCsvFrame::parse(csv_text)?;
    Ok(build_from_frame(&frame, directory, tz))
}

pub fn build_from_frame(frame: &WideCsvFrame, directory: &StationDirectory, tz: Tz) -> WbgtDataResult {
    let hourly = Axis::new(
        frame.master_times().iter().map(String::as_str),
        |t| canonical_to_iso(t, tz),
    );

    let mut dates: Vec<&str> = hourly.keys.iter().map(|t| date_portion(*t)).collect();
    dates.sort();
    let daily = Axis::new(dates, |d| date_to_iso(d, tz));

    let mut features = vec![];

    for (station_index, station_id) in frame.station_ids.iter().enumerate() {
        let Some(station) = directory.get(station_id) else {
            debug!("station {station_id} is not in the station directory");
            continue;
        };

        let series = first_sample_per_time(frame.station_series(station_index));
        if series.is_empty() {
            debug!("station {station_id} has no WBGT data");
            continue;
        }

        features.push(station_feature(station_id, station, &series, &hourly, &daily));
    }

    info!("built {} station features", features.len());

    WbgtDataResult {
        geojson: FeatureCollection { features },
        hourly_time_points: hourly.iso,
        daily_time_points: daily.iso,
    }
}

/// Keeps the first reading for each timestamp, in row order.
fn first_sample_per_time(series: Vec<TimeSeriesSample>) -> Vec<TimeSeriesSample> {
    let mut seen = HashSet::new();
    series
        .into_iter()
        .filter(|s| seen.insert(s.time.clone()))
        .collect()
}

fn station_feature(
    station_id: &str,
    station: &Station,
    series: &[TimeSeriesSample],
    hourly: &Axis,
    daily: &Axis,
) -> StationFeature {
    let mut value_by_date_time = vec![0.; hourly.len()];
    for s in series {
        if let Some(k) = hourly.position(&s.time) {
            value_by_date_time[k] = s.wbgt;
        }
    }

    let value_by_date = daily_maxima(series);

    let mut max_by_date = vec![0.; daily.len()];
    for d in &value_by_date {
        if let Some(k) = daily.position(&d.date) {
            max_by_date[k] = d.wbgt;
        }
    }

    let value_by_date_average = daily
        .keys
        .iter()
        .map(|date| daily_daytime_average(series, date))
        .collect();

    let (lng, lat) = station.coordinates();

    StationFeature {
        id: station_id.to_string(),
        name: station.name.clone(),
        geometry: Geometry::Point {
            coordinates: [lng, lat],
        },
        properties: WbgtProperties {
            id: station_id.to_string(),
            name: station.name.clone(),
            value_by_date_time,
            value_by_date,
            max_by_date,
            value_by_date_average,
        },
    }
}

/// Index of the time point nearest to `now`; 0 when nothing parses.
pub fn closest_time_index(time_points: &[String], now: DateTime<Utc>) -> usize {
    time_points
        .iter()
        .enumerate()
        .filter_map(|(i, iso)| parse_iso(iso).map(|t| (i, (t - now).num_milliseconds().abs())))
        .min_by_key(|&(_, diff)| diff)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;

    fn directory() -> StationDirectory {
        StationDirectory::new(vec![
            Station {
                id: "11001".into(),
                name: "Soya".into(),
                lat: "45.415".into(),
                lng: "141.678".into(),
            },
            Station {
                id: "11016".into(),
                name: "Wakkanai".into(),
                lat: "45.4".into(),
                lng: "141.7".into(),
            },
            Station {
                id: "12011".into(),
                name: "Esashi".into(),
                lat: "oops".into(),
                lng: "142.6".into(),
            },
        ])
    }

    const CSV: &str = "Date,Time,11001,11016,12011\n\
        2025/9/4,9:00,285,26.0,\n\
        2025/9/4,10:00,,27.0,\n\
        2025/9/4,17:00,31.0,,\n\
        2025/9/5,9:00,29.0,30.5,\n";

    #[test]
    fn dense_arrays_line_up_with_time_points() {
        let result = build(CSV, &directory(), Tokyo).unwrap();

        assert_eq!(
            result.hourly_time_points,
            vec![
                "2025-09-04T00:00:00.000Z",
                "2025-09-04T01:00:00.000Z",
                "2025-09-04T08:00:00.000Z",
                "2025-09-05T00:00:00.000Z",
            ]
        );
        assert_eq!(
            result.daily_time_points,
            vec!["2025-09-03T15:00:00.000Z", "2025-09-04T15:00:00.000Z"]
        );

        // 12011 never reports, so it is left out
        let features = &result.geojson.features;
        assert_eq!(features.len(), 2);

        let soya = &features[0];
        assert_eq!(soya.id, "11001");
        assert_eq!(soya.properties.value_by_date_time, vec![28.5, 0., 31., 29.]);
        assert_eq!(soya.properties.max_by_date, vec![31., 29.]);
        assert_eq!(soya.properties.value_by_date_average, vec![29.8, 29.]);
        assert_eq!(
            soya.properties.value_by_date,
            vec![
                DailyValue { date: "2025/09/04".into(), wbgt: 31. },
                DailyValue { date: "2025/09/05".into(), wbgt: 29. },
            ]
        );

        let wakkanai = &features[1];
        assert_eq!(wakkanai.properties.value_by_date_time, vec![26., 27., 0., 30.5]);
        assert_eq!(wakkanai.properties.value_by_date_average, vec![26.5, 30.5]);

        for f in features {
            assert_eq!(f.values(DisplayMode::Hourly).len(), result.time_points(DisplayMode::Hourly).len());
            assert_eq!(f.values(DisplayMode::DailyMax).len(), result.time_points(DisplayMode::DailyMax).len());
        }
    }

    #[test]
    fn unknown_stations_are_skipped() {
        let csv = "Date,Time,11001,77777\n2025/9/4,9:00,28,29\n";
        let result = build(csv, &directory(), Tokyo).unwrap();
        assert_eq!(result.geojson.features.len(), 1);
        assert_eq!(result.geojson.features[0].id, "11001");
        // the unknown station's reading still puts the hour on the axis
        assert_eq!(result.hourly_time_points.len(), 1);
    }

    #[test]
    fn first_reading_wins_for_repeated_timestamps() {
        let csv = "Date,Time,11001\n2025/9/4,9:00,28\n2025/9/4,9:00,35\n2025/9/4,10:00,30\n";
        let result = build(csv, &directory(), Tokyo).unwrap();
        let soya = &result.geojson.features[0];
        assert_eq!(soya.properties.value_by_date_time, vec![28., 30.]);
        assert_eq!(soya.properties.max_by_date, vec![30.]);
        assert_eq!(soya.properties.value_by_date_average, vec![29.]);
    }

    #[test]
    fn midnight_reading_lands_on_the_next_day() {
        let csv = "Date,Time,11001\n2025/9/1,23:00,27\n2025/9/1,24:00,26\n2025/9/2,1:00,25\n";
        let result = build(csv, &directory(), Tokyo).unwrap();

        assert_eq!(
            result.hourly_time_points,
            vec![
                "2025-09-01T14:00:00.000Z",
                "2025-09-01T15:00:00.000Z",
                "2025-09-01T16:00:00.000Z",
            ]
        );
        let soya = &result.geojson.features[0].properties;
        assert_eq!(soya.value_by_date_time, vec![27., 26., 25.]);
        assert_eq!(soya.max_by_date, vec![27., 26.]);
    }

    #[test]
    fn invalid_coordinates_are_nan() {
        let csv = "Date,Time,12011\n2025/9/4,9:00,28\n";
        let result = build(csv, &directory(), Tokyo).unwrap();
        let Geometry::Point { coordinates } = result.geojson.features[0].geometry;
        assert!((coordinates[0] - 142.6).abs() < 1e-9);
        assert!(coordinates[1].is_nan());
    }

    #[test]
    fn header_only_is_malformed() {
        let e = build("Date,Time,11001", &directory(), Tokyo).unwrap_err();
        assert!(matches!(e, IngestError::EmptyOrMalformed { .. }));
    }

    #[test]
    fn serializes_as_geojson() {
        let result = build("Date,Time,11001\n2025/9/4,9:00,28\n", &directory(), Tokyo).unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(json["geojson"]["type"], "FeatureCollection");
        let feature = &json["geojson"]["features"][0];
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["id"], "11001");
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["properties"]["valueByDateTime"][0], 28.0);
        assert_eq!(feature["properties"]["valueByDate"][0]["date"], "2025/09/04");
        assert!(feature["properties"]["maxByDate"].is_array());
        assert!(feature["properties"]["valueByDateAverage"].is_array());
        assert_eq!(json["hourlyTimePoints"][0], "2025-09-04T00:00:00.000Z");
        assert_eq!(json["dailyTimePoints"][0], "2025-09-03T15:00:00.000Z");
    }

    #[test]
    fn empty_result_shape() {
        let json = serde_json::to_value(WbgtDataResult::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "geojson": { "type": "FeatureCollection", "features": [] },
                "hourlyTimePoints": [],
                "dailyTimePoints": []
            })
        );
    }

    #[test]
    fn picks_nearest_time_point() {
        let points: Vec<String> = vec![
            "2025-09-04T00:00:00.000Z".into(),
            "2025-09-04T01:00:00.000Z".into(),
            "garbage".into(),
            "2025-09-04T03:00:00.000Z".into(),
        ];
        let now = Utc.with_ymd_and_hms(2025, 9, 4, 2, 40, 0).unwrap();
        assert_eq!(closest_time_index(&points, now), 3);

        let now = Utc.with_ymd_and_hms(2025, 9, 4, 1, 10, 0).unwrap();
        assert_eq!(closest_time_index(&points, now), 1);

        assert_eq!(closest_time_index(&[], now), 0);
        assert_eq!(DisplayMode::DailyMax.to_string(), "DAILY_MAX");
    }
}
