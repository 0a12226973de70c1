use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Reference data for one observation point. Coordinates are kept as the
/// strings the directory ships; they are parsed when a feature is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub lat: String,
    pub lng: String,
}

impl Station {
    /// `(lng, lat)`; invalid strings come out as NaN.
    pub fn coordinates(&self) -> (f64, f64) {
        (parse_coordinate(&self.lng), parse_coordinate(&self.lat))
    }
}

fn parse_coordinate(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

/// Station list plus an id index, built once per request.
#[derive(Clone, Debug, Default)]
pub struct StationDirectory {
    stations: Vec<Station>,
    by_id: HashMap<String, usize>,
}

impl StationDirectory {
    pub fn new(stations: Vec<Station>) -> StationDirectory {
        let mut by_id = HashMap::with_capacity(stations.len());
        for (i, s) in stations.iter().enumerate() {
            // first entry wins, like a linear search would
            by_id.entry(s.id.trim().to_string()).or_insert(i);
        }
        StationDirectory { stations, by_id }
    }

    pub fn from_json(text: &str) -> Result<StationDirectory> {
        let stations: Vec<Station> = serde_json::from_str(text)?;
        Ok(StationDirectory::new(stations))
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.by_id.get(id.trim()).map(|&i| &self.stations[i])
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

/// Reads the station directory JSON. A missing or broken file gives an empty
/// directory so the request can still answer with "no data".
pub fn load_stations(path: impl AsRef<Path>) -> StationDirectory {
    let path = path.as_ref();
    let loaded = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| StationDirectory::from_json(&text));

    match loaded {
        Ok(dir) => {
            debug!("loaded {} stations from {}", dir.len(), path.display());
            dir
        }
        Err(e) => {
            error!("failed to load station directory {}: {e}", path.display());
            StationDirectory::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS: &str = r#"[
        {"id": "11001", "name": "Soya", "lat": "45.415", "lng": "141.678"},
        {"id": "11016", "name": "Wakkanai", "lat": "45.4", "lng": "141.7"},
        {"id": "99999", "name": "Broken", "lat": "north", "lng": ""}
    ]"#;

    #[test]
    fn looks_up_by_trimmed_id() {
        let dir = StationDirectory::from_json(STATIONS).unwrap();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.get("11001").map(|s| s.name.as_str()), Some("Soya"));
        assert_eq!(dir.get(" 11016 ").map(|s| s.name.as_str()), Some("Wakkanai"));
        assert!(dir.get("12011").is_none());
    }

    #[test]
    fn coordinates_are_lng_lat() {
        let dir = StationDirectory::from_json(STATIONS).unwrap();
        let (lng, lat) = dir.get("11001").unwrap().coordinates();
        assert!((lng - 141.678).abs() < 1e-9);
        assert!((lat - 45.415).abs() < 1e-9);

        let (lng, lat) = dir.get("99999").unwrap().coordinates();
        assert!(lng.is_nan());
        assert!(lat.is_nan());
    }

    #[test]
    fn loads_directory_from_file() {
        let path = std::env::temp_dir().join(format!("wbgt_directory_{}.json", std::process::id()));
        fs::write(&path, STATIONS).unwrap();

        let dir = load_stations(&path);
        fs::remove_file(&path).unwrap();

        assert_eq!(dir.len(), 3);
        assert_eq!(dir.get("11016").map(|s| s.name.as_str()), Some("Wakkanai"));
        assert_eq!(dir.stations()[0].id, "11001");
    }

    #[test]
    fn unreadable_json_file_is_an_empty_directory() {
        let path = std::env::temp_dir().join(format!("wbgt_broken_{}.json", std::process::id()));
        fs::write(&path, "{not json").unwrap();

        let dir = load_stations(&path);
        fs::remove_file(&path).unwrap();

        assert!(dir.is_empty());
    }

    #[test]
    fn missing_file_is_an_empty_directory() {
        let dir = load_stations("/nonexistent/stations.json");
        assert!(dir.is_empty());
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(StationDirectory::from_json("{not json").is_err());
    }
}
