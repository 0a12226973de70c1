//! Ingestion of the Japanese Ministry of the Environment WBGT (heat stress)
//! feeds.
//!
//! Monthly observation CSVs and the forecast CSV are fetched, stitched into a
//! single wide table (`Date,Time,<station ids...>`) and turned into a GeoJSON
//! feature collection whose per-station arrays line up with shared hourly and
//! daily time axes.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod frame;
pub mod geojson;
pub mod levels;
pub mod pipeline;
pub mod stations;
pub mod time;
pub mod units;

pub use config::{load_config, FeedConfig};
pub use error::{IngestError, Result};
pub use fetch::{CsvSource, HttpSource};
pub use frame::WideCsvFrame;
pub use geojson::{DisplayMode, WbgtDataResult};
pub use pipeline::{assemble, fetch_wbgt_data, fetch_wbgt_data_with};
pub use stations::{load_stations, Station, StationDirectory};
pub use time::{normalize, NormalizedTime};
