//! Heat-stress risk levels used to color WBGT readings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Color for a station with no reading (value exactly 0).
pub const NO_DATA_COLOR: &str = "#808080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WbgtLevel {
    Disaster,
    Extreme,
    Danger,
    Caution,
    Warning,
    Attention,
    Safe,
}

impl WbgtLevel {
    /// Lower bound (inclusive) in °C.
    pub fn threshold(&self) -> f64 {
        match self {
            WbgtLevel::Disaster => 35.,
            WbgtLevel::Extreme => 33.,
            WbgtLevel::Danger => 31.,
            WbgtLevel::Caution => 28.,
            WbgtLevel::Warning => 25.,
            WbgtLevel::Attention => 21.,
            WbgtLevel::Safe => f64::MIN,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            WbgtLevel::Disaster => "#800080",
            WbgtLevel::Extreme => "#FF0000",
            WbgtLevel::Danger => "#FF4500",
            WbgtLevel::Caution => "#FFA500",
            WbgtLevel::Warning => "#FFFF00",
            WbgtLevel::Attention => "#00FFFF",
            WbgtLevel::Safe => "#0000FF",
        }
    }
}

/// Levels are iterated from the highest threshold down, so the first match wins.
pub fn level_for(wbgt: f64) -> WbgtLevel {
    WbgtLevel::iter()
        .find(|l| wbgt >= l.threshold())
        .unwrap_or(WbgtLevel::Safe)
}

pub fn color_for(wbgt: f64) -> &'static str {
    if wbgt == 0. {
        return NO_DATA_COLOR;
    }
    level_for(wbgt).color()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItem {
    pub color: &'static str,
    pub level: WbgtLevel,
}

pub fn legend_items() -> Vec<LegendItem> {
    WbgtLevel::iter()
        .map(|level| LegendItem {
            color: level.color(),
            level,
        })
        .collect()
}
