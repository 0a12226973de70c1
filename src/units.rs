use std::fmt;

use strum_macros::Display;

// VALUE ENCODINGS -------------------------------------------------------------
// Both feeds publish WBGT in °C, but sometimes multiplied by ten. How a cell
// is decoded depends on which feed it came from.

/// Readings above this are assumed to be tenths in the actuals feed.
pub const ACTUALS_SCALED_ABOVE: f64 = 100.;

pub const TENTHS: f64 = 10.;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Encoding {
    // monthly observation files: mostly °C, occasionally ×10
    #[strum(to_string = "actuals (×10 when > 100)")]
    Actuals,
    // forecast file: always ×10
    #[strum(to_string = "forecast (×10)")]
    Forecast,
}
pub use Encoding::*;

impl Encoding {
    /// Decodes one already-parsed cell value into °C.
    pub fn decode(&self, raw: f64) -> f64 {
        match self {
            Actuals if raw > ACTUALS_SCALED_ABOVE => raw / TENTHS,
            Actuals => raw,
            Forecast => raw / TENTHS,
        }
    }

    /// Parses and decodes a CSV cell. Anything that is not a finite number
    /// is "no reading".
    pub fn read_cell(&self, cell: &str) -> Option<f64> {
        parse_value(cell).map(|v| self.decode(v))
    }
}

/// A cell is present if it parses as a finite number after trimming.
pub fn parse_value(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Writes a value the way the feeds themselves do: no trailing `.0`.
pub struct CellValue(pub f64);

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// TESTS -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuals_only_descale_above_one_hundred() {
        assert_eq!(Actuals.decode(28.5), 28.5);
        assert_eq!(Actuals.decode(100.), 100.);
        assert_eq!(Actuals.decode(285.), 28.5);
        assert_eq!(Actuals.decode(100.5), 10.05);
    }

    #[test]
    fn forecast_always_descales() {
        assert_eq!(Forecast.decode(285.), 28.5);
        assert_eq!(Forecast.decode(50.), 5.);
        assert_eq!(Forecast.decode(0.), 0.);
    }

    #[test]
    fn cells() {
        assert_eq!(Actuals.read_cell(" 285 "), Some(28.5));
        assert_eq!(Actuals.read_cell(""), None);
        assert_eq!(Actuals.read_cell("---"), None);
        assert_eq!(Actuals.read_cell("NaN"), None);
        assert_eq!(Actuals.read_cell("inf"), None);
        assert_eq!(Forecast.read_cell("301"), Some(30.1));
    }

    #[test]
    fn cell_values_print_like_the_feed() {
        assert_eq!(CellValue(30.).to_string(), "30");
        assert_eq!(CellValue(28.5).to_string(), "28.5");
        assert_eq!(Forecast.to_string(), "forecast (×10)");
    }
}
