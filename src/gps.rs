//! Sexagesimal GPS coordinates as printed by exiftool, e.g. `40 deg 26' 46.00" N`.

use crate::error::AppError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref DMS_PATTERN: Regex =
        Regex::new(r#"^\s*(\d+) deg (\d+)'\s*(\d+(?:\.\d+)?)" ([NSEW])\s*$"#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsCoordinate {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
    pub hemisphere: Hemisphere,
}

impl GpsCoordinate {
    /// Signed decimal degrees; southern and western values are negative.
    pub fn to_decimal(&self) -> f64 {
        let decimal = self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0;
        match self.hemisphere {
            Hemisphere::South | Hemisphere::West => -decimal,
            Hemisphere::North | Hemisphere::East => decimal,
        }
    }
}

impl FromStr for GpsCoordinate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DMS_PATTERN
            .captures(s)
            .ok_or_else(|| AppError::GpsFormat(s.to_string()))?;
        let invalid = || AppError::GpsFormat(s.to_string());

        Ok(GpsCoordinate {
            degrees: caps[1].parse::<u32>().map_err(|_| invalid())?,
            minutes: caps[2].parse::<u32>().map_err(|_| invalid())?,
            seconds: caps[3].parse::<f64>().map_err(|_| invalid())?,
            hemisphere: Hemisphere::from_letter(&caps[4]).ok_or_else(invalid)?,
        })
    }
}

impl fmt::Display for GpsCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deg {}' {:.2}\" {}",
            self.degrees,
            self.minutes,
            self.seconds,
            self.hemisphere.letter()
        )
    }
}

/// Parses `value` into decimal degrees, logging and returning `None` when the
/// text does not look like a sexagesimal coordinate.
pub fn parse_gps_coordinate(value: &str) -> Option<f64> {
    match value.parse::<GpsCoordinate>() {
        Ok(coordinate) => Some(coordinate.to_decimal()),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
}
