use serde::Serialize;
use serde_json::{Map, Value};

/// The tag object exiftool prints for a single file.
pub type Tags = Map<String, Value>;

pub const CREATE_DATE_TAG: &str = "CreateDate";
pub const GPS_LATITUDE_TAG: &str = "GPSLatitude";
pub const GPS_LONGITUDE_TAG: &str = "GPSLongitude";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ImageRecord {
    #[serde(rename = "Image Path")]
    pub path: String,
    #[serde(rename = "Image Name")]
    pub filename: String,
    #[serde(rename = "DateTimeOriginal", skip_serializing_if = "Option::is_none")]
    pub capture_time: Option<String>,
    /// `None` when the tag is absent, `Some(None)` when it could not be parsed.
    #[serde(rename = "Latitude", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Option<f64>>,
    #[serde(rename = "Longitude", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Option<f64>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
}
