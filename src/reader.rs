use crate::config::AppConfig;
use crate::error::AppError;
use crate::gps::{GpsCoordinate, Hemisphere};
use crate::metadata::{Tags, CREATE_DATE_TAG, GPS_LATITUDE_TAG, GPS_LONGITUDE_TAG};
use exif::{In, Rational, Reader, Tag};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Reads the metadata tags of a single image.
pub trait MetadataReader {
    fn read_tags(&self, path: &Path) -> Result<Tags, AppError>;
}

/// Picks the backend named by `metadata_backend`.
pub fn reader_for(config: &AppConfig) -> Result<Box<dyn MetadataReader>, AppError> {
    match config.metadata_backend.as_str() {
        "exiftool" => Ok(Box::new(ExifToolReader::new(&config.extract.exiftool_path))),
        "native" => Ok(Box::new(NativeExifReader)),
        other => Err(AppError::InvalidConfig(format!(
            "unknown metadata backend '{}', expected 'exiftool' or 'native'",
            other
        ))),
    }
}

/// Runs `exiftool -j <file>` once per image and blocks until it exits.
pub struct ExifToolReader {
    program: PathBuf,
}

impl ExifToolReader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MetadataReader for ExifToolReader {
    fn read_tags(&self, path: &Path) -> Result<Tags, AppError> {
        log::trace!("Running {:?} -j {:?}", self.program, path);
        let output = Command::new(&self.program).arg("-j").arg(path).output()?;

        if !output.status.success() {
            return Err(AppError::MetadataTool {
                path: path.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_exiftool_output(path, &output.stdout)
    }
}

/// Turns exiftool's JSON output for one file into its tag object. The output
/// must be an array holding exactly one non-empty object.
pub fn parse_exiftool_output(path: &Path, stdout: &[u8]) -> Result<Tags, AppError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Err(AppError::EmptyMetadata(path.to_path_buf()));
    }

    let invalid = |reason: String| AppError::InvalidMetadata {
        path: path.to_path_buf(),
        reason,
    };

    let parsed: Value = serde_json::from_str(&text)
        .map_err(|e| invalid(format!("JSON decoding failed: {}", e)))?;

    let mut items = match parsed {
        Value::Array(items) => items,
        other => return Err(invalid(format!("expected a JSON array, got {}", kind_of(&other)))),
    };
    if items.len() != 1 {
        return Err(invalid(format!("expected exactly one entry, got {}", items.len())));
    }

    match items.pop() {
        Some(Value::Object(tags)) if tags.is_empty() => {
            Err(AppError::EmptyMetadata(path.to_path_buf()))
        }
        Some(Value::Object(tags)) => Ok(tags),
        Some(other) => Err(invalid(format!("expected an object, got {}", kind_of(&other)))),
        None => Err(AppError::EmptyMetadata(path.to_path_buf())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads EXIF in-process and reports it under exiftool's tag names and
/// value layout, so records come out the same with either backend.
pub struct NativeExifReader;

impl MetadataReader for NativeExifReader {
    fn read_tags(&self, path: &Path) -> Result<Tags, AppError> {
        let mut tags = Tags::new();
        tags.insert(
            "SourceFile".to_string(),
            Value::String(path.to_string_lossy().to_string()),
        );

        let file = File::open(path)?;
        let mut buf_reader = BufReader::new(file);
        let exif = match Reader::new().read_from_container(&mut buf_reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found for {:?}", path);
                return Ok(tags);
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(value) = ascii_field(&exif, Tag::DateTimeDigitized) {
            tags.insert(CREATE_DATE_TAG.to_string(), Value::String(value));
        }
        if let Some(value) = ascii_field(&exif, Tag::DateTimeOriginal) {
            tags.insert("DateTimeOriginal".to_string(), Value::String(value));
        }
        if let Some(coordinate) = gps_field(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef) {
            tags.insert(GPS_LATITUDE_TAG.to_string(), Value::String(coordinate.to_string()));
        }
        if let Some(coordinate) = gps_field(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef) {
            tags.insert(GPS_LONGITUDE_TAG.to_string(), Value::String(coordinate.to_string()));
        }

        log::trace!("EXIF tags for {:?}: {:?}", path, tags);
        Ok(tags)
    }
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        exif::Value::Ascii(values) => values
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

fn gps_field(exif: &exif::Exif, tag: Tag, ref_tag: Tag) -> Option<GpsCoordinate> {
    let hemisphere = match ascii_field(exif, ref_tag).as_deref().map(str::trim) {
        Some("N") => Hemisphere::North,
        Some("S") => Hemisphere::South,
        Some("E") => Hemisphere::East,
        Some("W") => Hemisphere::West,
        other => {
            log::debug!("Ignoring {} without a usable reference: {:?}", tag, other);
            return None;
        }
    };

    match &exif.get_field(tag, In::PRIMARY)?.value {
        exif::Value::Rational(parts) => dms_from_rationals(parts, hemisphere),
        _ => None,
    }
}

/// Normalizes EXIF degree/minute/second rationals (minutes may carry the
/// fraction) into whole degrees and minutes with seconds at 1/100 precision.
pub fn dms_from_rationals(parts: &[Rational], hemisphere: Hemisphere) -> Option<GpsCoordinate> {
    if parts.is_empty() || parts.iter().any(|r| r.denom == 0) {
        return None;
    }

    let total: f64 = parts
        .iter()
        .take(3)
        .zip([1.0, 60.0, 3600.0])
        .map(|(r, divisor)| r.to_f64() / divisor)
        .sum();
    let hundredths = (total * 360_000.0).round() as u64;

    Some(GpsCoordinate {
        degrees: (hundredths / 360_000) as u32,
        minutes: ((hundredths % 360_000) / 6_000) as u32,
        seconds: (hundredths % 6_000) as f64 / 100.0,
        hemisphere,
    })
}
