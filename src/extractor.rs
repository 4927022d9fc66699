use crate::config::ExtractConfig;
use crate::error::AppError;
use crate::gps::parse_gps_coordinate;
use crate::metadata::{
    ImageRecord, RunSummary, Tags, CREATE_DATE_TAG, GPS_LATITUDE_TAG, GPS_LONGITUDE_TAG,
};
use crate::reader::MetadataReader;
use crate::{table, walker};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Builds the record for one image. Missing tags stay empty, and a GPS tag
/// that cannot be parsed keeps its column but loses the value.
pub fn record_from_tags(path: &Path, tags: &Tags) -> ImageRecord {
    let capture_time = tags.get(CREATE_DATE_TAG).and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    });

    ImageRecord {
        path: path.to_string_lossy().to_string(),
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        capture_time,
        latitude: coordinate(path, tags, GPS_LATITUDE_TAG),
        longitude: coordinate(path, tags, GPS_LONGITUDE_TAG),
    }
}

fn coordinate(path: &Path, tags: &Tags, tag: &str) -> Option<Option<f64>> {
    let value = match tags.get(tag)? {
        Value::String(s) => {
            let value = parse_gps_coordinate(s);
            if value.is_none() {
                log::warn!("Error parsing {} for {:?}", tag, path);
            }
            value
        }
        other => {
            log::warn!("Unexpected {} value for {:?}: {}", tag, path, other);
            None
        }
    };
    Some(value)
}

pub fn extract_record(path: &Path, reader: &dyn MetadataReader) -> Result<ImageRecord, AppError> {
    let tags = reader.read_tags(path)?;
    log::trace!("Metadata for {:?}: {:?}", path, tags);
    Ok(record_from_tags(path, &tags))
}

/// Reads every allowed image under `root` in walk order. Files whose metadata
/// cannot be read are logged, counted and left out.
pub fn process_directory(
    root: &Path,
    allowed_extensions: &HashSet<String>,
    reader: &dyn MetadataReader,
) -> Result<(Vec<ImageRecord>, RunSummary), AppError> {
    let mut records = Vec::new();
    let mut summary = RunSummary::default();

    for path in walker::discover_images(root, allowed_extensions)? {
        match extract_record(&path, reader) {
            Ok(record) => {
                log::info!("Processed {:?}", path);
                records.push(record);
                summary.processed += 1;
            }
            Err(e) => {
                log::warn!("Skipping {:?}: {}", path, e);
                summary.failed += 1;
            }
        }
    }

    Ok((records, summary))
}

pub fn run_extraction(
    config: &ExtractConfig,
    reader: &dyn MetadataReader,
) -> Result<RunSummary, AppError> {
    let (records, summary) =
        process_directory(&config.scan_directory, &config.allowed_extensions, reader)?;
    table::write_records(&config.output_file, &records)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Serves canned tags by file name; anything else fails like a crashed tool.
    struct StubReader {
        tags: HashMap<String, Value>,
    }

    impl MetadataReader for StubReader {
        fn read_tags(&self, path: &Path) -> Result<Tags, AppError> {
            let name = path.file_name().unwrap().to_str().unwrap();
            match self.tags.get(name) {
                Some(Value::Object(tags)) => Ok(tags.clone()),
                _ => Err(AppError::MetadataTool {
                    path: path.to_path_buf(),
                    status: "exit status: 1".to_string(),
                    stderr: "Error: File format error".to_string(),
                }),
            }
        }
    }

    fn tags(value: Value) -> Tags {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_record_with_all_fields() {
        let record = record_from_tags(
            &PathBuf::from("20240815/a/IMG_0001.JPG"),
            &tags(json!({
                "SourceFile": "20240815/a/IMG_0001.JPG",
                "CreateDate": "2024:08:15 10:32:01",
                "GPSLatitude": "40 deg 26' 46.00\" N",
                "GPSLongitude": "73 deg 59' 0.00\" W",
            })),
        );
        assert_eq!(record.filename, "IMG_0001.JPG");
        assert_eq!(record.capture_time.as_deref(), Some("2024:08:15 10:32:01"));
        assert!((record.latitude.flatten().unwrap() - 40.446111).abs() < 1e-6);
        assert!((record.longitude.flatten().unwrap() - -73.983333).abs() < 1e-6);
    }

    #[test]
    fn test_absent_fields_are_none() {
        let record =
            record_from_tags(&PathBuf::from("b.png"), &tags(json!({"SourceFile": "b.png"})));
        assert_eq!(record.capture_time, None);
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
    }

    #[test]
    fn test_unparsable_gps_keeps_the_record() {
        let record = record_from_tags(
            &PathBuf::from("c.jpg"),
            &tags(json!({
                "CreateDate": "2024:08:15 12:00:00",
                "GPSLatitude": "somewhere north",
                "GPSLongitude": "73 deg 59' 0.00\" W",
            })),
        );
        assert_eq!(record.latitude, Some(None));
        assert!(record.longitude.flatten().is_some());
        assert!(record.capture_time.is_some());
    }

    #[test]
    fn test_unparsable_gps_keeps_its_columns() {
        let record = record_from_tags(
            &PathBuf::from("a.jpg"),
            &tags(json!({
                "CreateDate": "x",
                "GPSLatitude": "garbage",
                "GPSLongitude": "garbage",
            })),
        );

        let mut out = Vec::new();
        table::write_records_to(&mut out, &[record]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Image Path,Image Name,DateTimeOriginal,Latitude,Longitude\na.jpg,a.jpg,x,,\n"
        );
    }

    #[test]
    fn test_missing_scan_root_still_writes_the_table() {
        let dir = tempdir().unwrap();
        let config = ExtractConfig {
            scan_directory: dir.path().join("absent"),
            output_file: dir.path().join("report.csv"),
            exiftool_path: "exiftool".to_string(),
            allowed_extensions: ["jpg"].iter().map(|s| s.to_string()).collect(),
        };
        let reader = StubReader {
            tags: HashMap::new(),
        };

        let summary = run_extraction(&config, &reader).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert_eq!(fs::read_to_string(&config.output_file).unwrap(), "");
    }

    #[test]
    fn test_failures_do_not_stop_the_run() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("20240815");
        fs::create_dir_all(root.join("drone")).unwrap();
        for name in ["a.jpg", "b.jpg", "drone/c.TIFF", "skip.txt"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let reader = StubReader {
            tags: HashMap::from([
                (
                    "a.jpg".to_string(),
                    json!({
                        "CreateDate": "2024:08:15 09:00:00",
                        "GPSLatitude": "1 deg 30' 0.00\" S",
                    }),
                ),
                ("c.TIFF".to_string(), json!({"SourceFile": "c.TIFF"})),
            ]),
        };

        let config = ExtractConfig {
            scan_directory: root.clone(),
            output_file: dir.path().join("report.csv"),
            exiftool_path: "exiftool".to_string(),
            allowed_extensions: ["jpg", "tiff"].iter().map(|s| s.to_string()).collect(),
        };

        let summary = run_extraction(&config, &reader).unwrap();
        assert_eq!(summary, RunSummary { processed: 2, failed: 1 });

        let csv = fs::read_to_string(&config.output_file).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Image Path,Image Name,DateTimeOriginal,Latitude");
        assert_eq!(
            lines[1],
            format!("{},a.jpg,2024:08:15 09:00:00,-1.5", root.join("a.jpg").display())
        );
        assert_eq!(
            lines[2],
            format!("{},c.TIFF,,", root.join("drone/c.TIFF").display())
        );
        assert_eq!(lines.len(), 3);
    }
}
