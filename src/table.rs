use crate::error::AppError;
use crate::metadata::ImageRecord;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column order of the output table. Only columns that at least one record
/// carries are written, even when every cell in them is blank.
const COLUMNS: [&str; 5] = [
    "Image Path",
    "Image Name",
    "DateTimeOriginal",
    "Latitude",
    "Longitude",
];

pub fn write_records(path: &Path, records: &[ImageRecord]) -> Result<(), AppError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_records_to(&mut writer, records)?;
    writer.flush()?;
    log::debug!("Wrote {} row(s) to {:?}", records.len(), path);
    Ok(())
}

pub fn write_records_to<W: Write>(writer: &mut W, records: &[ImageRecord]) -> Result<(), AppError> {
    let rows = records
        .iter()
        .map(|record| match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::InvalidMetadata {
                path: record.path.clone().into(),
                reason: format!("record serialized as {}", other),
            }),
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let header: Vec<&str> = COLUMNS
        .iter()
        .copied()
        .filter(|column| rows.iter().any(|row| row.contains_key(*column)))
        .collect();
    if header.is_empty() {
        return Ok(());
    }

    let line: Vec<String> = header.iter().map(|column| escape_field(column)).collect();
    writeln!(writer, "{}", line.join(","))?;

    for row in &rows {
        let line: Vec<String> = header
            .iter()
            .map(|column| match row.get(*column) {
                Some(Value::String(s)) => escape_field(s),
                Some(Value::Null) | None => String::new(),
                Some(other) => escape_field(&other.to_string()),
            })
            .collect();
        writeln!(writer, "{}", line.join(","))?;
    }

    Ok(())
}

fn escape_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
