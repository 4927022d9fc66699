use exif::Error as ExifError;
use serde_json::Error as SerdeJsonError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXIF error: {0}")]
    Exif(#[from] ExifError),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("Metadata tool failed for {path:?} ({status}): {stderr}")]
    MetadataTool {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("No metadata found for {0:?}")]
    EmptyMetadata(PathBuf),

    #[error("Invalid metadata for {path:?}: {reason}")]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error("GPS coordinate format is unexpected: {0}")]
    GpsFormat(String),
}
