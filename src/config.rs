use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// "exiftool" or "native"
    pub metadata_backend: String,
    pub resize: ResizeConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResizeConfig {
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub allowed_extensions: HashSet<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    pub scan_directory: PathBuf,
    pub output_file: PathBuf,
    pub exiftool_path: String,
    pub allowed_extensions: HashSet<String>,
}

impl AppConfig {
    /// Layers built-in defaults, the optional `config/` files, an explicit
    /// file and `PHOTO_BATCH_*` environment variables, in that order.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("metadata_backend", "exiftool")?
            .set_default("resize.input_directory", "./Fotos/Termicas")?
            .set_default("resize.output_directory", "./Fotos/Termicas Reporte")?
            .set_default("resize.max_dimension", 800)?
            .set_default("resize.jpeg_quality", 85)?
            .set_default("resize.allowed_extensions", vec!["jpg", "jpeg", "png"])?
            .set_default("extract.scan_directory", "20240815")?
            .set_default("extract.output_file", "15 Agosto.csv")?
            .set_default("extract.exiftool_path", "exiftool")?
            .set_default(
                "extract.allowed_extensions",
                vec!["png", "jpg", "jpeg", "tiff", "bmp", "gif"],
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            .add_source(
                Environment::with_prefix("PHOTO_BATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
