mod config;
mod error;
mod extractor;
mod gps;
mod metadata;
mod reader;
mod resize;
mod table;
mod walker;

use crate::config::AppConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photo-batch", about = "Batch photo resizing and EXIF export")]
struct Cli {
    /// Extra configuration file layered over config/default and config/local
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resize every image in a directory so its longer side fits
    Resize {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        max_size: Option<u32>,
    },
    /// Export capture time and GPS position of every image under a directory to CSV
    Extract {
        #[arg(short, long)]
        dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    match cli.command {
        Commands::Resize {
            input,
            output,
            max_size,
        } => {
            let resize_config = &mut config.resize;
            if let Some(input) = input {
                resize_config.input_directory = input;
            }
            if let Some(output) = output {
                resize_config.output_directory = output;
            }
            if let Some(max_size) = max_size {
                resize_config.max_dimension = max_size;
            }

            info!(
                "Resizing images in {:?} into {:?} (max {}px)",
                resize_config.input_directory,
                resize_config.output_directory,
                resize_config.max_dimension
            );
            let summary = resize::run_resize(resize_config)?;
            info!(
                "All images processed: {} resized, {} failed.",
                summary.processed, summary.failed
            );
        }
        Commands::Extract { dir, output } => {
            if let Some(dir) = dir {
                config.extract.scan_directory = dir;
            }
            if let Some(output) = output {
                config.extract.output_file = output;
            }

            let reader = reader::reader_for(&config)?;
            let summary = extractor::run_extraction(&config.extract, reader.as_ref())?;
            info!(
                "Metadata for {} image(s) in {:?} has been saved to {:?} ({} skipped).",
                summary.processed,
                config.extract.scan_directory,
                config.extract.output_file,
                summary.failed
            );
        }
    }

    Ok(())
}
