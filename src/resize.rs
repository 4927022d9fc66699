use crate::config::ResizeConfig;
use crate::error::AppError;
use crate::metadata::RunSummary;
use crate::walker;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat, ImageOutputFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResizeJob {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub max_dimension: u32,
}

impl ResizeJob {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        max_dimension: u32,
    ) -> Result<Self, AppError> {
        if max_dimension == 0 {
            return Err(AppError::InvalidConfig(
                "max_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            source: source.into(),
            destination: destination.into(),
            max_dimension,
        })
    }
}

/// Scales `width`x`height` so the longer side becomes `max_dimension`,
/// keeping the aspect ratio. Smaller images are scaled up.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let max = max_dimension as f64;

    if w >= h {
        (max_dimension, ((h * max / w).floor() as u32).max(1))
    } else {
        (((w * max / h).floor() as u32).max(1), max_dimension)
    }
}

/// Drops the alpha channel, keeping the sample depth.
pub fn flatten_alpha(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgba16 | ColorType::La16 => DynamicImage::ImageRgb16(img.to_rgb16()),
        ColorType::Rgba32F => DynamicImage::ImageRgb32F(img.to_rgb32f()),
        color if color.has_alpha() => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    }
}

pub fn resize_image(job: &ResizeJob, jpeg_quality: u8) -> Result<(u32, u32), AppError> {
    let img = image::open(&job.source)?;
    let (width, height) = scaled_dimensions(img.width(), img.height(), job.max_dimension);
    log::debug!(
        "Resizing {:?} from {}x{} to {}x{}",
        job.source,
        img.width(),
        img.height(),
        width,
        height
    );

    let resized = flatten_alpha(img.resize_exact(width, height, FilterType::Lanczos3));
    save_optimized(&resized, &job.destination, jpeg_quality)?;
    Ok((width, height))
}

fn save_optimized(img: &DynamicImage, path: &Path, jpeg_quality: u8) -> Result<(), AppError> {
    let format = ImageFormat::from_path(path)?;
    match format {
        ImageFormat::Jpeg => {
            // JPEG only carries 8-bit gray or RGB.
            let img = match img.color() {
                ColorType::L8 | ColorType::Rgb8 => img.clone(),
                ColorType::L16 => DynamicImage::ImageLuma8(img.to_luma8()),
                _ => DynamicImage::ImageRgb8(img.to_rgb8()),
            };
            let mut writer = BufWriter::new(File::create(path)?);
            img.write_to(&mut writer, ImageOutputFormat::Jpeg(jpeg_quality))?;
            writer.flush()?;
        }
        ImageFormat::Png => {
            let img = match img.color() {
                ColorType::Rgb32F => DynamicImage::ImageRgb8(img.to_rgb8()),
                _ => img.clone(),
            };
            let mut writer = BufWriter::new(File::create(path)?);
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                CompressionType::Best,
                PngFilterType::Adaptive,
            );
            encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
            writer.flush()?;
        }
        other => img.save_with_format(path, other)?,
    }
    Ok(())
}

/// Resizes every image directly inside the input directory into the output
/// directory. Failures are logged per file and do not stop the run.
pub fn run_resize(config: &ResizeConfig) -> Result<RunSummary, AppError> {
    if config.max_dimension == 0 {
        return Err(AppError::InvalidConfig(
            "resize.max_dimension must be greater than zero".to_string(),
        ));
    }
    if !(1..=100).contains(&config.jpeg_quality) {
        return Err(AppError::InvalidConfig(format!(
            "resize.jpeg_quality must be within 1..=100, got {}",
            config.jpeg_quality
        )));
    }

    std::fs::create_dir_all(&config.output_directory)?;
    let sources = walker::list_images(&config.input_directory, &config.allowed_extensions)?;

    let mut summary = RunSummary::default();
    for source in sources {
        let result = source
            .file_name()
            .ok_or_else(|| AppError::InvalidConfig(format!("{:?} has no file name", source)))
            .and_then(|name| {
                ResizeJob::new(&source, config.output_directory.join(name), config.max_dimension)
            })
            .and_then(|job| resize_image(&job, config.jpeg_quality));

        match result {
            Ok((width, height)) => {
                log::info!("Processed {:?} successfully ({}x{})", source, width, height);
                summary.processed += 1;
            }
            Err(e) => {
                log::warn!("Failed to process {:?}: {}", source, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    fn config(input: &Path, output: &Path, max_dimension: u32) -> ResizeConfig {
        ResizeConfig {
            input_directory: input.to_path_buf(),
            output_directory: output.to_path_buf(),
            max_dimension,
            jpeg_quality: 85,
            allowed_extensions: ["jpg", "jpeg", "png"]
                .iter()
                .map(|s| s.to_string())
                .collect::<HashSet<_>>(),
        }
    }

    #[test]
    fn test_scaled_dimensions_preserve_aspect() {
        assert_eq!(scaled_dimensions(4000, 3000, 800), (800, 600));
        assert_eq!(scaled_dimensions(3000, 4000, 800), (600, 800));
        assert_eq!(scaled_dimensions(1000, 1000, 800), (800, 800));
        assert_eq!(scaled_dimensions(1001, 333, 800), (800, 266));
        assert_eq!(scaled_dimensions(10000, 1, 800), (800, 1));
    }

    #[test]
    fn test_small_images_are_scaled_up() {
        assert_eq!(scaled_dimensions(200, 100, 800), (800, 400));
    }

    #[test]
    fn test_zero_max_dimension_is_rejected() {
        assert!(matches!(ResizeJob::new("a.jpg", "b.jpg", 0), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_flatten_alpha_keeps_sample_depth() {
        let deep = DynamicImage::ImageRgba16(image::ImageBuffer::new(2, 2));
        assert_eq!(flatten_alpha(deep).color(), ColorType::Rgb16);

        let plain = DynamicImage::ImageLumaA8(image::ImageBuffer::new(2, 2));
        assert_eq!(flatten_alpha(plain).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_resize_landscape_jpeg() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("wide.jpg");
        let destination = dir.path().join("out.jpg");
        gradient(400, 300).save(&source).unwrap();

        let job = ResizeJob::new(&source, &destination, 100).unwrap();
        assert_eq!(resize_image(&job, 85).unwrap(), (100, 75));

        let (width, height) = image::image_dimensions(&destination).unwrap();
        assert_eq!(width, 100);
        assert!(((width as f64 / height as f64) - 400.0 / 300.0).abs() < 0.02);
    }

    #[test]
    fn test_alpha_channel_is_flattened() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("overlay.png");
        let destination = dir.path().join("overlay_small.png");
        RgbaImage::from_pixel(64, 32, Rgba([10, 20, 30, 100])).save(&source).unwrap();

        let job = ResizeJob::new(&source, &destination, 16).unwrap();
        resize_image(&job, 85).unwrap();

        let output = image::open(&destination).unwrap();
        assert!(!output.color().has_alpha());
        assert_eq!((output.width(), output.height()), (16, 8));
    }

    #[test]
    fn test_run_continues_past_broken_files() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let output_dir = output.path().join("report");

        gradient(50, 100).save(input.path().join("tall.png")).unwrap();
        gradient(30, 30).save(input.path().join("small.JPG")).unwrap();
        std::fs::write(input.path().join("broken.jpg"), b"not an image").unwrap();
        std::fs::write(input.path().join("notes.txt"), b"ignored").unwrap();

        let summary = run_resize(&config(input.path(), &output_dir, 40)).unwrap();
        assert_eq!(summary, RunSummary { processed: 2, failed: 1 });

        assert_eq!(image::image_dimensions(output_dir.join("tall.png")).unwrap(), (20, 40));
        assert_eq!(image::image_dimensions(output_dir.join("small.JPG")).unwrap(), (40, 40));
        assert!(!output_dir.join("notes.txt").exists());
    }

    #[test]
    fn test_run_rejects_zero_max_dimension() {
        let dir = tempdir().unwrap();
        let result = run_resize(&config(dir.path(), dir.path(), 0));
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }
}
