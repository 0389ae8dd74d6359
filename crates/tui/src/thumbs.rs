//! Card thumbnails: every panorama under `images/<dir>/` gets a small JPEG
//! at `images/<dir>/thumbs/<stem>.jpg`.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

const MAX_WIDTH: u32 = 640;
const MAX_HEIGHT: u32 = 360;
const JPEG_QUALITY: u8 = 75;
const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const EXCLUDED_DIRS: &[&str] = &["minimap", "thumbs"];
const THUMBS_DIR: &str = "thumbs";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThumbReport {
    pub processed: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for ThumbReport {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.skipped += other.skipped;
    }
}

/// Generate thumbnails for every image directory under `images_dir`.
pub fn generate_all(images_dir: &Path) -> Result<ThumbReport> {
    anyhow::ensure!(
        images_dir.is_dir(),
        "images directory not found: {}",
        images_dir.display()
    );
    let mut report = ThumbReport::default();
    for dir in sorted_entries(images_dir)? {
        if !dir.is_dir() || is_excluded(&dir) {
            continue;
        }
        tracing::info!(dir = %dir.display(), "processing directory");
        report += process_directory(&dir)?;
    }
    tracing::info!(
        processed = report.processed,
        skipped = report.skipped,
        "thumbnail generation finished"
    );
    Ok(report)
}

fn is_excluded(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|name| name.starts_with('.') || EXCLUDED_DIRS.contains(&name))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Thumbnail path of one source image.
pub fn thumb_path(src: &Path) -> Option<PathBuf> {
    let stem = src.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".jpg");
    Some(src.parent()?.join(THUMBS_DIR).join(name))
}

pub fn process_directory(dir: &Path) -> Result<ThumbReport> {
    let mut report = ThumbReport::default();
    for src in sorted_entries(dir)? {
        if src.is_dir() || !is_supported(&src) {
            continue;
        }
        let Some(dst) = thumb_path(&src) else {
            continue;
        };
        if !should_process(&src, &dst)? {
            report.skipped += 1;
            continue;
        }
        resize_image(&src, &dst)?;
        tracing::info!(thumb = %dst.display(), "created thumbnail");
        report.processed += 1;
    }
    Ok(report)
}

/// A thumbnail is stale when missing or older than its source.
fn should_process(src: &Path, dst: &Path) -> Result<bool> {
    if !dst.exists() {
        return Ok(true);
    }
    let src_time = fs::metadata(src)?.modified()?;
    let dst_time = fs::metadata(dst)?.modified()?;
    Ok(src_time > dst_time)
}

/// Fit within `MAX_WIDTH`×`MAX_HEIGHT` (never upscaling) and save as JPEG.
fn resize_image(src: &Path, dst: &Path) -> Result<()> {
    let img = image::open(src).with_context(|| format!("failed to decode {}", src.display()))?;
    let (width, height) = (img.width(), img.height());
    let scale = (f64::from(MAX_WIDTH) / f64::from(width))
        .min(f64::from(MAX_HEIGHT) / f64::from(height))
        .min(1.0);
    let img = if scale < 1.0 {
        let w = ((f64::from(width) * scale) as u32).max(1);
        let h = ((f64::from(height) * scale) as u32).max(1);
        img.resize_exact(w, h, FilterType::Lanczos3)
    } else {
        img
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .with_context(|| format!("failed to encode {}", dst.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_png(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        RgbImage::new(width, height).save(path).expect("save png");
    }

    #[test]
    fn thumbnails_fit_and_never_upscale() {
        let root = tempfile::tempdir().expect("tempdir");
        let images = root.path().join("images");
        write_png(&images.join("part2/wide.png"), 1280, 720);
        write_png(&images.join("part2/small.png"), 100, 50);
        fs::write(images.join("part2/notes.txt"), "not an image").expect("write");

        let report = generate_all(&images).expect("generate");
        assert_eq!(report, ThumbReport { processed: 2, skipped: 0 });
        assert_eq!(
            image::image_dimensions(images.join("part2/thumbs/wide.jpg")).expect("dims"),
            (640, 360)
        );
        assert_eq!(
            image::image_dimensions(images.join("part2/thumbs/small.jpg")).expect("dims"),
            (100, 50)
        );
    }

    #[test]
    fn up_to_date_thumbnails_are_skipped() {
        let root = tempfile::tempdir().expect("tempdir");
        let images = root.path().join("images");
        write_png(&images.join("part1/a.png"), 64, 64);

        assert_eq!(generate_all(&images).expect("first").processed, 1);
        let again = generate_all(&images).expect("second");
        assert_eq!(again, ThumbReport { processed: 0, skipped: 1 });
    }

    #[test]
    fn excluded_directories_are_left_alone() {
        let root = tempfile::tempdir().expect("tempdir");
        let images = root.path().join("images");
        write_png(&images.join("minimap/kaede.png"), 64, 64);
        write_png(&images.join(".cache/x.png"), 64, 64);

        assert_eq!(generate_all(&images).expect("generate"), ThumbReport::default());
        assert!(!images.join("minimap/thumbs").exists());
    }

    #[test]
    fn missing_images_dir_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        assert!(generate_all(&root.path().join("nope")).is_err());
    }

    #[test]
    fn thumb_path_swaps_extension() {
        assert_eq!(
            thumb_path(Path::new("images/part2/gate.webp")),
            Some(PathBuf::from("images/part2/thumbs/gate.jpg"))
        );
    }
}
