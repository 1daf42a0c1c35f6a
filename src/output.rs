use anyhow::{Context, Result};
use chrono::Local;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::archive::{archive_png, encode_png, ARCHIVE_FILE_NAME};

/// Prefix shared by the files of one generation run
pub fn run_prefix() -> String {
    format!("pixelgenius_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Encode every image as PNG. CPU bound; run off the async workers for large batches.
pub fn encode_all<'a, I>(images: I) -> Result<Vec<Vec<u8>>>
where
    I: IntoIterator<Item = &'a DynamicImage>,
{
    images
        .into_iter()
        .map(|image| encode_png(image).context("Failed to encode image"))
        .collect()
}

/// Save each encoded PNG as `<prefix>_<n>.png`, 1-based
pub async fn save_images(pngs: &[Vec<u8>], output_dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .await
        .context("Failed to create output directory")?;

    let mut paths = Vec::new();
    for (idx, png) in pngs.iter().enumerate() {
        let path = output_dir.join(format!("{}_{}.png", prefix, idx + 1));
        fs::write(&path, png)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Saved image to: {}", path.display());
        paths.push(path);
    }

    Ok(paths)
}

/// Write all images into `pixelgenius_images.zip` in `output_dir`
pub async fn write_archive<'a, I>(images: I, output_dir: &Path) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a DynamicImage>,
{
    let bytes = archive_png(images).context("Failed to build zip archive")?;

    fs::create_dir_all(output_dir)
        .await
        .context("Failed to create output directory")?;
    let path = output_dir.join(ARCHIVE_FILE_NAME);
    if fs::metadata(&path).await.is_ok() {
        tracing::warn!("Replacing existing archive: {}", path.display());
    }
    fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Saved archive to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn images() -> Vec<DynamicImage> {
        (0..3)
            .map(|i| DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([i * 40, 10, 10]))))
            .collect()
    }

    #[tokio::test]
    async fn test_save_images_numbers_files() {
        let dir = tempfile::tempdir().unwrap();
        let images = images();

        let pngs = encode_all(&images).unwrap();
        let paths = save_images(&pngs, dir.path(), "run").await.unwrap();

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("run_1.png"));
        assert!(paths[2].ends_with("run_3.png"));
        let reloaded = image::open(&paths[1]).unwrap();
        assert_eq!(reloaded, images[1]);
    }

    #[tokio::test]
    async fn test_write_archive_creates_zip() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("downloads");

        let path = write_archive(&images(), &target).await.unwrap();

        assert!(path.ends_with(ARCHIVE_FILE_NAME));
        let bytes = std::fs::read(&path).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[tokio::test]
    async fn test_write_archive_replaces_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let all = images();

        let first = write_archive(&all, dir.path()).await.unwrap();
        let second = write_archive(&all[..1], dir.path()).await.unwrap();

        assert_eq!(first, second);
        let bytes = std::fs::read(&second).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
