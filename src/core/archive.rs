use image::{DynamicImage, ImageOutputFormat};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::PixelError;

/// File name used for bulk downloads
pub const ARCHIVE_FILE_NAME: &str = "pixelgenius_images.zip";

/// Encode a bitmap as PNG
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PixelError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Archive entry name for the 1-based position `n`
pub fn entry_name(n: usize) -> String {
    format!("image_{}.png", n)
}

/// Pack images into an in-memory zip, one `image_<n>.png` entry per image
pub fn archive_png<'a, I>(images: I) -> Result<Vec<u8>, PixelError>
where
    I: IntoIterator<Item = &'a DynamicImage>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    // PNG is already compressed
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    let mut count = 0usize;
    for (idx, image) in images.into_iter().enumerate() {
        let png = encode_png(image)?;
        writer.start_file(entry_name(idx + 1), options)?;
        writer.write_all(&png)?;
        count += 1;
    }

    let cursor = writer.finish()?;
    tracing::debug!("Packed {} image(s) into archive", count);
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Read;
    use zip::ZipArchive;

    fn sample(seed: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(6, 4, |x, y| {
            Rgb([seed.wrapping_add(x as u8), seed.wrapping_mul(y as u8), 17])
        }))
    }

    #[test]
    fn test_archive_reopens_with_numbered_entries() {
        let images = vec![
            sample(1),
            sample(50),
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([9, 8, 7, 128]))),
        ];

        let bytes = archive_png(&images).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), images.len());

        for (idx, original) in images.iter().enumerate() {
            let mut entry = archive.by_index(idx).unwrap();
            assert_eq!(entry.name(), format!("image_{}.png", idx + 1));

            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            let decoded = image::load_from_memory(&data).unwrap();
            assert_eq!(&decoded, original);
        }
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = archive_png(std::iter::empty::<&DynamicImage>()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_encode_png_has_png_signature() {
        let png = encode_png(&sample(3)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
