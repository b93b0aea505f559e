//! PNG encoding for tightly packed RGB8 frame buffers.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::fs;
use std::path::Path;

use crate::error::{OffscreenError, Result};

/// Number of channels in RGB8 format.
const RGB8_CHANNELS: usize = 3;

/// Write an RGB8 buffer as PNG with default compression and adaptive filtering.
pub fn write_png_rgb8(path: &Path, data: &[u8], width: u32, height: u32) -> Result<()> {
    let expected = expected_buffer_size(width, height)?;
    if data.len() != expected {
        return Err(OffscreenError::BufferSize {
            expected,
            actual: data.len(),
        });
    }

    // Encoded in memory; the file is only created once encoding succeeded.
    let mut png = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut png, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(data, width, height, ExtendedColorType::Rgb8)?;

    fs::write(path, &png).map_err(|source| OffscreenError::Create {
        path: path.to_path_buf(),
        source,
    })
}

/// Compute expected buffer size with overflow checking.
fn expected_buffer_size(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(RGB8_CHANNELS))
        .ok_or(OffscreenError::Dimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_readable_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        let data = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 10, 20, 30];
        write_png_rgb8(&path, &data, 2, 2).unwrap();

        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 1).0, [10, 20, 30]);
    }

    #[test]
    fn failed_encode_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        assert!(write_png_rgb8(&path, &[], 0, 0).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_png_rgb8(&dir.path().join("bad.png"), &[0u8; 5], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            OffscreenError::BufferSize {
                expected: 12,
                actual: 5
            }
        ));
    }
}
