//! Uploaded image decoding.

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("empty image upload")]
    Empty,
    #[error("undecodable image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode raw upload bytes in any supported raster format into an RGB buffer.
///
/// Alpha is dropped, grayscale is expanded, and 16-bit data is narrowed, so
/// the result is always 8-bit RGB in the order the encoder expects.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    let image = image::load_from_memory(bytes)?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded upload"
    );
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_decode_png_drops_alpha() {
        let src = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 40]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(src)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();

        let rgb = decode_rgb(buf.get_ref()).unwrap();
        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        assert!(matches!(decode_rgb(b"definitely not an image"), Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_decode_empty_is_error() {
        assert!(matches!(decode_rgb(&[]), Err(ImageError::Empty)));
    }
}
