//! Photo preparation for transport.
//!
//! Rendered images arrive as whatever the image service produced (PNG,
//! WebP, large dimensions). Before upload they are normalised: decoded,
//! converted to RGB, resized to fit the transport bound and re-encoded as
//! JPEG at a fixed quality. Pure bytes-to-bytes, no side effects.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Longest allowed side of an uploaded photo, in pixels.
pub const PHOTO_MAX_SIZE: u32 = 1280;

/// JPEG quality used for the re-encode.
pub const PHOTO_JPEG_QUALITY: u8 = 88;

/// Failure to prepare an image for transport.
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// The input bytes do not decode as a supported image format.
    #[error("image decode failed: {0}")]
    Decode(image::ImageError),

    /// Re-encoding the normalised image failed.
    #[error("image encode failed: {0}")]
    Encode(image::ImageError),
}

/// Normalise raw image bytes into a transport-ready JPEG.
///
/// Deterministic: the same input always produces the same output.
pub fn prepare_photo(bytes: &[u8]) -> Result<Vec<u8>, PhotoError> {
    let decoded = image::load_from_memory(bytes).map_err(PhotoError::Decode)?;
    let mut rgb = decoded.to_rgb8();

    let (width, height) = rgb.dimensions();
    let longest = width.max(height);
    if longest > PHOTO_MAX_SIZE {
        let ratio = PHOTO_MAX_SIZE as f64 / longest as f64;
        let new_width = ((width as f64 * ratio) as u32).max(1);
        let new_height = ((height as f64 * ratio) as u32).max(1);
        rgb = image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, PHOTO_JPEG_QUALITY);
    rgb.write_with_encoder(encoder).map_err(PhotoError::Encode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut out = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut out)).unwrap();
        out
    }

    #[test]
    fn oversized_image_is_scaled_to_fit() {
        let prepared = prepare_photo(&png_bytes(2000, 1000)).unwrap();
        let reloaded = image::load_from_memory(&prepared).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (1280, 640));
    }

    #[test]
    fn small_image_keeps_its_dimensions() {
        let prepared = prepare_photo(&png_bytes(640, 480)).unwrap();
        let reloaded = image::load_from_memory(&prepared).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (640, 480));
    }

    #[test]
    fn output_is_jpeg() {
        let prepared = prepare_photo(&png_bytes(10, 10)).unwrap();
        assert_eq!(
            image::guess_format(&prepared).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            prepare_photo(&[0, 1, 2, 3, 4]),
            Err(PhotoError::Decode(_))
        ));
    }

    #[test]
    fn preparation_is_deterministic() {
        let input = png_bytes(100, 100);
        assert_eq!(prepare_photo(&input).unwrap(), prepare_photo(&input).unwrap());
    }
}
