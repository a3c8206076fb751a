// Helpers for the presentation side: turning uploaded bytes or raw buffers into the
// `RgbImage` the engine consumes. The engine itself never parses files.

pub mod image_helper {
    use crate::error::{InspectionError, Result};
    use image::RgbImage;

    const CHANNELS: usize = 3;

    /// Decodes an encoded image (PNG, JPEG, ...) and converts it to 8-bit RGB.
    pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
        let decoded = image::load_from_memory(bytes)?;
        let rgb = decoded.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(InspectionError::EmptyImage);
        }
        Ok(rgb)
    }

    /// Wraps a raw H×W×3 buffer, checking that its length matches the dimensions.
    pub fn rgb_from_raw(width: u32, height: u32, buffer: Vec<u8>) -> Result<RgbImage> {
        let len = buffer.len();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(CHANNELS));
        if expected != Some(len) {
            return Err(InspectionError::InvalidDimensions { width, height, len });
        }
        if len == 0 {
            return Err(InspectionError::EmptyImage);
        }
        RgbImage::from_raw(width, height, buffer)
            .ok_or(InspectionError::InvalidDimensions { width, height, len })
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use crate::error::InspectionError;
    use image::{ImageEncoder, Rgb, RgbImage};

    fn encode_png(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut bytes)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .expect("Error encoding PNG.");
        bytes
    }

    #[test]
    fn decodes_png_round_trip() {
        let original = RgbImage::from_fn(12, 7, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 99]));
        let decoded = decode_rgb(&encode_png(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let result = decode_rgb(b"definitely not an image");
        assert!(matches!(result, Err(InspectionError::Decode(_))));
    }

    #[test]
    fn raw_buffer_with_matching_length() {
        let image = rgb_from_raw(2, 2, vec![255u8; 12]).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 1), &Rgb([255, 255, 255]));
    }

    #[test]
    fn raw_buffer_with_wrong_length_is_rejected() {
        let result = rgb_from_raw(4, 4, vec![0u8; 47]);
        assert!(matches!(
            result,
            Err(InspectionError::InvalidDimensions { width: 4, height: 4, len: 47 })
        ));
    }

    #[test]
    fn raw_buffer_without_pixels_is_empty() {
        assert!(matches!(rgb_from_raw(0, 5, Vec::new()), Err(InspectionError::EmptyImage)));
    }
}
