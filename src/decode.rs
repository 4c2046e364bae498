//! Base64 frame decoding.
//!
//! Frames arrive as base64 text, optionally carrying a data-URL header
//! (`data:image/jpeg;base64,...`). Decoded frames are always RGB8 and never
//! larger than the configured maximum dimension.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use image::imageops::FilterType;
use image::RgbImage;
use thiserror::Error;

/// Standard alphabet, tolerant of missing padding and non-canonical
/// trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Frame could not be turned into an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Strip an optional data-URL header, returning the base64 payload.
pub fn strip_data_url(input: &str) -> &str {
    match input.split(',').nth(1) {
        Some(payload) => payload,
        None => input,
    }
}

/// Decode base64 text, skipping any character outside the standard alphabet.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = payload
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    LENIENT.decode(cleaned.trim_end_matches('=').as_bytes())
}

/// Decode a base64 frame into an RGB image bounded by `max_dimension`.
pub fn decode_base64_image(input: &str, max_dimension: u32) -> Result<RgbImage, DecodeError> {
    let bytes = decode_payload(strip_data_url(input))?;
    let image = image::load_from_memory(&bytes)?.into_rgb8();
    Ok(bound_dimensions(image, max_dimension))
}

/// Downscale so the longer side is at most `max_dimension`, keeping aspect.
pub fn bound_dimensions(image: RgbImage, max_dimension: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest <= max_dimension || max_dimension == 0 {
        return image;
    }
    let ratio = max_dimension as f64 / longest as f64;
    let new_width = ((width as f64 * ratio) as u32).max(1);
    let new_height = ((height as f64 * ratio) as u32).max(1);
    image::imageops::resize(&image, new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn encode_png(image: &RgbImage) -> String {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(buf)
    }

    #[test]
    fn data_url_prefix_is_optional() {
        let image = RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 7]));
        let plain = encode_png(&image);
        let prefixed = format!("data:image/png;base64,{plain}");

        let a = decode_base64_image(&plain, 1280).unwrap();
        let b = decode_base64_image(&prefixed, 1280).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, image);
    }

    #[test]
    fn large_frames_are_downscaled_preserving_aspect() {
        let image = RgbImage::new(2000, 1000);
        let decoded = decode_base64_image(&encode_png(&image), 1280).unwrap();
        assert_eq!(decoded.dimensions(), (1280, 640));
    }

    #[test]
    fn frames_within_bound_keep_their_size() {
        let image = RgbImage::new(640, 480);
        let decoded = decode_base64_image(&encode_png(&image), 1280).unwrap();
        assert_eq!(decoded.dimensions(), (640, 480));
    }

    #[test]
    fn grayscale_input_is_converted_to_rgb() {
        let gray = image::GrayImage::from_pixel(3, 3, image::Luma([200]));
        let mut buf = Vec::new();
        gray.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let decoded = decode_base64_image(&STANDARD.encode(buf), 1280).unwrap();
        assert_eq!(decoded.get_pixel(1, 1), &Rgb([200, 200, 200]));
    }

    #[test]
    fn payload_skips_characters_outside_the_alphabet() {
        assert_eq!(decode_payload("aGVs\nbG8*gd29y\r\nbGQ=").unwrap(), b"hello world");
    }

    #[test]
    fn payload_accepts_non_canonical_trailing_bits() {
        // "QR==" carries stray low bits after the single byte 'A'.
        assert_eq!(decode_payload("QR==").unwrap(), b"A");
        assert_eq!(decode_payload("QQ").unwrap(), b"A");
    }

    #[test]
    fn noisy_payload_still_decodes_to_the_frame() {
        let image = RgbImage::from_fn(5, 5, |x, y| Rgb([x as u8, y as u8, 9]));
        let plain = encode_png(&image);
        let noisy: String = plain
            .as_bytes()
            .chunks(16)
            .map(|c| format!("{}\n", std::str::from_utf8(c).unwrap()))
            .collect();
        assert_eq!(decode_base64_image(&noisy, 1280).unwrap(), image);
    }

    #[test]
    fn malformed_base64_is_rejected() {
        // A single leftover symbol cannot encode a byte.
        let err = decode_base64_image("Q", 1280).unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
        assert!(err.to_string().starts_with("Invalid image data"));

        let err = decode_base64_image("not base64 at all!!", 1280).unwrap_err();
        assert!(err.to_string().starts_with("Invalid image data"));
    }

    #[test]
    fn non_image_bytes_are_rejected() {
        let err = decode_base64_image(&STANDARD.encode(b"hello world"), 1280).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
        assert!(err.to_string().starts_with("Invalid image data"));
    }
}
