//! JPEG encoding of the anonymized buffer.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::PixelBuffer;

/// Errors raised while producing the response JPEG.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The buffer has no pixels, or its storage does not match `width * height * 3`.
    #[error("cannot encode a {width}x{height} buffer holding {len} bytes")]
    InvalidBuffer { width: u32, height: u32, len: usize },

    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Encode a [`PixelBuffer`] to JPEG bytes.
///
/// `quality` is clamped to 1-100.
pub fn encode_buffer(image: &PixelBuffer, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if !image.is_valid() {
        return Err(EncodeError::InvalidBuffer {
            width: image.width,
            height: image.height,
            len: image.pixels.len(),
        });
    }

    let mut jpeg = Vec::with_capacity(image.byte_size() / 8);
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).write_image(
        &image.pixels,
        image.width,
        image.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(jpeg)
}
