//! Image decoding with EXIF orientation handling and a fallback decode path.

use std::io::{BufRead, Cursor, Seek};

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader, Limits};

use super::{DecodeError, Orientation, PixelBuffer};

/// Decoders tried one by one when the format cannot be sniffed from the header.
///
/// TGA comes last: it has no magic bytes, so it is only reachable here.
const FALLBACK_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Gif,
    ImageFormat::Tiff,
    ImageFormat::Tga,
];

/// Decode an uploaded image into an orientation-corrected RGB buffer.
///
/// Decoder allocation is unbounded; see [`decode_image_with_limits`].
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedFormat` if neither the sniffed decoder
/// nor any fallback decoder accepts the bytes (this includes an empty payload).
/// Returns `DecodeError::InvalidImage` if the image decodes to zero area.
/// Returns `DecodeError::LimitExceeded` if a configured allocation limit is hit.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    decode_image_with_limits(bytes, None)
}

/// Decode an uploaded image, bounding decoder allocations to `max_alloc` bytes.
///
/// `None` disables the limit so very large photos still decode.
pub fn decode_image_with_limits(
    bytes: &[u8],
    max_alloc: Option<u64>,
) -> Result<PixelBuffer, DecodeError> {
    let img = match decode_primary(bytes, max_alloc) {
        Ok(img) => img,
        // The format was recognized; only the configured budget said no
        Err(image::ImageError::Limits(err)) => {
            return Err(DecodeError::LimitExceeded(err.to_string()));
        }
        Err(err) => {
            tracing::debug!("primary decode failed ({err}), trying fallback decoders");
            decode_fallback(bytes, max_alloc).ok_or(DecodeError::UnsupportedFormat)?
        }
    };

    let orientation = extract_orientation(bytes);
    let oriented = apply_orientation(img, orientation);

    // Gray, alpha, 16-bit and float images all collapse to RGB8 here
    let buffer = PixelBuffer::from_rgb_image(oriented.into_rgb8());
    if !buffer.is_valid() {
        return Err(DecodeError::InvalidImage(format!(
            "decoded to {}x{}",
            buffer.width, buffer.height
        )));
    }

    tracing::debug!(
        width = buffer.width,
        height = buffer.height,
        ?orientation,
        "decoded image"
    );
    Ok(buffer)
}

/// Decode with the format guessed from the leading bytes.
fn decode_primary(bytes: &[u8], max_alloc: Option<u64>) -> Result<DynamicImage, image::ImageError> {
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    configure_limits(&mut reader, max_alloc);
    reader.decode()
}

/// Try every enabled decoder explicitly, ignoring header sniffing.
fn decode_fallback(bytes: &[u8], max_alloc: Option<u64>) -> Option<DynamicImage> {
    if bytes.is_empty() {
        return None;
    }

    FALLBACK_FORMATS.iter().find_map(|&format| {
        let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
        configure_limits(&mut reader, max_alloc);
        match reader.decode() {
            Ok(img) => {
                tracing::debug!(?format, "fallback decoder accepted payload");
                Some(img)
            }
            Err(_) => None,
        }
    })
}

fn configure_limits<R: BufRead + Seek>(reader: &mut ImageReader<R>, max_alloc: Option<u64>) {
    match max_alloc {
        Some(bytes) => {
            let mut limits = Limits::default();
            limits.max_alloc = Some(bytes);
            reader.limits(limits);
        }
        None => reader.no_limits(),
    }
}

/// Extract EXIF orientation from any container kamadak-exif understands.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::Rotate180 => img.rotate180(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
