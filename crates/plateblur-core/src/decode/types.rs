//! Core types for image decoding.

use fast_image_resize::{FilterType as FirFilterType, ResizeAlg};
use thiserror::Error;

/// Error types for image decoding and resampling.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No decode path could interpret the bytes as an image.
    #[error("Unsupported or corrupted image format")]
    UnsupportedFormat,

    /// The bytes decoded, but to a degenerate image (zero area, bad storage).
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A resize was requested with a zero target dimension.
    #[error("Invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The image is valid but needs more memory than the configured decode limit.
    #[error("Image exceeds decode limits: {0}")]
    LimitExceeded(String),

    /// The resampler rejected the buffers it was given.
    #[error("Resampling failed: {0}")]
    Resample(String),
}

/// Filter type for resampling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Nearest neighbor: every output pixel copies exactly one source pixel.
    Nearest,
    /// Area averaging: a box filter over each output pixel's source footprint.
    /// Exact block means on integer ratios. Suited to shrinking.
    #[default]
    Area,
}

impl FilterType {
    /// Convert to the fast_image_resize algorithm.
    pub fn to_resize_alg(self) -> ResizeAlg {
        match self {
            FilterType::Nearest => ResizeAlg::Nearest,
            // A box kernel scaled to the footprint averages it when shrinking
            FilterType::Area => ResizeAlg::Convolution(FirFilterType::Box),
        }
    }
}

/// EXIF orientation, restricted to the pure rotations the decoder corrects.
///
/// Mirrored orientations (2, 4, 5, 7) are treated as [`Orientation::Normal`].
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            3 => Orientation::Rotate180,
            6 => Orientation::Rotate90CW,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded image with RGB pixel data.
///
/// Each pipeline invocation owns its buffer; the pixelator mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    /// Length should be width * height * 3.
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new PixelBuffer with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a buffer filled with a single color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a PixelBuffer from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Check that the image has area and its storage matches its dimensions.
    pub fn is_valid(&self) -> bool {
        !self.is_empty() && self.pixels.len() == self.pixel_count() * 3
    }

    /// Read the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    /// Copy the `w`×`h` region whose top-left corner is `(x, y)` into a new buffer.
    ///
    /// The caller guarantees the region lies inside the image.
    pub fn copy_region(&self, x: u32, y: u32, w: u32, h: u32) -> PixelBuffer {
        let stride = self.width as usize * 3;
        let row_bytes = w as usize * 3;
        let mut out = Vec::with_capacity(row_bytes * h as usize);
        for row in y..y + h {
            let start = row as usize * stride + x as usize * 3;
            out.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        PixelBuffer::new(w, h, out)
    }

    /// Write `patch` back into this image with its top-left corner at `(x, y)`.
    ///
    /// The caller guarantees the patch fits inside the image.
    pub fn paste_region(&mut self, x: u32, y: u32, patch: &PixelBuffer) {
        let stride = self.width as usize * 3;
        let row_bytes = patch.width as usize * 3;
        for (i, src_row) in patch.pixels.chunks_exact(row_bytes).enumerate() {
            let start = (y as usize + i) * stride + x as usize * 3;
            self.pixels[start..start + row_bytes].copy_from_slice(src_row);
        }
    }
}
