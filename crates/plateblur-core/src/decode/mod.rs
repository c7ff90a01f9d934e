//! Image decoding and resampling.
//!
//! This module provides functionality for:
//! - Decoding uploaded images of any enabled format into a canonical RGB buffer
//! - Correcting EXIF orientation before anything produces coordinates
//! - Falling back to explicit per-format decoders when header sniffing fails
//! - Area-averaging and nearest-neighbor resampling
//! - Capping the image size before detection
//!
//! # Examples
//!
//! ```ignore
//! use plateblur_core::decode::{cap_for_detection, decode_image};
//!
//! let bytes = std::fs::read("car.jpg").unwrap();
//! let image = cap_for_detection(decode_image(&bytes).unwrap(), 2000, 1600).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod load;
mod resize;
mod types;

#[cfg(test)]
pub(crate) use load::test_support;
pub use load::{decode_image, decode_image_with_limits};
pub use resize::{cap_for_detection, resize, resize_to_fit};
pub use types::{DecodeError, FilterType, Orientation, PixelBuffer};
