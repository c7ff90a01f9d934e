//! Response encoding.
//!
//! This module provides functionality for:
//! - Encoding the anonymized buffer to JPEG with configurable quality
//! - Wrapping the JPEG as base64 text for transport
//!
//! # Examples
//!
//! ```ignore
//! use plateblur_core::decode::PixelBuffer;
//! use plateblur_core::encode::encode_response;
//!
//! let image = PixelBuffer::filled(100, 100, [128, 128, 128]);
//! let response = encode_response(&image, 95).unwrap();
//! println!("{} base64 characters", response.image_base64.len());
//! ```

mod jpeg;
mod payload;

pub use jpeg::{encode_buffer, EncodeError};
pub use payload::{encode_response, AnonymizeResponse, ErrorResponse};
