//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core plateblur
//! types, and the conversion of pipeline failures into thrown JS objects.

use plateblur_core::{AnonymizeError, AnonymizerConfig, PixelBuffer};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// A decoded RGB buffer exposed to JavaScript.
///
/// `prepare_image` returns one of these so a JS detector can run on exactly
/// the buffer the pipeline will anonymize.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. `pixels()` copies it into a
/// JavaScript `Uint8Array`.
#[wasm_bindgen]
pub struct JsPixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsPixelBuffer {
    /// Create a buffer from dimensions and packed RGB data (3 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsPixelBuffer {
        JsPixelBuffer {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3).
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array (a copy).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsPixelBuffer {
    pub(crate) fn from_buffer(buffer: PixelBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            pixels: buffer.pixels,
        }
    }
}

/// Body of every error thrown across the JS boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct JsErrorBody {
    pub error: String,
    pub status: u16,
}

impl JsErrorBody {
    pub(crate) fn new(error: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            status,
        }
    }

    pub(crate) fn into_js(self) -> JsValue {
        serde_wasm_bindgen::to_value(&self).unwrap_or_else(|_| JsValue::from_str(&self.error))
    }
}

impl From<&AnonymizeError> for JsErrorBody {
    fn from(err: &AnonymizeError) -> Self {
        Self::new(err.public_message(), err.status_code())
    }
}

/// Log the detailed cause and build the `{error, status}` object to throw.
pub(crate) fn js_error(err: &AnonymizeError) -> JsValue {
    tracing::warn!(status = err.status_code(), "anonymization failed: {err}");
    JsErrorBody::from(err).into_js()
}

/// Parse an optional config object; `undefined` and `null` mean defaults.
pub(crate) fn config_from_js(value: JsValue) -> Result<AnonymizerConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(AnonymizerConfig::default());
    }
    let config: AnonymizerConfig = serde_wasm_bindgen::from_value(value).map_err(|e| {
        JsErrorBody::new(format!("Invalid configuration: {e}"), 400).into_js()
    })?;
    config
        .validate()
        .map_err(|e| JsErrorBody::new(format!("Invalid configuration: {e}"), 400).into_js())?;
    Ok(config)
}
