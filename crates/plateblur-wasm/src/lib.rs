//! Plateblur WASM - WebAssembly bindings for plateblur
//!
//! This crate exposes the plateblur-core anonymization pipeline to
//! JavaScript/TypeScript. Plate detection stays on the JS side: either pass a
//! detector callback to `anonymize`, or run the model on the buffer returned
//! by `prepare_image` and hand the boxes to `anonymize_with_detections`.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types and thrown error objects
//! - `detector` - `PlateDetector` implementation over a JS function
//! - `anonymize` - Pipeline bindings
//!
//! # Usage
//!
//! ```typescript
//! import init, { anonymize } from '@plateblur/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! try {
//!   const { image_base64 } = anonymize(bytes, (pixels, width, height) => detect(pixels, width, height));
//! } catch ({ error, status }) {
//!   console.error(status, error);
//! }
//! ```

use wasm_bindgen::prelude::*;

mod anonymize;
mod detector;
mod types;

pub use anonymize::{anonymize, anonymize_with_detections, prepare_image, refine_regions};
pub use types::JsPixelBuffer;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "plateblur wasm loaded");
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
