//! Anonymization WASM bindings.
//!
//! # Functions
//!
//! - [`prepare_image`] - Decode and size-cap an upload, returning the detection buffer
//! - [`refine_regions`] - Turn detector boxes into anonymization rectangles
//! - [`anonymize`] - Full pipeline with a JS detector callback
//! - [`anonymize_with_detections`] - Full pipeline with precomputed boxes
//!
//! Every function takes an optional trailing config object; omitted fields
//! keep their defaults. Failures are thrown as `{error, status}` objects.
//!
//! # Example
//!
//! ```typescript
//! import { prepare_image, anonymize_with_detections } from '@plateblur/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const prepared = prepare_image(bytes);
//! const boxes = await runModel(prepared.pixels(), prepared.width, prepared.height);
//! const { image_base64 } = anonymize_with_detections(bytes, boxes);
//! ```

use js_sys::Function;
use plateblur_core::refine::refine_all;
use plateblur_core::{
    AnonymizeError, AnonymizeResponse, Anonymizer, AnonymizerConfig, AnonymizationRect,
    DetectionBox, FixedDetections, PlateDetector,
};
use wasm_bindgen::prelude::*;

use crate::detector::{parse_detections, JsFunctionDetector};
use crate::types::{config_from_js, js_error, JsErrorBody, JsPixelBuffer};

/// Decode an upload and apply the pre-detection size cap.
///
/// Returns the exact buffer [`anonymize_with_detections`] will pixelate, so
/// boxes computed on it line up.
#[wasm_bindgen]
pub fn prepare_image(bytes: &[u8], config: JsValue) -> Result<JsPixelBuffer, JsValue> {
    let config = config_from_js(config)?;
    prepare_with(bytes, config)
        .map(JsPixelBuffer::from_buffer)
        .map_err(|e| js_error(&e))
}

/// Refine detector boxes for an image of the given size.
///
/// Returns an array of `{xa, ya, xb, yb}` objects; degenerate boxes are omitted.
#[wasm_bindgen]
pub fn refine_regions(
    width: u32,
    height: u32,
    detections: JsValue,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    let config = config_from_js(config)?;
    let boxes = parse_detections(detections)
        .map_err(|e| JsErrorBody::new(format!("Invalid detections: {e}"), 400).into_js())?;
    let rects = refine_with(&boxes, width, height, &config);
    serde_wasm_bindgen::to_value(&rects).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run the full pipeline, calling `detect_fn(pixels, width, height)` for boxes.
///
/// Returns `{image_base64}`.
#[wasm_bindgen]
pub fn anonymize(bytes: &[u8], detect_fn: Function, config: JsValue) -> Result<JsValue, JsValue> {
    let config = config_from_js(config)?;
    let response = process_with(bytes, JsFunctionDetector::new(detect_fn), config)
        .map_err(|e| js_error(&e))?;
    serde_wasm_bindgen::to_value(&response).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run the full pipeline with boxes computed on the [`prepare_image`] buffer.
///
/// Returns `{image_base64}`.
#[wasm_bindgen]
pub fn anonymize_with_detections(
    bytes: &[u8],
    detections: JsValue,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    let config = config_from_js(config)?;
    let boxes = parse_detections(detections)
        .map_err(|e| JsErrorBody::new(format!("Invalid detections: {e}"), 400).into_js())?;
    let response = process_with(bytes, FixedDetections::new(boxes), config)
        .map_err(|e| js_error(&e))?;
    serde_wasm_bindgen::to_value(&response).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn prepare_with(
    bytes: &[u8],
    config: AnonymizerConfig,
) -> Result<plateblur_core::PixelBuffer, AnonymizeError> {
    Anonymizer::with_config(FixedDetections::default(), config)?.prepare(bytes)
}

fn refine_with(
    boxes: &[DetectionBox],
    width: u32,
    height: u32,
    config: &AnonymizerConfig,
) -> Vec<AnonymizationRect> {
    refine_all(boxes, width, height, &config.refine)
}

fn process_with<D: PlateDetector>(
    bytes: &[u8],
    detector: D,
    config: AnonymizerConfig,
) -> Result<AnonymizeResponse, AnonymizeError> {
    Anonymizer::with_config(detector, config)?.process(bytes)
}
