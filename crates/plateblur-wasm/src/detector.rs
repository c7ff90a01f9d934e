//! A [`PlateDetector`] backed by a JavaScript callback.
//!
//! The callback is invoked synchronously as `detect(pixels, width, height)`
//! where `pixels` is a packed RGB `Uint8Array`. It must return an array of
//! `{xyxy: [x1, y1, x2, y2], confidence?: number}` objects in the same pixel
//! space. Throwing or returning anything else fails the request.

use js_sys::{Function, Uint8Array};
use plateblur_core::{DetectionBox, DetectorError, PixelBuffer, PlateDetector};
use wasm_bindgen::prelude::*;

pub(crate) struct JsFunctionDetector {
    callback: Function,
}

impl JsFunctionDetector {
    pub(crate) fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl PlateDetector for JsFunctionDetector {
    fn detect(&self, image: &PixelBuffer) -> Result<Vec<DetectionBox>, DetectorError> {
        let pixels = Uint8Array::from(image.pixels.as_slice());
        let result = self
            .callback
            .call3(
                &JsValue::NULL,
                &pixels,
                &JsValue::from(image.width),
                &JsValue::from(image.height),
            )
            .map_err(|e| DetectorError::Failed(describe(&e)))?;

        let boxes = parse_detections(result)?;
        tracing::debug!(count = boxes.len(), "js detector returned boxes");
        Ok(boxes)
    }
}

/// Deserialize a JS detections array.
pub(crate) fn parse_detections(value: JsValue) -> Result<Vec<DetectionBox>, DetectorError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| DetectorError::MalformedOutput(e.to_string()))
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_callback_receives_buffer_dimensions() {
        let callback = Function::new_with_args(
            "pixels, width, height",
            "return [{ xyxy: [0, 0, width, height], confidence: pixels.length / 1000 }];",
        );
        let detector = JsFunctionDetector::new(callback);
        let boxes = detector
            .detect(&PixelBuffer::filled(10, 5, [0, 0, 0]))
            .unwrap();

        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].xyxy, [0.0, 0.0, 10.0, 5.0]);
        assert_eq!(boxes[0].confidence, Some(0.15));
    }

    #[wasm_bindgen_test]
    fn test_throwing_callback_fails() {
        let callback = Function::new_no_args("throw 'model not loaded';");
        let err = JsFunctionDetector::new(callback)
            .detect(&PixelBuffer::filled(2, 2, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, DetectorError::Failed(msg) if msg == "model not loaded"));
    }

    #[wasm_bindgen_test]
    fn test_malformed_output() {
        let callback = Function::new_no_args("return [{ box: 1 }];");
        let err = JsFunctionDetector::new(callback)
            .detect(&PixelBuffer::filled(2, 2, [0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, DetectorError::MalformedOutput(_)));
    }
}
