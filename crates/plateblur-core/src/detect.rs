//! The detector boundary.
//!
//! License-plate detection itself happens outside this crate. The pipeline
//! only needs something that turns a [`PixelBuffer`] into a list of
//! [`DetectionBox`]es in the same pixel space, expressed by [`PlateDetector`].
//! Closures with the right signature implement the trait, and
//! [`FixedDetections`] replays boxes computed elsewhere.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::PixelBuffer;

/// Errors reported by a detector implementation.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The detector could not run (model unavailable, inference error, ...).
    #[error("detector failed: {0}")]
    Failed(String),

    /// The detector ran but its output could not be interpreted.
    #[error("detector returned malformed output: {0}")]
    MalformedOutput(String),
}

/// A detector-reported box in buffer pixel coordinates.
///
/// Serializes as `{"xyxy": [x1, y1, x2, y2], "confidence": 0.9}`.
/// Corner order is not guaranteed; the refiner normalizes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    /// `[x1, y1, x2, y2]`.
    pub xyxy: [f32; 4],
    /// Detection confidence in `[0, 1]`, if the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl DetectionBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            xyxy: [x1, y1, x2, y2],
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Pluggable license-plate detection backend.
///
/// Implementations receive the decoded, orientation-corrected and size-capped
/// buffer, and must return boxes in that buffer's coordinate space. An empty
/// list means "nothing to anonymize"; an error aborts the request so an
/// unanonymized image is never returned.
pub trait PlateDetector {
    fn detect(&self, image: &PixelBuffer) -> Result<Vec<DetectionBox>, DetectorError>;
}

impl<F> PlateDetector for F
where
    F: Fn(&PixelBuffer) -> Result<Vec<DetectionBox>, DetectorError>,
{
    fn detect(&self, image: &PixelBuffer) -> Result<Vec<DetectionBox>, DetectorError> {
        self(image)
    }
}

/// A detector that replays a precomputed list of boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedDetections {
    boxes: Vec<DetectionBox>,
}

impl FixedDetections {
    pub fn new(boxes: Vec<DetectionBox>) -> Self {
        Self { boxes }
    }

    pub fn boxes(&self) -> &[DetectionBox] {
        &self.boxes
    }
}

impl From<Vec<DetectionBox>> for FixedDetections {
    fn from(boxes: Vec<DetectionBox>) -> Self {
        Self::new(boxes)
    }
}

impl PlateDetector for FixedDetections {
    fn detect(&self, _image: &PixelBuffer) -> Result<Vec<DetectionBox>, DetectorError> {
        Ok(self.boxes.clone())
    }
}
