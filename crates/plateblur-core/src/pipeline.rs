//! The anonymization pipeline.
//!
//! ```text
//! bytes -> decode (+ orientation) -> size cap -> detect -> refine -> pixelate -> JPEG -> base64
//! ```
//!
//! Each call owns its buffer from decode to encode; an [`Anonymizer`] only holds
//! an immutable configuration and the detector, so one instance can serve
//! any number of sequential requests.

use std::time::Duration;

use thiserror::Error;

use crate::config::{AnonymizerConfig, ConfigError};
use crate::decode::{cap_for_detection, decode_image_with_limits, DecodeError, PixelBuffer};
use crate::detect::{DetectionBox, DetectorError, PlateDetector};
use crate::encode::{encode_response, AnonymizeResponse, EncodeError, ErrorResponse};
use crate::pixelate::{pixelate_all, PixelateError};
use crate::refine::{refine_all, AnonymizationRect};

/// Failure of a whole anonymization request.
///
/// Every variant maps to a distinct status via [`AnonymizeError::status_code`].
#[derive(Debug, Error)]
pub enum AnonymizeError {
    /// No decode path could interpret the payload.
    #[error("Unsupported or corrupted image format")]
    UnsupportedFormat,

    /// The payload decoded to a degenerate image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The detector failed; the image is not returned unanonymized.
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// A region could not be pixelated.
    #[error("anonymization failed: {0}")]
    Pixelate(#[from] PixelateError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A caller-imposed deadline expired.
    #[error("image processing timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A failure outside the detector and the payload's control.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DecodeError> for AnonymizeError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat => AnonymizeError::UnsupportedFormat,
            DecodeError::InvalidImage(reason) => AnonymizeError::InvalidImage(reason),
            other @ (DecodeError::InvalidDimensions { .. } | DecodeError::LimitExceeded(_)) => {
                AnonymizeError::InvalidImage(other.to_string())
            }
            other @ DecodeError::Resample(_) => AnonymizeError::Internal(other.to_string()),
        }
    }
}

impl AnonymizeError {
    /// HTTP-style status classification.
    pub fn status_code(&self) -> u16 {
        match self {
            AnonymizeError::UnsupportedFormat => 415,
            AnonymizeError::InvalidImage(_) => 400,
            AnonymizeError::Timeout(_) => 504,
            AnonymizeError::Detector(_)
            | AnonymizeError::Pixelate(_)
            | AnonymizeError::Encode(_)
            | AnonymizeError::Config(_)
            | AnonymizeError::Internal(_) => 500,
        }
    }

    /// Short message safe to show to the uploader.
    pub fn public_message(&self) -> &'static str {
        match self {
            AnonymizeError::UnsupportedFormat => "Unsupported or corrupted image format",
            AnonymizeError::InvalidImage(_) => "Invalid image",
            AnonymizeError::Detector(_) => "Plate detection failed",
            AnonymizeError::Pixelate(_)
            | AnonymizeError::Encode(_)
            | AnonymizeError::Internal(_) => "Anonymization failed",
            AnonymizeError::Timeout(_) => "Image processing timed out",
            AnonymizeError::Config(_) => "Server misconfigured",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.public_message().to_string(),
        }
    }
}

/// Everything one request produced before encoding.
#[derive(Debug, Clone)]
pub struct Anonymized {
    /// The anonymized buffer, in the (possibly downscaled) detection space.
    pub image: PixelBuffer,
    /// Raw detector output.
    pub detections: Vec<DetectionBox>,
    /// Rectangles that were pixelated.
    pub regions: Vec<AnonymizationRect>,
    /// Wall time spent inside the detector, where a clock is available.
    pub detect_time: Option<Duration>,
}

/// Runs the pipeline with an injected detector.
#[derive(Debug, Clone)]
pub struct Anonymizer<D> {
    detector: D,
    config: AnonymizerConfig,
}

impl<D: PlateDetector> Anonymizer<D> {
    /// Create an anonymizer with the default configuration.
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            config: AnonymizerConfig::default(),
        }
    }

    /// Create an anonymizer with a custom configuration.
    pub fn with_config(detector: D, config: AnonymizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { detector, config })
    }

    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Decode and size-cap a payload: the buffer the detector will see.
    pub fn prepare(&self, bytes: &[u8]) -> Result<PixelBuffer, AnonymizeError> {
        let decoded = decode_image_with_limits(bytes, self.config.max_decode_alloc)?;
        let resize = &self.config.resize;
        Ok(cap_for_detection(decoded, resize.threshold, resize.target)?)
    }

    /// Detect, refine and pixelate an already prepared buffer.
    pub fn anonymize_buffer(&self, mut image: PixelBuffer) -> Result<Anonymized, AnonymizeError> {
        let (detections, detect_time) = timed(|| self.detector.detect(&image));
        let detections = detections?;

        let regions = refine_all(&detections, image.width, image.height, &self.config.refine);
        pixelate_all(&mut image, &regions, &self.config.pixelate)?;

        tracing::info!(
            width = image.width,
            height = image.height,
            detections = detections.len(),
            regions = regions.len(),
            detect_ms = detect_time.map(|d| d.as_secs_f64() * 1000.0),
            "anonymized image"
        );

        Ok(Anonymized {
            image,
            detections,
            regions,
            detect_time,
        })
    }

    /// Run the pipeline up to, but not including, encoding.
    pub fn anonymize(&self, bytes: &[u8]) -> Result<Anonymized, AnonymizeError> {
        let image = self.prepare(bytes)?;
        self.anonymize_buffer(image)
    }

    /// Run the full pipeline and produce the transport payload.
    pub fn process(&self, bytes: &[u8]) -> Result<AnonymizeResponse, AnonymizeError> {
        let anonymized = self.anonymize(bytes)?;
        Ok(encode_response(&anonymized.image, self.config.jpeg_quality)?)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn timed<T>(f: impl FnOnce() -> T) -> (T, Option<Duration>) {
    let start = std::time::Instant::now();
    let out = f();
    (out, Some(start.elapsed()))
}

// `Instant::now` panics on wasm32-unknown-unknown
#[cfg(target_arch = "wasm32")]
fn timed<T>(f: impl FnOnce() -> T) -> (T, Option<Duration>) {
    (f(), None)
}
