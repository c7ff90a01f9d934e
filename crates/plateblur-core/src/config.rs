//! Pipeline configuration.
//!
//! Every tunable of the anonymization pipeline lives here. `Default` gives the
//! production values; partial JSON configs fill the rest from defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by [`AnonymizerConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("resize target ({target}) must not exceed the threshold ({threshold})")]
    TargetAboveThreshold { target: u32, threshold: u32 },

    #[error("shrink ratio must be in [0, 0.5), got {0}")]
    ShrinkRatioOutOfRange(f64),

    #[error("JPEG quality must be between 1 and 100, got {0}")]
    QualityOutOfRange(u8),

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Accepted plate width:height ratios; beyond these every box collapses to a sliver.
pub const PLATE_ASPECT_RANGE: (f64, f64) = (1.0, 10.0);

/// Upper bound on the per-axis block floor of the pixelation grid.
pub const MAX_MIN_BLOCKS: u32 = 4096;

/// Size cap applied before detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Images whose longest edge exceeds this are downscaled.
    pub threshold: u32,
    /// Longest edge after downscaling.
    pub target: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            threshold: 2000,
            target: 1600,
        }
    }
}

/// Geometry used to turn detector boxes into anonymization rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Fraction of each box dimension trimmed from every side.
    pub shrink_ratio: f64,
    /// Target width:height ratio of a plate.
    pub plate_aspect: f64,
    /// Minimum rectangle height, unless the box is too narrow to allow it.
    pub min_height: u32,
    /// Minimum rectangle width, unless the box itself is narrower.
    pub min_width: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            shrink_ratio: 0.06,
            plate_aspect: 2.5,
            min_height: 50,
            min_width: 18,
        }
    }
}

/// Block granularity of the pixelation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelateConfig {
    /// Blocks per pixel of rectangle size, before the floors apply.
    pub block_ratio: f64,
    /// Minimum number of blocks across.
    pub min_blocks_x: u32,
    /// Minimum number of blocks down.
    pub min_blocks_y: u32,
}

impl Default for PixelateConfig {
    fn default() -> Self {
        Self {
            block_ratio: 0.06,
            min_blocks_x: 12,
            min_blocks_y: 6,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizerConfig {
    pub resize: ResizeConfig,
    pub refine: RefineConfig,
    pub pixelate: PixelateConfig,
    /// JPEG quality of the response image (1-100).
    pub jpeg_quality: u8,
    /// Decoder allocation limit in bytes; `None` decodes images of any size.
    pub max_decode_alloc: Option<u64>,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            resize: ResizeConfig::default(),
            refine: RefineConfig::default(),
            pixelate: PixelateConfig::default(),
            jpeg_quality: 95,
            max_decode_alloc: None,
        }
    }
}

impl AnonymizerConfig {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive_u32 = [
            ("resize.threshold", self.resize.threshold),
            ("resize.target", self.resize.target),
            ("pixelate.min_blocks_x", self.pixelate.min_blocks_x),
            ("pixelate.min_blocks_y", self.pixelate.min_blocks_y),
        ];
        for (field, value) in positive_u32 {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }

        let positive_f64 = [
            ("refine.plate_aspect", self.refine.plate_aspect),
            ("pixelate.block_ratio", self.pixelate.block_ratio),
        ];
        for (field, value) in positive_f64 {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field });
            }
        }

        let (min_aspect, max_aspect) = PLATE_ASPECT_RANGE;
        let bounded = [
            ("refine.plate_aspect", self.refine.plate_aspect, min_aspect, max_aspect),
            ("pixelate.block_ratio", self.pixelate.block_ratio, 0.0, 1.0),
            (
                "pixelate.min_blocks_x",
                self.pixelate.min_blocks_x as f64,
                1.0,
                MAX_MIN_BLOCKS as f64,
            ),
            (
                "pixelate.min_blocks_y",
                self.pixelate.min_blocks_y as f64,
                1.0,
                MAX_MIN_BLOCKS as f64,
            ),
        ];
        for (field, value, min, max) in bounded {
            // Also rejects infinities
            if !(min..=max).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    min,
                    max,
                    value,
                });
            }
        }

        if self.resize.target > self.resize.threshold {
            return Err(ConfigError::TargetAboveThreshold {
                target: self.resize.target,
                threshold: self.resize.threshold,
            });
        }

        if !(0.0..0.5).contains(&self.refine.shrink_ratio) {
            return Err(ConfigError::ShrinkRatioOutOfRange(self.refine.shrink_ratio));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::QualityOutOfRange(self.jpeg_quality));
        }

        Ok(())
    }
}
