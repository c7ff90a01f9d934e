//! Plateblur Core - License plate anonymization
//!
//! This crate turns an uploaded photo into a copy whose license plates are
//! irreversibly pixelated. Plate detection is delegated to an injected
//! [`PlateDetector`]; everything around it lives here:
//!
//! - [`decode`] - robust decoding, EXIF orientation, pre-detection size cap
//! - [`refine`] - detector boxes to plate-shaped anonymization rectangles
//! - [`pixelate`] - in-place block pixelation
//! - [`encode`] - JPEG + base64 response payloads
//! - [`pipeline`] - the [`Anonymizer`] tying the stages together
//!
//! # Usage
//!
//! ```ignore
//! use plateblur_core::{Anonymizer, DetectionBox, FixedDetections};
//!
//! let boxes = vec![DetectionBox::new(100.0, 100.0, 400.0, 250.0).with_confidence(0.9)];
//! let anonymizer = Anonymizer::new(FixedDetections::new(boxes));
//! let response = anonymizer.process(&std::fs::read("car.jpg")?)?;
//! println!("{}", response.image_base64.len());
//! ```

pub mod config;
pub mod decode;
pub mod detect;
pub mod encode;
pub mod pipeline;
pub mod pixelate;
pub mod refine;

pub use config::{AnonymizerConfig, ConfigError, PixelateConfig, RefineConfig, ResizeConfig};
pub use decode::{DecodeError, PixelBuffer};
pub use detect::{DetectionBox, DetectorError, FixedDetections, PlateDetector};
pub use encode::{AnonymizeResponse, EncodeError, ErrorResponse};
pub use pipeline::{AnonymizeError, Anonymized, Anonymizer};
pub use refine::AnonymizationRect;
