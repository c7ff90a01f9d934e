//! Transport payloads: base64 text and the response bodies built from it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{encode_buffer, EncodeError};
use crate::decode::PixelBuffer;

/// Successful response body: `{"image_base64": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizeResponse {
    /// The anonymized image as base64-encoded JPEG.
    pub image_base64: String,
}

impl AnonymizeResponse {
    /// Decode the payload back to JPEG bytes.
    pub fn jpeg_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.image_base64)
    }
}

/// Failure response body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Encode an image as JPEG and wrap it as a base64 payload.
pub fn encode_response(image: &PixelBuffer, quality: u8) -> Result<AnonymizeResponse, EncodeError> {
    let jpeg = encode_buffer(image, quality)?;
    Ok(AnonymizeResponse {
        image_base64: STANDARD.encode(jpeg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_image;

    #[test]
    fn test_response_round_trips_through_base64() {
        let image = PixelBuffer::filled(64, 48, [10, 120, 240]);
        let response = encode_response(&image, 95).unwrap();

        assert!(response.image_base64.starts_with("/9j/"), "base64 of a JPEG SOI marker");
        let jpeg = response.jpeg_bytes().unwrap();
        let decoded = decode_image(&jpeg).unwrap();
        assert_eq!((decoded.width, decoded.height), (64, 48));
    }

    #[test]
    fn test_response_json_shape() {
        let response = AnonymizeResponse {
            image_base64: "AAAA".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"image_base64":"AAAA"}"#
        );

        let error = ErrorResponse {
            error: "Invalid image".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"error":"Invalid image"}"#
        );
    }

    #[test]
    fn test_encode_response_rejects_empty_image() {
        let image = PixelBuffer::new(0, 0, vec![]);
        assert!(encode_response(&image, 95).is_err());
    }
}
