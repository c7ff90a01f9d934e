//! Image resampling on top of fast_image_resize: area-averaging shrink,
//! nearest-neighbor expansion, and the pre-detection size cap.
//!
//! All functions return new `PixelBuffer` instances without modifying the input.

use fast_image_resize as fr;

use super::{DecodeError, FilterType, PixelBuffer};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` if either target dimension is zero,
/// and `DecodeError::InvalidImage` if the source has no pixels.
pub fn resize(
    image: &PixelBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    if !image.is_valid() {
        return Err(DecodeError::InvalidImage(format!(
            "cannot resample a {}x{} source",
            image.width, image.height
        )));
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    resample(image, width, height, filter)
}

/// Shrink an image so its longest edge is at most `max_edge`, preserving aspect ratio.
///
/// If the longest edge already fits, the image is returned unchanged. Otherwise
/// the longest edge becomes exactly `max_edge` and the other edge is scaled
/// by the same factor, truncated, and kept at least 1.
pub fn resize_to_fit(
    image: &PixelBuffer,
    max_edge: u32,
    filter: FilterType,
) -> Result<PixelBuffer, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(image.width, image.height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Bound an image before detection.
///
/// Images whose longest edge exceeds `threshold` are area-downscaled so the
/// longest edge becomes `target`; anything else passes through untouched.
pub fn cap_for_detection(
    image: PixelBuffer,
    threshold: u32,
    target: u32,
) -> Result<PixelBuffer, DecodeError> {
    let max_side = image.width.max(image.height);
    if max_side <= threshold {
        return Ok(image);
    }

    let resized = resize_to_fit(&image, target, FilterType::Area)?;
    tracing::debug!(
        from_width = image.width,
        from_height = image.height,
        to_width = resized.width,
        to_height = resized.height,
        "downscaled oversized image before detection"
    );
    Ok(resized)
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let scale_edge = |edge: u32, longest: u32| -> u32 {
        ((edge as u64 * max_edge as u64) / longest as u64).max(1) as u32
    };

    if width >= height {
        (max_edge, scale_edge(height, width))
    } else {
        (scale_edge(width, height), max_edge)
    }
}

fn resample(
    image: &PixelBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<PixelBuffer, DecodeError> {
    let src = fr::images::ImageRef::new(
        image.width,
        image.height,
        &image.pixels,
        fr::PixelType::U8x3,
    )
    .map_err(|e| DecodeError::Resample(e.to_string()))?;
    let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x3);

    let options = fr::ResizeOptions::new().resize_alg(filter.to_resize_alg());
    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| DecodeError::Resample(e.to_string()))?;

    Ok(PixelBuffer::new(width, height, dst.into_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> PixelBuffer {
        // Create a simple gradient image for testing
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8); // R
                pixels.push(((y * 255) / height.max(1)) as u8); // G
                pixels.push(128); // B
            }
        }
        PixelBuffer::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Area).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_same_dimensions() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 100, 50, FilterType::Area).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = create_test_image(100, 50);

        assert!(resize(&img, 0, 50, FilterType::Area).is_err());
        assert!(resize(&img, 50, 0, FilterType::Nearest).is_err());
    }

    #[test]
    fn test_resize_empty_source_error() {
        let img = PixelBuffer::new(0, 0, vec![]);
        assert!(matches!(
            resize(&img, 10, 10, FilterType::Area),
            Err(DecodeError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_area_averages_exact_blocks() {
        // 4x2 image: columns 0..2 are 0, columns 2..4 are 200
        let mut pixels = Vec::new();
        for _ in 0..2 {
            for x in 0..4 {
                let v = if x < 2 { 0 } else { 200 };
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        let img = PixelBuffer::new(4, 2, pixels);

        let halved = resize(&img, 2, 1, FilterType::Area).unwrap();
        assert_eq!(halved.pixel(0, 0), [0, 0, 0]);
        assert_eq!(halved.pixel(1, 0), [200, 200, 200]);

        let single = resize(&img, 1, 1, FilterType::Area).unwrap();
        assert_eq!(single.pixel(0, 0), [100, 100, 100]);
    }

    #[test]
    fn test_area_fractional_ratio_blends_neighbors() {
        // 3 pixels onto 2: each output sample straddles the middle pixel
        let img = PixelBuffer::new(3, 1, vec![0, 0, 0, 90, 90, 90, 180, 180, 180]);
        let out = resize(&img, 2, 1, FilterType::Area).unwrap();

        let left = out.pixel(0, 0)[0];
        let right = out.pixel(1, 0)[0];
        assert!(left < 90, "left = {left}");
        assert!(right > 90, "right = {right}");
        assert!(out.pixels.chunks_exact(3).all(|px| px[0] == px[1] && px[1] == px[2]));
    }

    #[test]
    fn test_area_preserves_constant_color() {
        let img = PixelBuffer::filled(97, 61, [12, 250, 99]);
        let out = resize(&img, 13, 7, FilterType::Area).unwrap();
        assert!(out.pixels.chunks_exact(3).all(|px| px == [12, 250, 99]));
    }

    #[test]
    fn test_nearest_upscale_replicates_blocks() {
        let img = PixelBuffer::new(2, 1, vec![255, 0, 0, 0, 0, 255]);
        let out = resize(&img, 6, 2, FilterType::Nearest).unwrap();

        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.pixel(x, y), [255, 0, 0]);
            }
            for x in 3..6 {
                assert_eq!(out.pixel(x, y), [0, 0, 255]);
            }
        }
    }

    #[test]
    fn test_resize_to_fit_landscape() {
        let img = create_test_image(4000, 3000);
        let resized = resize_to_fit(&img, 1600, FilterType::Area).unwrap();

        assert_eq!(resized.width, 1600);
        assert_eq!(resized.height, 1200);
    }

    #[test]
    fn test_resize_to_fit_portrait() {
        let img = create_test_image(600, 900);
        let resized = resize_to_fit(&img, 300, FilterType::Area).unwrap();

        assert_eq!(resized.width, 200);
        assert_eq!(resized.height, 300);
    }

    #[test]
    fn test_resize_to_fit_already_smaller() {
        let img = create_test_image(100, 50);
        let resized = resize_to_fit(&img, 256, FilterType::Area).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_to_fit_zero_max_edge_error() {
        let img = create_test_image(100, 50);
        assert!(resize_to_fit(&img, 0, FilterType::Area).is_err());
    }

    #[test]
    fn test_cap_for_detection_below_threshold_is_noop() {
        let img = create_test_image(2000, 1500);
        let capped = cap_for_detection(img.clone(), 2000, 1600).unwrap();
        assert_eq!(capped, img);
    }

    #[test]
    fn test_cap_for_detection_above_threshold() {
        let img = create_test_image(4000, 3000);
        let capped = cap_for_detection(img, 2000, 1600).unwrap();
        assert_eq!((capped.width, capped.height), (1600, 1200));

        let img = create_test_image(2001, 3001);
        let capped = cap_for_detection(img, 2000, 1600).unwrap();
        assert_eq!(capped.height, 1600);
        assert_eq!(capped.width, 2001 * 1600 / 3001);
    }

    #[test]
    fn test_calculate_fit_dimensions() {
        assert_eq!(calculate_fit_dimensions(3000, 2000, 1600), (1600, 1066));
        assert_eq!(calculate_fit_dimensions(2000, 3000, 1600), (1066, 1600));
        assert_eq!(calculate_fit_dimensions(4000, 4000, 256), (256, 256));
        assert_eq!(calculate_fit_dimensions(10000, 1, 1600), (1600, 1));
        assert_eq!(calculate_fit_dimensions(0, 0, 256), (0, 0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
