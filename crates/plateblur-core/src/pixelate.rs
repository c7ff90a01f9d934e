//! In-place pixelation of anonymization rectangles.
//!
//! A rectangle is area-averaged down to a coarse block grid and expanded back
//! with nearest-neighbor sampling, so every block becomes one flat color.
//! The mapping is many-to-one; the original detail cannot be recovered.
//!
//! The grid has `max(rw * ratio, min_x)` × `max(rh * ratio, min_y)` blocks:
//! the floors keep small plates visibly blocky, the ratio keeps block size
//! proportional on large ones.

use thiserror::Error;

use crate::config::PixelateConfig;
use crate::decode::{resize, DecodeError, FilterType, PixelBuffer};
use crate::refine::AnonymizationRect;

/// Errors that abort pixelation. Any of these must fail the request.
#[derive(Debug, Error)]
pub enum PixelateError {
    #[error("rectangle {rect:?} does not fit a {width}x{height} image")]
    OutOfBounds {
        rect: AnonymizationRect,
        width: u32,
        height: u32,
    },

    #[error("resampling failed: {0}")]
    Resample(#[from] DecodeError),
}

/// Number of blocks across and down for a `rect_w` × `rect_h` rectangle.
pub fn block_grid(rect_w: u32, rect_h: u32, config: &PixelateConfig) -> (u32, u32) {
    let blocks = |extent: u32, floor: u32| -> u32 {
        ((extent as f64 * config.block_ratio).max(floor as f64) as u32).max(1)
    };
    (
        blocks(rect_w, config.min_blocks_x),
        blocks(rect_h, config.min_blocks_y),
    )
}

/// Pixelate one rectangle of `image` in place.
///
/// Only pixels inside the rectangle are written.
pub fn pixelate_region(
    image: &mut PixelBuffer,
    rect: &AnonymizationRect,
    config: &PixelateConfig,
) -> Result<(), PixelateError> {
    if rect.xa >= rect.xb || rect.ya >= rect.yb || rect.xb > image.width || rect.yb > image.height
    {
        return Err(PixelateError::OutOfBounds {
            rect: *rect,
            width: image.width,
            height: image.height,
        });
    }

    let (rw, rh) = (rect.width(), rect.height());
    let (small_w, small_h) = block_grid(rw, rh, config);

    let region = image.copy_region(rect.xa, rect.ya, rw, rh);
    let small = resize(&region, small_w, small_h, FilterType::Area)?;
    let blocky = resize(&small, rw, rh, FilterType::Nearest)?;
    image.paste_region(rect.xa, rect.ya, &blocky);
    Ok(())
}

/// Pixelate every rectangle in order. Overlapping rectangles are pixelated twice.
pub fn pixelate_all(
    image: &mut PixelBuffer,
    rects: &[AnonymizationRect],
    config: &PixelateConfig,
) -> Result<(), PixelateError> {
    for rect in rects {
        pixelate_region(image, rect, config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn noisy_image(width: u32, height: u32) -> PixelBuffer {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 7 + y * 13) % 256) as u8);
                pixels.push(((x * 31) ^ (y * 17)) as u8);
                pixels.push(((x + y) * 5 % 256) as u8);
            }
        }
        PixelBuffer::new(width, height, pixels)
    }

    fn distinct_colors(image: &PixelBuffer, rect: &AnonymizationRect) -> usize {
        let mut colors = HashSet::new();
        for y in rect.ya..rect.yb {
            for x in rect.xa..rect.xb {
                colors.insert(image.pixel(x, y));
            }
        }
        colors.len()
    }

    #[test]
    fn test_block_grid_floors() {
        let config = PixelateConfig::default();
        assert_eq!(block_grid(50, 20, &config), (12, 6));
        assert_eq!(block_grid(262, 105, &config), (15, 6));
        assert_eq!(block_grid(1000, 400, &config), (60, 24));
        assert_eq!(block_grid(3, 2, &config), (12, 6));
    }

    #[test]
    fn test_block_grid_never_zero() {
        let config = PixelateConfig {
            block_ratio: 0.01,
            min_blocks_x: 0,
            min_blocks_y: 0,
        };
        assert_eq!(block_grid(10, 10, &config), (1, 1));
    }

    #[test]
    fn test_pixelate_bounds_distinct_colors() {
        let config = PixelateConfig::default();
        let mut image = noisy_image(400, 300);
        let rect = AnonymizationRect {
            xa: 119,
            ya: 23,
            xb: 381,
            yb: 128,
        };
        pixelate_region(&mut image, &rect, &config).unwrap();

        let (small_w, small_h) = block_grid(rect.width(), rect.height(), &config);
        assert!(distinct_colors(&image, &rect) <= (small_w * small_h) as usize);
    }

    #[test]
    fn test_pixelate_leaves_outside_untouched() {
        let config = PixelateConfig::default();
        let original = noisy_image(120, 80);
        let mut image = original.clone();
        let rect = AnonymizationRect {
            xa: 10,
            ya: 20,
            xb: 90,
            yb: 52,
        };
        pixelate_region(&mut image, &rect, &config).unwrap();

        let mut changed = false;
        for y in 0..image.height {
            for x in 0..image.width {
                if rect.contains(x, y) {
                    changed |= image.pixel(x, y) != original.pixel(x, y);
                } else {
                    assert_eq!(image.pixel(x, y), original.pixel(x, y), "({x}, {y})");
                }
            }
        }
        assert!(changed, "pixelation should alter a noisy region");
    }

    #[test]
    fn test_pixelate_small_rect_upsamples_grid() {
        // Rectangle smaller than the 12x6 floor still works and stays bounded
        let config = PixelateConfig::default();
        let mut image = noisy_image(20, 20);
        let rect = AnonymizationRect {
            xa: 2,
            ya: 2,
            xb: 6,
            yb: 4,
        };
        pixelate_region(&mut image, &rect, &config).unwrap();
        assert!(distinct_colors(&image, &rect) <= 12 * 6);
    }

    #[test]
    fn test_pixelate_flat_region_is_stable() {
        let config = PixelateConfig::default();
        let mut image = PixelBuffer::filled(64, 64, [90, 140, 200]);
        let rect = AnonymizationRect {
            xa: 0,
            ya: 0,
            xb: 64,
            yb: 64,
        };
        pixelate_region(&mut image, &rect, &config).unwrap();
        assert_eq!(image, PixelBuffer::filled(64, 64, [90, 140, 200]));
    }

    #[test]
    fn test_pixelate_out_of_bounds_fails() {
        let config = PixelateConfig::default();
        let mut image = noisy_image(50, 50);
        let rect = AnonymizationRect {
            xa: 40,
            ya: 40,
            xb: 60,
            yb: 50,
        };
        assert!(matches!(
            pixelate_region(&mut image, &rect, &config),
            Err(PixelateError::OutOfBounds { .. })
        ));

        let empty = AnonymizationRect {
            xa: 10,
            ya: 10,
            xb: 10,
            yb: 20,
        };
        assert!(pixelate_region(&mut image, &empty, &config).is_err());
    }

    #[test]
    fn test_pixelate_all_overlapping() {
        let config = PixelateConfig::default();
        let mut image = noisy_image(200, 120);
        let rects = [
            AnonymizationRect {
                xa: 10,
                ya: 10,
                xb: 110,
                yb: 60,
            },
            AnonymizationRect {
                xa: 60,
                ya: 30,
                xb: 160,
                yb: 80,
            },
        ];
        pixelate_all(&mut image, &rects, &config).unwrap();

        // The later rectangle is written last, so its grid bound holds exactly
        let (small_w, small_h) = block_grid(100, 50, &config);
        assert!(distinct_colors(&image, &rects[1]) <= (small_w * small_h) as usize);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
