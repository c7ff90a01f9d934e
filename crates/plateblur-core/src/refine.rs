//! Region refinement: detector boxes to anonymization rectangles.
//!
//! Detector boxes tend to be looser than the plate characters. Each box is
//! shrunk inward, then re-fitted to a plate-shaped rectangle around the same
//! center: tall enough to cover thin detections, never wider than the box.
//!
//! # Algorithm
//!
//! ```text
//! 1. truncate to integers, order corners, bw = max(1, x2-x1), bh = max(1, y2-y1)
//! 2. trim floor(bw * shrink) / floor(bh * shrink) from each side, clamp into the
//!    image, keep at least one pixel:              (xa, ya, xb, yb), cur_w, cur_h
//! 3. desired_h = min(max(cur_h, min_height), floor(cur_w / aspect))
//!    desired_w = min(max(floor(desired_h * aspect), min_width), cur_w)
//! 4. recenter on (xa + cur_w/2, ya + cur_h/2), clip to the image
//! 5. keep only if the result still has area
//! ```

use serde::{Deserialize, Serialize};

use crate::config::RefineConfig;
use crate::detect::DetectionBox;

/// An integer rectangle `[xa, xb) × [ya, yb)` inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnonymizationRect {
    pub xa: u32,
    pub ya: u32,
    pub xb: u32,
    pub yb: u32,
}

impl AnonymizationRect {
    #[inline]
    pub fn width(&self) -> u32 {
        self.xb - self.xa
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.yb - self.ya
    }

    /// Whether pixel `(x, y)` lies inside the rectangle.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.xa && x < self.xb && y >= self.ya && y < self.yb
    }
}

/// Refine one detection for an image of `width` × `height` pixels.
///
/// Returns `None` when the refined rectangle is degenerate (too narrow a box,
/// or nothing left inside the image). That is a deliberate no-op, not an error.
pub fn refine_box(
    detection: &DetectionBox,
    width: u32,
    height: u32,
    config: &RefineConfig,
) -> Option<AnonymizationRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (width as i64, height as i64);

    // Float-to-int casts saturate and map NaN to 0
    let [fx1, fy1, fx2, fy2] = detection.xyxy.map(|v| v as i64);
    let (x1, x2) = (fx1.min(fx2), fx1.max(fx2));
    let (y1, y2) = (fy1.min(fy2), fy1.max(fy2));
    let bw = x2.saturating_sub(x1).max(1);
    let bh = y2.saturating_sub(y1).max(1);

    // Inward shrink, clamped into the image
    let sx = (bw as f64 * config.shrink_ratio) as i64;
    let sy = (bh as f64 * config.shrink_ratio) as i64;
    let xa = x1.saturating_add(sx).clamp(0, w - 1);
    let ya = y1.saturating_add(sy).clamp(0, h - 1);
    let xb = x2.saturating_sub(sx).min(w).max(xa + 1);
    let yb = y2.saturating_sub(sy).min(h).max(ya + 1);

    // Plate-shaped rectangle around the same center
    let aspect = config.plate_aspect;
    let cur_w = xb - xa;
    let cur_h = yb - ya;
    let desired_h = cur_h
        .max(config.min_height as i64)
        .min((cur_w as f64 / aspect) as i64);
    let desired_w = ((desired_h as f64 * aspect) as i64)
        .max(config.min_width as i64)
        .min(cur_w);

    let cx = xa + cur_w / 2;
    let cy = ya + cur_h / 2;
    let xa = (cx - desired_w / 2).max(0);
    let ya = (cy - desired_h / 2).max(0);
    let xb = (xa + desired_w).min(w);
    let yb = (ya + desired_h).min(h);

    (xa < xb && ya < yb).then(|| AnonymizationRect {
        xa: xa as u32,
        ya: ya as u32,
        xb: xb as u32,
        yb: yb as u32,
    })
}

/// Refine every detection, dropping the degenerate ones.
pub fn refine_all(
    detections: &[DetectionBox],
    width: u32,
    height: u32,
    config: &RefineConfig,
) -> Vec<AnonymizationRect> {
    detections
        .iter()
        .filter_map(|det| {
            let rect = refine_box(det, width, height, config);
            if rect.is_none() {
                tracing::debug!(xyxy = ?det.xyxy, "dropped degenerate detection");
            }
            rect
        })
        .collect()
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const SIZE: u32 = 1000;
    const MARGIN: u32 = 30;

    /// Boxes at least 4x4, kept `MARGIN` px away from the image border.
    fn inner_box_strategy() -> impl Strategy<Value = (u32, u32, u32, u32)> {
        (MARGIN..SIZE - MARGIN - 4, MARGIN..SIZE - MARGIN - 4).prop_flat_map(|(x1, y1)| {
            (
                Just(x1),
                Just(y1),
                x1 + 4..=SIZE - MARGIN,
                y1 + 4..=SIZE - MARGIN,
            )
        })
    }

    proptest! {
        /// Property: an inner box yields exactly one plate-shaped rectangle inside the image.
        #[test]
        fn prop_inner_box_yields_plate_rect((x1, y1, x2, y2) in inner_box_strategy()) {
            let config = RefineConfig::default();
            let det = DetectionBox::new(x1 as f32, y1 as f32, x2 as f32, y2 as f32);
            let rect = refine_box(&det, SIZE, SIZE, &config);
            prop_assert!(rect.is_some());
            let rect = rect.unwrap();

            prop_assert!(rect.xa < rect.xb && rect.ya < rect.yb);
            prop_assert!(rect.xb <= SIZE && rect.yb <= SIZE);

            // Within one pixel of height of the target ratio
            let (w, h) = (rect.width() as f64, rect.height() as f64);
            prop_assert!(
                (w - config.plate_aspect * h).abs() <= config.plate_aspect,
                "{}x{} is not plate shaped", w, h
            );

            // At least the minimum height unless the box width rules it out
            let interim_w = (x2 - x1) - 2 * ((x2 - x1) as f64 * config.shrink_ratio) as u32;
            let width_cap = (interim_w as f64 / config.plate_aspect) as u32;
            prop_assert!(rect.height() >= config.min_height.min(width_cap));

            // Never wider than the box it came from
            prop_assert!(rect.width() <= x2 - x1);
        }

        /// Property: whatever the detector reports, output rectangles stay inside the image.
        #[test]
        fn prop_any_box_stays_inside(
            coords in prop::array::uniform4(-5000.0f32..5000.0),
            width in 1u32..=800,
            height in 1u32..=800,
        ) {
            let det = DetectionBox::new(coords[0], coords[1], coords[2], coords[3]);
            if let Some(rect) = refine_box(&det, width, height, &RefineConfig::default()) {
                prop_assert!(rect.xa < rect.xb && rect.ya < rect.yb);
                prop_assert!(rect.xb <= width && rect.yb <= height);
            }
        }
    }
}
