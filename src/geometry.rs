//! Document-space to surface-pixel mapping

use serde::Serialize;

use crate::content::ElementBox;

/// Smallest clickable extent in surface pixels
pub const MIN_HIT_TARGET_PX: f64 = 8.0;

/// Box in surface-pixel coordinates, unrounded
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SurfaceBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer rectangle after pixel snapping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Map a document-space box onto the surface at `scale`.
///
/// Pure and linear in `scale`; no rounding happens here.
#[must_use]
pub fn to_surface_box(bbox: &ElementBox, scale: f32) -> SurfaceBox {
    let scale = f64::from(scale);
    SurfaceBox {
        top: bbox.top * scale,
        left: bbox.left * scale,
        width: (bbox.right - bbox.left) * scale,
        height: (bbox.bottom - bbox.top) * scale,
    }
}

impl SurfaceBox {
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grow to at least `min` on each axis, keeping the centre fixed
    #[must_use]
    pub fn hit_area(&self, min: f64) -> SurfaceBox {
        let width = self.width.max(min);
        let height = self.height.max(min);
        SurfaceBox {
            left: self.left - (width - self.width) / 2.0,
            top: self.top - (height - self.height) / 2.0,
            width,
            height,
        }
    }

    /// Inclusive on the top/left edges, exclusive on bottom/right
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Snap edges to the nearest pixel. The only place geometry leaves `f64`.
    #[must_use]
    pub fn snapped(&self) -> PixelRect {
        let x0 = self.left.round();
        let y0 = self.top.round();
        let x1 = self.right().round();
        let y1 = self.bottom().round();
        PixelRect {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0).max(0.0) as u32,
            height: (y1 - y0).max(0.0) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: ElementBox = ElementBox::new(10.0, 20.0, 35.0, 70.0);

    #[test]
    fn maps_position_and_extent() {
        let b = to_surface_box(&SAMPLE, 1.5);
        assert_eq!(b.top, 15.0);
        assert_eq!(b.left, 30.0);
        assert_eq!(b.width, 75.0);
        assert_eq!(b.height, 37.5);
    }

    #[test]
    fn width_is_linear_across_clamp_range() {
        let mut scale: f32 = 0.5;
        while scale <= 3.0 {
            let b = to_surface_box(&SAMPLE, scale);
            assert_eq!(b.width, SAMPLE.width() * f64::from(scale));
            assert_eq!(b.height, SAMPLE.height() * f64::from(scale));
            scale += 0.25;
        }
    }

    #[test]
    fn doubling_scale_doubles_extent() {
        let one = to_surface_box(&SAMPLE, 0.75);
        let two = to_surface_box(&SAMPLE, 1.5);
        assert_eq!(two.width, one.width * 2.0);
        assert_eq!(two.height, one.height * 2.0);
    }

    #[test]
    fn degenerate_box_gets_minimum_hit_area() {
        let dot = to_surface_box(&ElementBox::new(10.0, 10.0, 10.0, 10.0), 2.0);
        assert_eq!(dot.area(), 0.0);
        assert!(!dot.contains(20.0, 20.0));

        let hit = dot.hit_area(MIN_HIT_TARGET_PX);
        assert_eq!(hit.width, MIN_HIT_TARGET_PX);
        assert_eq!(hit.height, MIN_HIT_TARGET_PX);
        assert!(hit.contains(20.0, 20.0));
        assert!(hit.contains(17.0, 23.0));
        assert!(!hit.contains(25.0, 20.0));
    }

    #[test]
    fn large_box_hit_area_unchanged() {
        let b = to_surface_box(&SAMPLE, 1.0);
        assert_eq!(b.hit_area(MIN_HIT_TARGET_PX), b);
    }

    #[test]
    fn fine_positions_survive_mapping() {
        let word = ElementBox::new(7_012.125, 1_048_576.3, 7_013.0, 1_048_583.7);
        let b = to_surface_box(&word, 2.0);
        assert_eq!(b.left, 2_097_152.6);
        assert!((b.width - 14.8).abs() < 1e-6);
    }

    #[test]
    fn snapping_rounds_edges() {
        let b = SurfaceBox {
            top: 1.4,
            left: 2.6,
            width: 10.2,
            height: 0.2,
        };
        assert_eq!(
            b.snapped(),
            PixelRect {
                x: 3,
                y: 1,
                width: 10,
                height: 1,
            }
        );
    }
}
