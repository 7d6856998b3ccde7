//! Axis-aligned boxes and overlap measures.
//!
//! Two width conventions coexist. Overlap is measured with the inclusive
//! pixel-count convention (`x2 - x1 + 1`); rects handed to callers use plain
//! subtraction (`x2 - x1`).

/// Corner-form box `[x1, y1, x2, y2]` in model units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BBox {
    /// Creates a box from its corners.
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a box from `[x1, y1, x2, y2]`.
    pub const fn from_array(coords: [f32; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// Returns the corners as `[x1, y1, x2, y2]`.
    pub const fn as_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Area under the inclusive pixel-count convention.
    #[inline]
    pub fn inclusive_area(&self) -> f32 {
        (self.x2 - self.x1 + 1.0) * (self.y2 - self.y1 + 1.0)
    }

    /// Converts to a top-left/size rect by plain subtraction.
    pub fn to_rect(&self) -> Rect {
        Rect {
            x: self.x1,
            y: self.y1,
            width: self.x2 - self.x1,
            height: self.y2 - self.y1,
        }
    }
}

/// Top-left anchored rectangle as reported to callers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Intersection over union with inclusive widths and heights.
///
/// Returns `0.0` when the union is not a positive finite area, so degenerate
/// boxes never produce NaN.
#[inline]
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let inter_w = (a.x2.min(b.x2) - a.x1.max(b.x1) + 1.0).max(0.0);
    let inter_h = (a.y2.min(b.y2) - a.y1.max(b.y1) + 1.0).max(0.0);
    let inter = inter_w * inter_h;
    let union = a.inclusive_area() + b.inclusive_area() - inter;
    overlap_ratio(inter, union)
}

#[inline]
pub(crate) fn overlap_ratio(inter: f32, union: f32) -> f32 {
    if union > 0.0 && union.is_finite() {
        inter / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{iou, BBox};

    #[test]
    fn inclusive_area_counts_edge_pixels() {
        let b = BBox::new(0.0, 0.0, 9.0, 4.0);
        assert_eq!(b.inclusive_area(), 50.0);
    }

    #[test]
    fn rect_uses_plain_subtraction() {
        let rect = BBox::new(10.0, 20.0, 50.0, 35.0).to_rect();
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 20.0);
        assert_eq!(rect.width, 40.0);
        assert_eq!(rect.height, 15.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        // 10x10 pixel boxes sharing a 5x10 strip: 50 / 150.
        let a = BBox::new(0.0, 0.0, 9.0, 9.0);
        let b = BBox::new(5.0, 0.0, 14.0, 9.0);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn touching_edges_share_one_pixel_column() {
        let a = BBox::new(0.0, 0.0, 9.0, 9.0);
        let b = BBox::new(9.0, 0.0, 18.0, 9.0);
        assert!((iou(&a, &b) - 10.0 / 190.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_pair_is_zero() {
        let a = BBox::new(5.0, 5.0, 4.0, 4.0);
        assert_eq!(a.inclusive_area(), 0.0);
        assert_eq!(iou(&a, &a), 0.0);
    }
}
