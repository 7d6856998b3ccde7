//! SIMD IoU kernel using the `wide` crate.
//!
//! Candidates are transposed eight at a time into lane vectors; the tail is
//! handled by the scalar kernel. The final zero-union guard runs per lane so
//! degenerate pairs resolve exactly like the scalar path.

use crate::geometry::{overlap_ratio, BBox};
use crate::kernel::scalar::IouScalar;
use crate::kernel::IouKernel;
use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load_lane(boxes: &[BBox], coord: impl Fn(&BBox) -> f32) -> f32x8 {
    f32x8::from([
        coord(&boxes[0]),
        coord(&boxes[1]),
        coord(&boxes[2]),
        coord(&boxes[3]),
        coord(&boxes[4]),
        coord(&boxes[5]),
        coord(&boxes[6]),
        coord(&boxes[7]),
    ])
}

/// SIMD-accelerated IoU kernel.
pub struct IouSimd;

impl IouKernel for IouSimd {
    fn iou_row(anchor: &BBox, others: &[BBox], out: &mut [f32]) {
        let len = others.len().min(out.len());
        let simd_end = len / LANES * LANES;

        let one = f32x8::splat(1.0);
        let zero = f32x8::ZERO;
        let ax1 = f32x8::splat(anchor.x1);
        let ay1 = f32x8::splat(anchor.y1);
        let ax2 = f32x8::splat(anchor.x2);
        let ay2 = f32x8::splat(anchor.y2);
        let area_a = f32x8::splat(anchor.inclusive_area());

        for (chunk, slots) in others[..simd_end]
            .chunks_exact(LANES)
            .zip(out[..simd_end].chunks_exact_mut(LANES))
        {
            let bx1 = load_lane(chunk, |b| b.x1);
            let by1 = load_lane(chunk, |b| b.y1);
            let bx2 = load_lane(chunk, |b| b.x2);
            let by2 = load_lane(chunk, |b| b.y2);

            let inter_w = (ax2.min(bx2) - ax1.max(bx1) + one).max(zero);
            let inter_h = (ay2.min(by2) - ay1.max(by1) + one).max(zero);
            let inter = inter_w * inter_h;
            let area_b = (bx2 - bx1 + one) * (by2 - by1 + one);
            let union = area_a + area_b - inter;

            let inter = inter.to_array();
            let union = union.to_array();
            for lane in 0..LANES {
                slots[lane] = overlap_ratio(inter[lane], union[lane]);
            }
        }

        IouScalar::iou_row(anchor, &others[simd_end..len], &mut out[simd_end..len]);
    }
}
