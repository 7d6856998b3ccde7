//! Baseline scalar IoU kernel.

use crate::geometry::{iou, BBox};
use crate::kernel::IouKernel;

/// Straightforward per-box IoU kernel.
pub struct IouScalar;

impl IouKernel for IouScalar {
    fn iou_row(anchor: &BBox, others: &[BBox], out: &mut [f32]) {
        for (slot, other) in out.iter_mut().zip(others) {
            *slot = iou(anchor, other);
        }
    }
}
