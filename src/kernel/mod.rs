//! IoU row kernels.
//!
//! A row is the overlap of one anchor box against a slice of candidates, the
//! inner loop of greedy suppression. The scalar kernel is the reference; the
//! SIMD and rayon variants produce bit-identical rows for finite coordinates.

use crate::geometry::BBox;

/// Kernel trait for one-against-many overlap evaluation.
pub trait IouKernel {
    /// Writes `iou(anchor, others[i])` into `out[i]`.
    ///
    /// Only `min(others.len(), out.len())` entries are written.
    fn iou_row(anchor: &BBox, others: &[BBox], out: &mut [f32]);
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;
