//! Low-level building blocks for custom post-processing.
//!
//! These expose the IoU kernels and the bounded Top-K collector used inside
//! the high-level functions. Most users should prefer [`crate::nms_indices`],
//! [`crate::top_k`] and the pipeline front ends.

pub use crate::candidate::topk::{ScoreEntry, TopK};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::iou_row_par;
pub use crate::kernel::scalar::IouScalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::IouSimd;
pub use crate::kernel::IouKernel;
