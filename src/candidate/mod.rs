//! Candidate ranking and pruning.
//!
//! Includes thresholded top-k ranking for classification scores and greedy
//! IoU suppression for detections.

pub(crate) mod nms;
pub(crate) mod topk;
