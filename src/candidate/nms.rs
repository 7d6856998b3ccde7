//! Greedy IoU non-maximum suppression.
//!
//! Candidates are visited in descending score order. The head of the queue is
//! accepted and every remaining candidate overlapping it by more than the
//! threshold is dropped; the loop repeats until the queue is empty.

use crate::candidate::topk::{sort_entries_desc, ScoreEntry};
use crate::decode::Detection;
use crate::geometry::BBox;
use crate::kernel::IouKernel;
use crate::trace::{stage_counts, stage_span};
use crate::util::{SiftError, SiftResult};

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::IouScalar as Iou;
#[cfg(feature = "simd")]
use crate::kernel::simd::IouSimd as Iou;

/// Configuration for suppressing decoded detections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NmsConfig {
    /// Candidates whose IoU with an accepted box exceeds this are dropped.
    pub iou_threshold: f32,
    /// Only boxes of the same class suppress each other.
    pub class_aware: bool,
    /// Evaluate IoU rows on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.45,
            class_aware: false,
            parallel: false,
        }
    }
}

impl NmsConfig {
    /// Checks that the threshold is a finite value in `[0, 1]`.
    pub fn validate(&self) -> SiftResult<()> {
        if !self.iou_threshold.is_finite() || !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(SiftError::InvalidConfig {
                reason: "iou_threshold must be within [0, 1]",
            });
        }
        Ok(())
    }
}

#[cfg(feature = "rayon")]
fn iou_row(anchor: &BBox, others: &[BBox], out: &mut [f32], parallel: bool) {
    if parallel {
        crate::kernel::rayon::iou_row_par::<Iou>(anchor, others, out);
    } else {
        Iou::iou_row(anchor, others, out);
    }
}

#[cfg(not(feature = "rayon"))]
fn iou_row(anchor: &BBox, others: &[BBox], out: &mut [f32], _parallel: bool) {
    Iou::iou_row(anchor, others, out);
}

fn greedy_suppress(
    boxes: &[BBox],
    scores: &[f32],
    classes: Option<&[usize]>,
    iou_threshold: f32,
    parallel: bool,
) -> Vec<usize> {
    let _span = stage_span!("nms", candidates = boxes.len()).entered();

    let mut ranked: Vec<ScoreEntry> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| ScoreEntry { index, score })
        .collect();
    sort_entries_desc(&mut ranked);
    let mut queue: Vec<usize> = ranked.into_iter().map(|entry| entry.index).collect();

    let mut keep = Vec::new();
    let mut others: Vec<BBox> = Vec::with_capacity(queue.len());
    let mut row: Vec<f32> = Vec::with_capacity(queue.len());

    while !queue.is_empty() {
        let best = queue.remove(0);
        keep.push(best);
        if queue.is_empty() {
            break;
        }

        others.clear();
        others.extend(queue.iter().map(|&idx| boxes[idx]));
        row.clear();
        row.resize(queue.len(), 0.0);
        iou_row(&boxes[best], &others, &mut row, parallel);

        let mut overlaps = row.iter();
        queue.retain(|&idx| {
            let overlap = overlaps.next().copied().unwrap_or(0.0);
            let same_class = classes.map_or(true, |classes| classes[idx] == classes[best]);
            !(same_class && overlap > iou_threshold)
        });
    }

    stage_counts!(
        "nms_done",
        kept = keep.len(),
        suppressed = boxes.len() - keep.len()
    );
    keep
}

/// Applies greedy NMS and returns the indices of the kept boxes, highest
/// score first.
///
/// NaN scores rank below every number; equal scores keep input order.
pub fn nms_indices(boxes: &[BBox], scores: &[f32], iou_threshold: f32) -> SiftResult<Vec<usize>> {
    if boxes.len() != scores.len() {
        return Err(SiftError::LengthMismatch {
            expected: boxes.len(),
            got: scores.len(),
            context: "nms scores",
        });
    }
    Ok(greedy_suppress(boxes, scores, None, iou_threshold, false))
}

/// Suppresses overlapping detections, returning the survivors unchanged in
/// acceptance order.
pub fn suppress_detections(
    detections: Vec<Detection>,
    cfg: &NmsConfig,
) -> SiftResult<Vec<Detection>> {
    cfg.validate()?;

    let boxes: Vec<BBox> = detections.iter().map(|det| det.bbox).collect();
    let scores: Vec<f32> = detections.iter().map(|det| det.score).collect();
    let classes: Vec<usize> = detections.iter().map(|det| det.class_index).collect();
    let keep = greedy_suppress(
        &boxes,
        &scores,
        cfg.class_aware.then_some(classes.as_slice()),
        cfg.iou_threshold,
        cfg.parallel,
    );

    let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
    Ok(keep
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}
