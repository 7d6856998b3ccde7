//! Detection decoding from the four-tensor convention.
//!
//! Detection models report boxes (four values per detection), scores, class
//! indices and a valid-detection count whose first element is the number of
//! meaningful rows in the other three tensors.

use crate::decode::RawInferenceOutput;
use crate::geometry::{BBox, Rect};
use crate::trace::{stage_counts, stage_span};
use crate::util::math::to_index;
use crate::util::{SiftError, SiftResult};

/// A decoded detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Class index reported by the model.
    pub class_index: usize,
    /// Label for `class_index`; `None` when the label table is too short.
    pub class_name: Option<String>,
    /// Detection confidence.
    pub score: f32,
    /// Corner-form box in model units.
    pub bbox: BBox,
}

impl Detection {
    /// Returns the box as `{x, y, width, height}`.
    pub fn rect(&self) -> Rect {
        self.bbox.to_rect()
    }
}

/// Ordering of decoded detections by score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreOrder {
    /// Lowest score first.
    Ascending,
    /// Highest score first.
    #[default]
    Descending,
}

/// Parameters for detection decoding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeParams {
    /// Detections scoring below this value are skipped; equal scores are kept.
    pub threshold: f32,
    /// Ordering of the returned detections.
    pub order: ScoreOrder,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            order: ScoreOrder::default(),
        }
    }
}

/// Names of the four detection output tensors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionOutputNames {
    pub boxes: String,
    pub scores: String,
    pub classes: String,
    pub count: String,
}

impl Default for DetectionOutputNames {
    fn default() -> Self {
        Self {
            boxes: "output_0".to_owned(),
            scores: "output_1".to_owned(),
            classes: "output_2".to_owned(),
            count: "output_3".to_owned(),
        }
    }
}

/// Borrowed flat views of the four detection tensors.
#[derive(Clone, Copy, Debug)]
pub struct DetectionTensors<'a> {
    /// `[x1, y1, x2, y2]` per detection.
    pub boxes: &'a [f32],
    pub scores: &'a [f32],
    pub classes: &'a [f32],
    /// Only the first element is read.
    pub count: &'a [f32],
}

/// Checks that a box tensor shape has rows of four coordinates.
///
/// Flat (rank 0 or 1) shapes carry no row width and are accepted; the
/// decoder then reads them with a stride of four.
pub fn check_box_shape(shape: &[usize]) -> SiftResult<()> {
    match shape {
        [_, .., columns] if *columns != 4 => Err(SiftError::InvalidBoxStride { columns: *columns }),
        _ => Ok(()),
    }
}

impl<'a> DetectionTensors<'a> {
    /// Looks the four tensors up by name.
    ///
    /// A box tensor whose reported rows are not four wide is rejected.
    pub fn from_output(
        output: &'a RawInferenceOutput,
        names: &DetectionOutputNames,
    ) -> SiftResult<Self> {
        let boxes = output.require(&names.boxes)?;
        check_box_shape(boxes.shape())?;
        Ok(Self {
            boxes: boxes.data(),
            scores: output.require(&names.scores)?.data(),
            classes: output.require(&names.classes)?.data(),
            count: output.require(&names.count)?.data(),
        })
    }

    fn valid_count(&self) -> SiftResult<usize> {
        let Some(&value) = self.count.first() else {
            return Ok(0);
        };
        if !value.is_finite() || value < 0.0 {
            return Err(SiftError::InvalidCount { value });
        }
        // Rows are visited while `i < value`, so a fractional count rounds up.
        let count = value.ceil() as usize;

        let needed_boxes = count.saturating_mul(4);
        if self.boxes.len() < needed_boxes {
            return Err(SiftError::BufferTooSmall {
                tensor: "boxes",
                needed: needed_boxes,
                got: self.boxes.len(),
            });
        }
        if self.scores.len() < count {
            return Err(SiftError::BufferTooSmall {
                tensor: "scores",
                needed: count,
                got: self.scores.len(),
            });
        }
        if self.classes.len() < count {
            return Err(SiftError::BufferTooSmall {
                tensor: "classes",
                needed: count,
                got: self.classes.len(),
            });
        }
        Ok(count)
    }
}

/// Decodes the valid detections scoring at least `params.threshold`.
///
/// No suppression is applied here; see [`crate::suppress_detections`].
pub fn decode_detections<S: AsRef<str>>(
    tensors: &DetectionTensors<'_>,
    labels: &[S],
    params: DecodeParams,
) -> SiftResult<Vec<Detection>> {
    let count = tensors.valid_count()?;
    let _span = stage_span!("decode_detections", count = count).entered();

    let mut detections = Vec::new();
    for i in 0..count {
        let score = tensors.scores[i];
        // Also skips NaN.
        if !(score >= params.threshold) {
            continue;
        }

        let raw_class = tensors.classes[i];
        let class_index = to_index(raw_class).ok_or(SiftError::InvalidClassIndex {
            detection: i,
            value: raw_class,
        })?;
        let class_name = labels
            .get(class_index)
            .map(|label| label.as_ref().to_owned());

        let coords = &tensors.boxes[4 * i..4 * i + 4];
        detections.push(Detection {
            class_index,
            class_name,
            score,
            bbox: BBox::new(coords[0], coords[1], coords[2], coords[3]),
        });
    }

    match params.order {
        ScoreOrder::Ascending => detections.sort_by(|a, b| a.score.total_cmp(&b.score)),
        ScoreOrder::Descending => detections.sort_by(|a, b| b.score.total_cmp(&a.score)),
    }

    stage_counts!(
        "detections_decoded",
        kept = detections.len(),
        skipped = count - detections.len()
    );
    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::{check_box_shape, decode_detections, DecodeParams, DetectionTensors, ScoreOrder};
    use crate::util::SiftError;

    const LABELS: [&str; 3] = ["cat", "dog", "bird"];

    #[test]
    fn fractional_class_index_is_rejected() {
        let tensors = DetectionTensors {
            boxes: &[0.0, 0.0, 1.0, 1.0],
            scores: &[0.9],
            classes: &[1.5],
            count: &[1.0],
        };
        let err = decode_detections(&tensors, &LABELS, DecodeParams::default()).unwrap_err();
        assert_eq!(
            err,
            SiftError::InvalidClassIndex {
                detection: 0,
                value: 1.5,
            }
        );
    }

    #[test]
    fn invalid_class_on_skipped_detection_is_ignored() {
        let tensors = DetectionTensors {
            boxes: &[0.0, 0.0, 1.0, 1.0],
            scores: &[0.1],
            classes: &[-1.0],
            count: &[1.0],
        };
        let dets = decode_detections(&tensors, &LABELS, DecodeParams::default()).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn short_box_tensor_is_reported() {
        let tensors = DetectionTensors {
            boxes: &[0.0, 0.0, 1.0, 1.0],
            scores: &[0.9, 0.8],
            classes: &[0.0, 1.0],
            count: &[2.0],
        };
        let err = decode_detections(&tensors, &LABELS, DecodeParams::default()).unwrap_err();
        assert_eq!(
            err,
            SiftError::BufferTooSmall {
                tensor: "boxes",
                needed: 8,
                got: 4,
            }
        );
    }

    #[test]
    fn negative_count_is_invalid() {
        let tensors = DetectionTensors {
            boxes: &[],
            scores: &[],
            classes: &[],
            count: &[-2.0],
        };
        let err = decode_detections(&tensors, &LABELS, DecodeParams::default()).unwrap_err();
        assert_eq!(err, SiftError::InvalidCount { value: -2.0 });
    }

    #[test]
    fn box_rows_must_be_four_wide() {
        assert!(check_box_shape(&[]).is_ok());
        assert!(check_box_shape(&[12]).is_ok());
        assert!(check_box_shape(&[3, 4]).is_ok());
        assert!(check_box_shape(&[1, 3, 4]).is_ok());
        assert_eq!(
            check_box_shape(&[4, 3]),
            Err(SiftError::InvalidBoxStride { columns: 3 })
        );
    }

    #[test]
    fn fractional_count_rounds_up() {
        let tensors = DetectionTensors {
            boxes: &[
                0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 5.0, 6.0, 6.0, 7.0, 7.0,
            ],
            scores: &[0.9, 0.8, 0.7, 0.6],
            classes: &[0.0, 1.0, 2.0, 0.0],
            count: &[2.5],
        };
        let dets = decode_detections(&tensors, &LABELS, DecodeParams::default()).unwrap();
        let scores: Vec<f32> = dets.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn fractional_count_needs_the_rounded_up_rows() {
        let tensors = DetectionTensors {
            boxes: &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0],
            scores: &[0.9, 0.8],
            classes: &[0.0, 1.0],
            count: &[1.5],
        };
        assert!(decode_detections(&tensors, &LABELS, DecodeParams::default()).is_ok());

        let short = DetectionTensors {
            count: &[2.5],
            ..tensors
        };
        let err = decode_detections(&short, &LABELS, DecodeParams::default()).unwrap_err();
        assert_eq!(
            err,
            SiftError::BufferTooSmall {
                tensor: "boxes",
                needed: 12,
                got: 8,
            }
        );
    }

    #[test]
    fn rows_past_count_are_ignored() {
        let tensors = DetectionTensors {
            boxes: &[0.0, 0.0, 1.0, 1.0, 5.0, 5.0, 9.0, 9.0],
            scores: &[0.4, 0.99],
            classes: &[0.0, 1.0],
            count: &[1.0],
        };
        let params = DecodeParams {
            threshold: 0.3,
            order: ScoreOrder::Descending,
        };
        let dets = decode_detections(&tensors, &LABELS, params).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_name.as_deref(), Some("cat"));
    }
}
