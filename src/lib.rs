//! boxsift turns raw detection and classification tensors into ranked,
//! de-duplicated predictions.
//!
//! The crate covers box decoding, confidence thresholding, top-k ranking of
//! class scores and greedy IoU non-maximum suppression. Inference itself is
//! delegated to an injected [`InferenceAdapter`]. IoU rows can run with SIMD
//! (`simd` feature) or on the rayon pool (`rayon` feature).

mod candidate;
pub mod decode;
pub mod geometry;
pub mod kernel;
pub mod lowlevel;
pub mod pipeline;
mod trace;
pub mod util;

pub use candidate::nms::{nms_indices, suppress_detections, NmsConfig};
pub use candidate::topk::{top_k, ClassificationPrediction, RankParams};
pub use decode::{
    check_box_shape, decode_classification, decode_detections, DecodeParams, Detection,
    DetectionOutputNames, DetectionTensors, OutputTensor, RawInferenceOutput, ScoreOrder,
    TensorValue,
};
pub use geometry::{iou, BBox, Rect};
pub use pipeline::{
    Classifier, ClassifierConfig, Detector, DetectorConfig, FormRef, InferenceAdapter,
    InferenceRequest, InferenceTarget, Normalization, PipelineError, TensorDtype, TensorLayout,
};
pub use util::{SiftError, SiftResult};
