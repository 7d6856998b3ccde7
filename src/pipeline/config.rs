//! Inference request description and per-task configuration.
//!
//! Every optional knob has its default in one place (the `Default` impls
//! below) and is resolved into an [`InferenceRequest`] once per call.

use crate::candidate::nms::NmsConfig;
use crate::decode::{DetectionOutputNames, ScoreOrder};
use crate::util::{SiftError, SiftResult};

/// Memory layout of the model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorLayout {
    /// Height, width, channels.
    Hwc,
    /// Channels, height, width.
    Chw,
}

/// Element type of the model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TensorDtype {
    Float,
    Uint8,
}

/// Per-channel input normalization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalization {
    /// ImageNet RGB statistics.
    pub const IMAGENET: Self = Self {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    fn validate(&self) -> SiftResult<()> {
        let finite = self.mean.iter().chain(self.std.iter()).all(|v| v.is_finite());
        if !finite || self.std.iter().any(|&s| s == 0.0) {
            return Err(SiftError::InvalidConfig {
                reason: "normalization needs finite mean and non-zero std",
            });
        }
        Ok(())
    }
}

/// Form whose photo is analysed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormRef {
    /// The form currently open in the host; resolved by the adapter.
    #[default]
    Current,
    Id(String),
    Name(String),
}

/// Photo to run inference on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceTarget {
    pub photo_id: String,
    pub form: FormRef,
}

impl InferenceTarget {
    /// Targets a photo of the current form.
    pub fn photo(photo_id: impl Into<String>) -> Self {
        Self {
            photo_id: photo_id.into(),
            form: FormRef::Current,
        }
    }

    /// Overrides the form reference.
    pub fn with_form(mut self, form: FormRef) -> Self {
        self.form = form;
        self
    }
}

/// Fully resolved request handed to an [`crate::InferenceAdapter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InferenceRequest<'a> {
    pub target: &'a InferenceTarget,
    pub model: &'a str,
    /// Square input edge length in pixels.
    pub input_size: u32,
    pub layout: TensorLayout,
    pub dtype: TensorDtype,
    pub normalization: Option<&'a Normalization>,
}

fn validate_common(model: &str, input_size: u32, threshold: f32) -> SiftResult<()> {
    if model.is_empty() {
        return Err(SiftError::InvalidConfig {
            reason: "model must not be empty",
        });
    }
    if input_size == 0 {
        return Err(SiftError::InvalidConfig {
            reason: "input_size must be at least 1",
        });
    }
    if !threshold.is_finite() {
        return Err(SiftError::InvalidConfig {
            reason: "threshold must be finite",
        });
    }
    Ok(())
}

/// Configuration for [`crate::Detector`].
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub model: String,
    pub input_size: u32,
    pub layout: TensorLayout,
    pub dtype: TensorDtype,
    pub normalization: Option<Normalization>,
    /// Minimum score kept by the decoder (inclusive).
    pub threshold: f32,
    pub outputs: DetectionOutputNames,
    pub order: ScoreOrder,
    /// Suppression applied after decoding; `None` returns raw detections.
    pub nms: Option<NmsConfig>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model: "yolov5m.ort".to_owned(),
            input_size: 640,
            layout: TensorLayout::Hwc,
            dtype: TensorDtype::Float,
            normalization: None,
            threshold: 0.3,
            outputs: DetectionOutputNames::default(),
            order: ScoreOrder::Descending,
            nms: None,
        }
    }
}

impl DetectorConfig {
    /// Validates model, sizes, thresholds and the optional NMS step.
    pub fn validate(&self) -> SiftResult<()> {
        validate_common(&self.model, self.input_size, self.threshold)?;
        if let Some(norm) = &self.normalization {
            norm.validate()?;
        }
        if let Some(nms) = &self.nms {
            nms.validate()?;
        }
        Ok(())
    }

    /// Builds the adapter request for `target`.
    pub fn request<'a>(&'a self, target: &'a InferenceTarget) -> InferenceRequest<'a> {
        InferenceRequest {
            target,
            model: &self.model,
            input_size: self.input_size,
            layout: self.layout,
            dtype: self.dtype,
            normalization: self.normalization.as_ref(),
        }
    }
}

/// Configuration for [`crate::Classifier`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierConfig {
    pub model: String,
    pub input_size: u32,
    pub layout: TensorLayout,
    pub dtype: TensorDtype,
    /// Defaults to ImageNet statistics; `None` sends raw pixels.
    pub normalization: Option<Normalization>,
    /// Scores must be strictly above this value.
    pub threshold: f32,
    pub top: Option<usize>,
    /// Score tensor name; `None` uses the first output.
    pub output: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "yolov5m-cls.ort".to_owned(),
            input_size: 224,
            layout: TensorLayout::Chw,
            dtype: TensorDtype::Float,
            normalization: Some(Normalization::IMAGENET),
            threshold: 0.0,
            top: None,
            output: None,
        }
    }
}

impl ClassifierConfig {
    /// Validates model, sizes and thresholds.
    pub fn validate(&self) -> SiftResult<()> {
        validate_common(&self.model, self.input_size, self.threshold)?;
        if let Some(norm) = &self.normalization {
            norm.validate()?;
        }
        Ok(())
    }

    /// Builds the adapter request for `target`.
    pub fn request<'a>(&'a self, target: &'a InferenceTarget) -> InferenceRequest<'a> {
        InferenceRequest {
            target,
            model: &self.model,
            input_size: self.input_size,
            layout: self.layout,
            dtype: self.dtype,
            normalization: self.normalization.as_ref(),
        }
    }
}
