//! End-to-end detection and classification front ends.
//!
//! The inference engine is an injected [`InferenceAdapter`]; the pipeline
//! resolves its configuration into a request once, hands it to the adapter
//! and post-processes whatever comes back. Adapter failures are returned
//! unchanged and never retried.

mod config;

pub use config::{
    ClassifierConfig, DetectorConfig, FormRef, InferenceRequest, InferenceTarget, Normalization,
    TensorDtype, TensorLayout,
};

use crate::candidate::nms::suppress_detections;
use crate::candidate::topk::{ClassificationPrediction, RankParams};
use crate::decode::{
    decode_classification, decode_detections, DecodeParams, Detection, DetectionTensors,
    RawInferenceOutput, ScoreOrder,
};
use crate::trace::{stage_counts, stage_span};
use crate::util::{SiftError, SiftResult};
use thiserror::Error;

/// Inference engine collaborator.
pub trait InferenceAdapter {
    /// Error reported by the engine.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the model described by `request` and returns its named outputs.
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<RawInferenceOutput, Self::Error>;
}

impl<A: InferenceAdapter + ?Sized> InferenceAdapter for &A {
    type Error = A::Error;

    fn infer(&self, request: &InferenceRequest<'_>) -> Result<RawInferenceOutput, Self::Error> {
        (**self).infer(request)
    }
}

/// Failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError<E: std::error::Error + 'static> {
    /// The inference engine failed.
    #[error("inference failed: {0}")]
    Upstream(#[source] E),
    /// The engine output could not be post-processed.
    #[error(transparent)]
    Decode(#[from] SiftError),
}

/// Object detector over an injected inference engine.
pub struct Detector<A> {
    adapter: A,
    labels: Vec<String>,
    cfg: DetectorConfig,
}

impl<A: InferenceAdapter> Detector<A> {
    /// Creates a detector with the default configuration.
    pub fn new(adapter: A, labels: Vec<String>) -> Self {
        Self {
            adapter,
            labels,
            cfg: DetectorConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: DetectorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.cfg
    }

    /// Returns the label table.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Runs inference on `target` and decodes its detections.
    pub fn detect(
        &self,
        target: &InferenceTarget,
    ) -> Result<Vec<Detection>, PipelineError<A::Error>> {
        self.cfg.validate()?;
        let _span = stage_span!("detect", model = self.cfg.model.as_str()).entered();

        let request = self.cfg.request(target);
        let output = self.adapter.infer(&request).map_err(PipelineError::Upstream)?;
        Ok(self.decode(&output)?)
    }

    /// Post-processes an output that is already available.
    ///
    /// The configuration is validated first, as in [`Detector::detect`].
    pub fn decode(&self, output: &RawInferenceOutput) -> SiftResult<Vec<Detection>> {
        self.cfg.validate()?;
        let tensors = DetectionTensors::from_output(output, &self.cfg.outputs)?;
        let detections = decode_detections(
            &tensors,
            &self.labels,
            DecodeParams {
                threshold: self.cfg.threshold,
                order: self.cfg.order,
            },
        )?;

        let Some(nms) = &self.cfg.nms else {
            return Ok(detections);
        };
        let before = detections.len();
        let mut kept = suppress_detections(detections, nms)?;
        // Suppression yields best-first; restore the configured order.
        if self.cfg.order == ScoreOrder::Ascending {
            kept.sort_by(|a, b| a.score.total_cmp(&b.score));
        }
        stage_counts!("detections_suppressed", before = before, after = kept.len());
        Ok(kept)
    }
}

/// Image classifier over an injected inference engine.
pub struct Classifier<A> {
    adapter: A,
    labels: Vec<String>,
    cfg: ClassifierConfig,
}

impl<A: InferenceAdapter> Classifier<A> {
    /// Creates a classifier with the default configuration.
    pub fn new(adapter: A, labels: Vec<String>) -> Self {
        Self {
            adapter,
            labels,
            cfg: ClassifierConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: ClassifierConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Returns the label table.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Runs inference on `target` and ranks the class scores.
    pub fn classify(
        &self,
        target: &InferenceTarget,
    ) -> Result<Vec<ClassificationPrediction>, PipelineError<A::Error>> {
        self.cfg.validate()?;
        let _span = stage_span!("classify", model = self.cfg.model.as_str()).entered();

        let request = self.cfg.request(target);
        let output = self.adapter.infer(&request).map_err(PipelineError::Upstream)?;
        Ok(self.decode(&output)?)
    }

    /// Post-processes an output that is already available.
    ///
    /// The configuration is validated first, as in [`Classifier::classify`].
    pub fn decode(
        &self,
        output: &RawInferenceOutput,
    ) -> SiftResult<Vec<ClassificationPrediction>> {
        self.cfg.validate()?;
        decode_classification(
            output,
            self.cfg.output.as_deref(),
            &self.labels,
            RankParams {
                threshold: self.cfg.threshold,
                top: self.cfg.top,
            },
        )
    }
}
