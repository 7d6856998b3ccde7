//! Classification decoding over a single score tensor.

use crate::candidate::topk::{top_k, ClassificationPrediction, RankParams};
use crate::decode::RawInferenceOutput;
use crate::trace::{stage_counts, stage_span};
use crate::util::{SiftError, SiftResult};

/// Ranks the scores of `tensor` (or of the first output when `None`),
/// highest score first.
pub fn decode_classification<S: AsRef<str>>(
    output: &RawInferenceOutput,
    tensor: Option<&str>,
    labels: &[S],
    params: RankParams,
) -> SiftResult<Vec<ClassificationPrediction>> {
    let scores = match tensor {
        Some(name) => output.require(name)?,
        None => output.first().map(|(_, t)| t).ok_or(SiftError::NoOutputs)?,
    };
    let _span = stage_span!("decode_classification", classes = scores.len()).entered();

    let predictions = top_k(scores.data(), labels, params)?;
    stage_counts!("classes_ranked", kept = predictions.len());
    Ok(predictions)
}
