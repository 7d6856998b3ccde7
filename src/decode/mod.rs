//! Raw inference outputs and their decoding into predictions.
//!
//! An inference engine reports named output tensors whose values may arrive
//! nested (one level per dimension) or already flat. `OutputTensor` always
//! stores the depth-first flattened data next to the reported shape, so the
//! decoders only ever index flat slices.

use crate::util::{SiftError, SiftResult};

mod classification;
mod detection;

pub use classification::decode_classification;
pub use detection::{
    check_box_shape, decode_detections, DecodeParams, Detection, DetectionOutputNames,
    DetectionTensors, ScoreOrder,
};

/// Numeric value as produced by an inference engine, possibly nested.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorValue {
    Scalar(f32),
    List(Vec<TensorValue>),
}

impl TensorValue {
    /// Flattens the value depth-first into a single sequence.
    pub fn flatten(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<f32>) {
        match self {
            TensorValue::Scalar(value) => out.push(*value),
            TensorValue::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl From<f32> for TensorValue {
    fn from(value: f32) -> Self {
        TensorValue::Scalar(value)
    }
}

impl From<Vec<f32>> for TensorValue {
    fn from(values: Vec<f32>) -> Self {
        TensorValue::List(values.into_iter().map(TensorValue::Scalar).collect())
    }
}

impl From<Vec<Vec<f32>>> for TensorValue {
    fn from(rows: Vec<Vec<f32>>) -> Self {
        TensorValue::List(rows.into_iter().map(TensorValue::from).collect())
    }
}

/// Flat output tensor with its reported shape.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputTensor {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl OutputTensor {
    /// Creates a tensor from flat data.
    ///
    /// An empty `shape` means "unknown"; otherwise its element count must
    /// match `data.len()`.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> SiftResult<Self> {
        if !shape.is_empty() {
            let product = shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim));
            match product {
                Some(expected) if expected == data.len() => {}
                // An overflowing product reports `usize::MAX` as the expectation.
                expected => {
                    return Err(SiftError::ShapeMismatch {
                        shape,
                        expected: expected.unwrap_or(usize::MAX),
                        got: data.len(),
                    });
                }
            }
        }
        Ok(Self { data, shape })
    }

    /// Creates a one-dimensional tensor.
    pub fn from_flat(data: Vec<f32>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Flattens a nested value and checks it against `shape`.
    pub fn from_nested(value: &TensorValue, shape: Vec<usize>) -> SiftResult<Self> {
        Self::new(value.flatten(), shape)
    }

    /// Returns the flattened values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the reported shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of flattened values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true when the tensor holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Named output tensors of one inference call, in engine order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawInferenceOutput {
    outputs: Vec<(String, OutputTensor)>,
}

impl RawInferenceOutput {
    /// Creates an empty output set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a named tensor, keeping the position of a replaced one.
    pub fn insert(&mut self, name: impl Into<String>, tensor: OutputTensor) {
        let name = name.into();
        match self.outputs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = tensor,
            None => self.outputs.push((name, tensor)),
        }
    }

    /// Builder form of [`RawInferenceOutput::insert`].
    pub fn with_output(mut self, name: impl Into<String>, tensor: OutputTensor) -> Self {
        self.insert(name, tensor);
        self
    }

    /// Looks a tensor up by name.
    pub fn get(&self, name: &str) -> Option<&OutputTensor> {
        self.outputs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, tensor)| tensor)
    }

    /// Returns the first tensor in engine order.
    pub fn first(&self) -> Option<(&str, &OutputTensor)> {
        self.outputs
            .first()
            .map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Iterates over tensors in engine order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputTensor)> {
        self.outputs
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Returns the number of tensors.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true when no tensors are present.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub(crate) fn require(&self, name: &str) -> SiftResult<&OutputTensor> {
        self.get(name).ok_or_else(|| SiftError::MissingOutput {
            name: name.to_owned(),
        })
    }
}

impl<N: Into<String>> FromIterator<(N, OutputTensor)> for RawInferenceOutput {
    fn from_iter<I: IntoIterator<Item = (N, OutputTensor)>>(iter: I) -> Self {
        let mut output = Self::new();
        for (name, tensor) in iter {
            output.insert(name, tensor);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputTensor, RawInferenceOutput, TensorValue};
    use crate::util::SiftError;

    #[test]
    fn flatten_is_depth_first() {
        let value = TensorValue::List(vec![
            TensorValue::from(vec![1.0, 2.0]),
            TensorValue::List(vec![TensorValue::Scalar(3.0), TensorValue::from(vec![4.0])]),
            TensorValue::Scalar(5.0),
        ]);
        assert_eq!(value.flatten(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn shape_must_describe_data() {
        let value = TensorValue::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let tensor = OutputTensor::from_nested(&value, vec![2, 2]).unwrap();
        assert_eq!(tensor.data(), &[1.0, 2.0, 3.0, 4.0]);

        let err = OutputTensor::from_nested(&value, vec![1, 3]).unwrap_err();
        assert_eq!(
            err,
            SiftError::ShapeMismatch {
                shape: vec![1, 3],
                expected: 3,
                got: 4,
            }
        );
        assert!(OutputTensor::new(vec![1.0], Vec::new()).is_ok());
    }

    #[test]
    fn overflowing_shape_is_a_mismatch() {
        let err = OutputTensor::new(vec![1.0, 2.0], vec![usize::MAX, 2]).unwrap_err();
        assert_eq!(
            err,
            SiftError::ShapeMismatch {
                shape: vec![usize::MAX, 2],
                expected: usize::MAX,
                got: 2,
            }
        );
    }

    #[test]
    fn outputs_keep_engine_order() {
        let output: RawInferenceOutput = [
            ("logits", OutputTensor::from_flat(vec![0.1])),
            ("aux", OutputTensor::from_flat(vec![0.2])),
        ]
        .into_iter()
        .collect();
        assert_eq!(output.first().map(|(name, _)| name), Some("logits"));

        let output = output.with_output("logits", OutputTensor::from_flat(vec![0.9]));
        assert_eq!(output.len(), 2);
        assert_eq!(output.first().unwrap().1.data(), &[0.9]);
        assert!(output.get("missing").is_none());
    }
}
