//! Python bindings for the boxsift post-processing library.
//!
//! Exposes IoU, greedy NMS, ranked filtering and detection decoding over
//! numpy arrays.

use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use boxsift::{
    BBox, ClassificationPrediction as RustPrediction, DecodeParams, Detection as RustDetection,
    DetectionTensors, NmsConfig as RustNmsConfig, RankParams, ScoreOrder, SiftError,
};

/// Convert a SiftError to a Python exception.
fn to_py_err(err: SiftError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_order(order: &str) -> PyResult<ScoreOrder> {
    match order.to_lowercase().as_str() {
        "ascending" => Ok(ScoreOrder::Ascending),
        "descending" => Ok(ScoreOrder::Descending),
        _ => Err(PyValueError::new_err(
            "order must be 'ascending' or 'descending'",
        )),
    }
}

/// Borrows an `(N, 4)` box array as flat `[x1, y1, x2, y2, ...]` data.
fn box_rows<'a>(boxes: &'a PyReadonlyArray2<'_, f32>) -> PyResult<&'a [f32]> {
    boxsift::check_box_shape(boxes.shape()).map_err(to_py_err)?;
    Ok(boxes.as_slice()?)
}

fn boxes_from_array(boxes: &PyReadonlyArray2<'_, f32>) -> PyResult<Vec<BBox>> {
    Ok(box_rows(boxes)?
        .chunks_exact(4)
        .map(|c| BBox::new(c[0], c[1], c[2], c[3]))
        .collect())
}

/// A decoded detection.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    #[pyo3(get)]
    pub class_index: usize,
    /// Label, or None when the class index has no label.
    #[pyo3(get)]
    pub class_name: Option<String>,
    #[pyo3(get)]
    pub score: f32,
    /// Box as (x1, y1, x2, y2).
    #[pyo3(get)]
    pub bbox: (f32, f32, f32, f32),
}

#[pymethods]
impl Detection {
    /// Box as (x, y, width, height).
    #[getter]
    fn rect(&self) -> (f32, f32, f32, f32) {
        let (x1, y1, x2, y2) = self.bbox;
        (x1, y1, x2 - x1, y2 - y1)
    }

    fn __repr__(&self) -> String {
        format!(
            "Detection(class_index={}, class_name={:?}, score={:.4}, bbox={:?})",
            self.class_index, self.class_name, self.score, self.bbox
        )
    }
}

impl From<RustDetection> for Detection {
    fn from(d: RustDetection) -> Self {
        Self {
            class_index: d.class_index,
            class_name: d.class_name,
            score: d.score,
            bbox: (d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2),
        }
    }
}

/// A ranked classification result.
#[pyclass]
#[derive(Clone)]
pub struct Prediction {
    #[pyo3(get)]
    pub index: usize,
    #[pyo3(get)]
    pub label: String,
    #[pyo3(get)]
    pub score: f32,
}

#[pymethods]
impl Prediction {
    fn __repr__(&self) -> String {
        format!(
            "Prediction(index={}, label='{}', score={:.4})",
            self.index, self.label, self.score
        )
    }
}

impl From<RustPrediction> for Prediction {
    fn from(p: RustPrediction) -> Self {
        Self {
            index: p.index,
            label: p.label,
            score: p.score,
        }
    }
}

/// Configuration for suppressing detections.
#[pyclass]
#[derive(Clone)]
pub struct NmsConfig {
    inner: RustNmsConfig,
}

#[pymethods]
impl NmsConfig {
    /// Create a new NmsConfig.
    ///
    /// Args:
    ///     iou_threshold: Overlap above which a box is suppressed (default: 0.45)
    ///     class_aware: Only suppress boxes of the same class (default: False)
    ///     parallel: Evaluate overlaps on the thread pool (default: False)
    #[new]
    #[pyo3(signature = (iou_threshold = 0.45, class_aware = false, parallel = false))]
    fn new(iou_threshold: f32, class_aware: bool, parallel: bool) -> PyResult<Self> {
        let inner = RustNmsConfig {
            iou_threshold,
            class_aware,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "NmsConfig(iou_threshold={}, class_aware={}, parallel={})",
            self.inner.iou_threshold, self.inner.class_aware, self.inner.parallel
        )
    }
}

/// Intersection-over-union of two (x1, y1, x2, y2) boxes, inclusive pixels.
#[pyfunction]
fn iou(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> f32 {
    boxsift::iou(
        &BBox::new(a.0, a.1, a.2, a.3),
        &BBox::new(b.0, b.1, b.2, b.3),
    )
}

/// Greedy NMS returning kept indices, highest score first.
///
/// Args:
///     boxes: float32 array of shape (N, 4)
///     scores: float32 array of shape (N,)
///     iou_threshold: suppression threshold (default: 0.45)
#[pyfunction]
#[pyo3(signature = (boxes, scores, iou_threshold = 0.45))]
fn nms(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: PyReadonlyArray1<'_, f32>,
    iou_threshold: f32,
) -> PyResult<Vec<usize>> {
    let boxes = boxes_from_array(&boxes)?;
    boxsift::nms_indices(&boxes, scores.as_slice()?, iou_threshold).map_err(to_py_err)
}

/// Rank scores against labels, keeping those strictly above `threshold`.
#[pyfunction]
#[pyo3(signature = (scores, labels, threshold = 0.0, top = None))]
fn top_k(
    scores: PyReadonlyArray1<'_, f32>,
    labels: Vec<String>,
    threshold: f32,
    top: Option<usize>,
) -> PyResult<Vec<Prediction>> {
    let preds = boxsift::top_k(scores.as_slice()?, &labels, RankParams { threshold, top })
        .map_err(to_py_err)?;
    Ok(preds.into_iter().map(Prediction::from).collect())
}

/// Decode the four detection tensors into detections.
///
/// Args:
///     boxes: float32 array of shape (N, 4)
///     scores, classes: float32 arrays of shape (N,)
///     count: valid-detection count
///     labels: class labels
///     threshold: minimum kept score, inclusive (default: 0.3)
///     order: "descending" or "ascending" (default: "descending")
///     nms: optional NmsConfig applied after decoding
#[pyfunction]
#[pyo3(signature = (
    boxes,
    scores,
    classes,
    count,
    labels,
    threshold = 0.3,
    order = "descending",
    nms = None
))]
#[allow(clippy::too_many_arguments)]
fn decode_detections(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: PyReadonlyArray1<'_, f32>,
    classes: PyReadonlyArray1<'_, f32>,
    count: f32,
    labels: Vec<String>,
    threshold: f32,
    order: &str,
    nms: Option<NmsConfig>,
) -> PyResult<Vec<Detection>> {
    let order = parse_order(order)?;
    let count = [count];
    let tensors = DetectionTensors {
        boxes: box_rows(&boxes)?,
        scores: scores.as_slice()?,
        classes: classes.as_slice()?,
        count: &count,
    };
    let params = DecodeParams { threshold, order };
    let mut dets = boxsift::decode_detections(&tensors, &labels, params).map_err(to_py_err)?;
    if let Some(cfg) = nms {
        dets = boxsift::suppress_detections(dets, &cfg.inner).map_err(to_py_err)?;
        if order == ScoreOrder::Ascending {
            dets.sort_by(|a, b| a.score.total_cmp(&b.score));
        }
    }
    Ok(dets.into_iter().map(Detection::from).collect())
}

/// Python module for boxsift post-processing.
#[pymodule]
fn _boxsift(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<Prediction>()?;
    m.add_class::<NmsConfig>()?;
    m.add_function(wrap_pyfunction!(iou, m)?)?;
    m.add_function(wrap_pyfunction!(nms, m)?)?;
    m.add_function(wrap_pyfunction!(top_k, m)?)?;
    m.add_function(wrap_pyfunction!(decode_detections, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
