use boxsift::{
    Classifier, ClassifierConfig, Detection, DetectionOutputNames, Detector, DetectorConfig,
    InferenceAdapter, InferenceRequest, InferenceTarget, NmsConfig, Normalization, OutputTensor,
    RawInferenceOutput, ScoreOrder, TensorDtype, TensorLayout, TensorValue,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "BoxSift CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaskConfig {
    #[default]
    Detection,
    Classification,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OrderConfig {
    Ascending,
    Descending,
}

impl From<OrderConfig> for ScoreOrder {
    fn from(value: OrderConfig) -> Self {
        match value {
            OrderConfig::Ascending => ScoreOrder::Ascending,
            OrderConfig::Descending => ScoreOrder::Descending,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LayoutConfig {
    Hwc,
    Chw,
}

impl From<TensorLayout> for LayoutConfig {
    fn from(value: TensorLayout) -> Self {
        match value {
            TensorLayout::Hwc => LayoutConfig::Hwc,
            TensorLayout::Chw => LayoutConfig::Chw,
        }
    }
}

impl From<LayoutConfig> for TensorLayout {
    fn from(value: LayoutConfig) -> Self {
        match value {
            LayoutConfig::Hwc => TensorLayout::Hwc,
            LayoutConfig::Chw => TensorLayout::Chw,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DtypeConfig {
    Float,
    Uint8,
}

impl From<TensorDtype> for DtypeConfig {
    fn from(value: TensorDtype) -> Self {
        match value {
            TensorDtype::Float => DtypeConfig::Float,
            TensorDtype::Uint8 => DtypeConfig::Uint8,
        }
    }
}

impl From<DtypeConfig> for TensorDtype {
    fn from(value: DtypeConfig) -> Self {
        match value {
            DtypeConfig::Float => TensorDtype::Float,
            DtypeConfig::Uint8 => TensorDtype::Uint8,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NormalizationJson {
    mean: [f32; 3],
    std: [f32; 3],
}

impl From<Normalization> for NormalizationJson {
    fn from(value: Normalization) -> Self {
        Self {
            mean: value.mean,
            std: value.std,
        }
    }
}

impl From<NormalizationJson> for Normalization {
    fn from(value: NormalizationJson) -> Self {
        Self {
            mean: value.mean,
            std: value.std,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NmsConfigJson {
    iou_threshold: f32,
    class_aware: bool,
    parallel: bool,
}

impl Default for NmsConfigJson {
    fn default() -> Self {
        let cfg = NmsConfig::default();
        Self {
            iou_threshold: cfg.iou_threshold,
            class_aware: cfg.class_aware,
            parallel: cfg.parallel,
        }
    }
}

impl From<NmsConfigJson> for NmsConfig {
    fn from(value: NmsConfigJson) -> Self {
        Self {
            iou_threshold: value.iou_threshold,
            class_aware: value.class_aware,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OutputNamesJson {
    boxes: String,
    scores: String,
    classes: String,
    count: String,
}

impl Default for OutputNamesJson {
    fn default() -> Self {
        let names = DetectionOutputNames::default();
        Self {
            boxes: names.boxes,
            scores: names.scores,
            classes: names.classes,
            count: names.count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectionConfigJson {
    model: String,
    input_size: u32,
    layout: LayoutConfig,
    dtype: DtypeConfig,
    normalization: Option<NormalizationJson>,
    threshold: f32,
    order: OrderConfig,
    nms: Option<NmsConfigJson>,
    outputs: OutputNamesJson,
}

impl Default for DetectionConfigJson {
    fn default() -> Self {
        let cfg = DetectorConfig::default();
        Self {
            model: cfg.model,
            input_size: cfg.input_size,
            layout: cfg.layout.into(),
            dtype: cfg.dtype.into(),
            normalization: cfg.normalization.map(NormalizationJson::from),
            threshold: cfg.threshold,
            order: OrderConfig::Descending,
            nms: None,
            outputs: OutputNamesJson::default(),
        }
    }
}

impl From<DetectionConfigJson> for DetectorConfig {
    fn from(value: DetectionConfigJson) -> Self {
        Self {
            model: value.model,
            input_size: value.input_size,
            layout: value.layout.into(),
            dtype: value.dtype.into(),
            normalization: value.normalization.map(Normalization::from),
            threshold: value.threshold,
            order: value.order.into(),
            nms: value.nms.map(NmsConfig::from),
            outputs: DetectionOutputNames {
                boxes: value.outputs.boxes,
                scores: value.outputs.scores,
                classes: value.outputs.classes,
                count: value.outputs.count,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClassificationConfigJson {
    model: String,
    input_size: u32,
    layout: LayoutConfig,
    dtype: DtypeConfig,
    /// `null` sends raw pixels.
    normalization: Option<NormalizationJson>,
    threshold: f32,
    top: Option<usize>,
    output: Option<String>,
}

impl Default for ClassificationConfigJson {
    fn default() -> Self {
        let cfg = ClassifierConfig::default();
        Self {
            model: cfg.model,
            input_size: cfg.input_size,
            layout: cfg.layout.into(),
            dtype: cfg.dtype.into(),
            normalization: cfg.normalization.map(NormalizationJson::from),
            threshold: cfg.threshold,
            top: cfg.top,
            output: cfg.output,
        }
    }
}

impl From<ClassificationConfigJson> for ClassifierConfig {
    fn from(value: ClassificationConfigJson) -> Self {
        Self {
            model: value.model,
            input_size: value.input_size,
            layout: value.layout.into(),
            dtype: value.dtype.into(),
            normalization: value.normalization.map(Normalization::from),
            threshold: value.threshold,
            top: value.top,
            output: value.output,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    task: TaskConfig,
    outputs_path: String,
    labels: Option<Vec<String>>,
    labels_path: Option<String>,
    output_path: Option<String>,
    photo_id: String,
    detection: DetectionConfigJson,
    classification: ClassificationConfigJson,
}

/// Nested numeric value as written by an engine dump.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValueJson {
    Scalar(f32),
    List(Vec<ValueJson>),
}

impl From<ValueJson> for TensorValue {
    fn from(value: ValueJson) -> Self {
        match value {
            ValueJson::Scalar(v) => TensorValue::Scalar(v),
            ValueJson::List(items) => {
                TensorValue::List(items.into_iter().map(TensorValue::from).collect())
            }
        }
    }
}

/// One dumped tensor: either `{ "data": ..., "shape": [...] }` or bare values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TensorJson {
    Shaped {
        data: ValueJson,
        #[serde(default)]
        shape: Vec<usize>,
    },
    Bare(ValueJson),
}

#[derive(Debug, Error)]
enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed outputs file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Tensor(#[from] boxsift::SiftError),
}

/// Serves engine outputs previously dumped to a JSON file.
struct ReplayEngine {
    path: String,
}

impl InferenceAdapter for ReplayEngine {
    type Error = ReplayError;

    fn infer(&self, request: &InferenceRequest<'_>) -> Result<RawInferenceOutput, ReplayError> {
        tracing::info!(
            photo = %request.target.photo_id,
            model = request.model,
            input_size = request.input_size,
            layout = ?request.layout,
            dtype = ?request.dtype,
            "replaying recorded outputs"
        );
        let text = fs::read_to_string(&self.path).map_err(|source| ReplayError::Io {
            path: self.path.clone(),
            source,
        })?;
        let tensors: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)?;
        let mut output = RawInferenceOutput::new();
        for (name, value) in tensors {
            let tensor = match serde_json::from_value::<TensorJson>(value)? {
                TensorJson::Shaped { data, shape } => {
                    OutputTensor::from_nested(&data.into(), shape)?
                }
                TensorJson::Bare(data) => {
                    OutputTensor::from_flat(TensorValue::from(data).flatten())
                }
            };
            output.insert(name, tensor);
        }
        Ok(output)
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    class_index: usize,
    class_name: Option<String>,
    score: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        let rect = value.rect();
        Self {
            class_index: value.class_index,
            class_name: value.class_name,
            score: value.score,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictionRecord {
    index: usize,
    label: String,
    score: f32,
}

fn load_labels(config: &Config) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if let Some(labels) = &config.labels {
        return Ok(labels.clone());
    }
    match &config.labels_path {
        Some(path) => Ok(fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()),
        None => Err("either labels or labels_path must be set in the config".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("boxsift=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.outputs_path.is_empty() {
        return Err("outputs_path must be set in the config".into());
    }
    let labels = load_labels(&config)?;

    let engine = ReplayEngine {
        path: config.outputs_path.clone(),
    };
    let target = InferenceTarget::photo(config.photo_id.clone());

    let json = match config.task {
        TaskConfig::Detection => {
            let detector = Detector::new(engine, labels).with_config(config.detection.into());
            let records: Vec<DetectionRecord> = detector
                .detect(&target)?
                .into_iter()
                .map(DetectionRecord::from)
                .collect();
            serde_json::to_string_pretty(&records)?
        }
        TaskConfig::Classification => {
            let classifier =
                Classifier::new(engine, labels).with_config(config.classification.into());
            let records: Vec<PredictionRecord> = classifier
                .classify(&target)?
                .into_iter()
                .map(|p| PredictionRecord {
                    index: p.index,
                    label: p.label,
                    score: p.score,
                })
                .collect();
            serde_json::to_string_pretty(&records)?
        }
    };

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, EXAMPLE_JSON};
    use boxsift::{ClassifierConfig, DetectorConfig, Normalization, TensorDtype, TensorLayout};

    #[test]
    fn empty_sections_resolve_to_core_defaults() {
        let config: Config = serde_json::from_str(r#"{"outputs_path": "o.json"}"#).unwrap();
        assert_eq!(DetectorConfig::from(config.detection), DetectorConfig::default());
        assert_eq!(
            ClassifierConfig::from(config.classification),
            ClassifierConfig::default()
        );
    }

    #[test]
    fn input_format_fields_are_forwarded() {
        let config: Config = serde_json::from_str(
            r#"{
                "detection": {
                    "layout": "chw",
                    "dtype": "uint8",
                    "normalization": {"mean": [0.5, 0.5, 0.5], "std": [0.25, 0.25, 0.25]}
                },
                "classification": {"layout": "hwc", "normalization": null}
            }"#,
        )
        .unwrap();

        let det = DetectorConfig::from(config.detection);
        assert_eq!(det.layout, TensorLayout::Chw);
        assert_eq!(det.dtype, TensorDtype::Uint8);
        assert_eq!(
            det.normalization,
            Some(Normalization {
                mean: [0.5; 3],
                std: [0.25; 3],
            })
        );

        let cls = ClassifierConfig::from(config.classification);
        assert_eq!(cls.layout, TensorLayout::Hwc);
        assert_eq!(cls.dtype, TensorDtype::Float);
        assert_eq!(cls.normalization, None);
    }

    #[test]
    fn bundled_example_parses() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        let cls = ClassifierConfig::from(config.classification);
        let norm = cls.normalization.unwrap();
        let expected = Normalization::IMAGENET;
        let got = norm.mean.iter().chain(&norm.std);
        let want = expected.mean.iter().chain(&expected.std);
        for (got, want) in got.zip(want) {
            assert!((got - want).abs() < 1e-6);
        }
        assert_eq!(cls.top, Some(5));
    }
}
