use boxsift::lowlevel::{IouKernel, IouScalar};
use boxsift::{
    decode_detections, nms_indices, suppress_detections, top_k, BBox, DecodeParams, Detection,
    DetectionTensors, NmsConfig, RankParams,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn make_boxes(n: usize) -> (Vec<BBox>, Vec<f32>) {
    let mut boxes = Vec::with_capacity(n);
    let mut scores = Vec::with_capacity(n);
    for i in 0..n {
        let x = ((i * 37) % 640) as f32;
        let y = ((i * 91) % 480) as f32;
        let w = 24.0 + ((i * 13) % 80) as f32;
        let h = 24.0 + ((i * 29) % 60) as f32;
        boxes.push(BBox::new(x, y, x + w, y + h));
        scores.push(((i * 7919) % 1000) as f32 / 1000.0);
    }
    (boxes, scores)
}

fn bench_postprocess(c: &mut Criterion) {
    let (boxes, scores) = make_boxes(2000);

    c.bench_function("iou_row_scalar_2000", |b| {
        let mut out = vec![0.0f32; boxes.len()];
        b.iter(|| {
            IouScalar::iou_row(&boxes[0], black_box(&boxes), &mut out);
            black_box(out[1])
        });
    });

    c.bench_function("nms_indices_2000", |b| {
        b.iter(|| black_box(nms_indices(&boxes, &scores, 0.45).unwrap()));
    });

    let detections: Vec<Detection> = boxes
        .iter()
        .zip(scores.iter())
        .enumerate()
        .map(|(i, (bbox, &score))| Detection {
            class_index: i % 80,
            class_name: None,
            score,
            bbox: *bbox,
        })
        .collect();

    c.bench_function("suppress_detections_class_aware_2000", |b| {
        let cfg = NmsConfig {
            class_aware: true,
            ..NmsConfig::default()
        };
        b.iter(|| black_box(suppress_detections(detections.clone(), &cfg).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let cfg = NmsConfig {
            parallel: true,
            ..NmsConfig::default()
        };
        c.bench_function("suppress_detections_parallel_2000", |b| {
            b.iter(|| black_box(suppress_detections(detections.clone(), &cfg).unwrap()));
        });
    }

    let flat_boxes: Vec<f32> = boxes.iter().flat_map(|b| b.as_array()).collect();
    let classes: Vec<f32> = (0..boxes.len()).map(|i| (i % 80) as f32).collect();
    let count = [boxes.len() as f32];
    let labels: Vec<String> = (0..80).map(|i| format!("class_{i}")).collect();
    c.bench_function("decode_detections_2000", |b| {
        let tensors = DetectionTensors {
            boxes: &flat_boxes,
            scores: &scores,
            classes: &classes,
            count: &count,
        };
        b.iter(|| {
            black_box(decode_detections(&tensors, &labels, DecodeParams::default()).unwrap())
        });
    });

    let logits: Vec<f32> = (0..1000).map(|i| ((i * 611) % 997) as f32 / 997.0).collect();
    let class_labels: Vec<String> = (0..1000).map(|i| format!("class_{i}")).collect();
    c.bench_function("top_k_1000_top5", |b| {
        let params = RankParams {
            threshold: 0.0,
            top: Some(5),
        };
        b.iter(|| black_box(top_k(&logits, &class_labels, params).unwrap()));
    });
}

criterion_group!(benches, bench_postprocess);
criterion_main!(benches);
