#![cfg(feature = "rayon")]

use boxsift::{suppress_detections, BBox, Detection, NmsConfig};

fn make_scene(n: usize) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = ((i * 37) % 640) as f32;
            let y = ((i * 91) % 480) as f32;
            let w = 20.0 + ((i * 13) % 60) as f32;
            let h = 20.0 + ((i * 29) % 50) as f32;
            Detection {
                class_index: i % 5,
                class_name: None,
                score: ((i * 7919) % 1000) as f32 / 1000.0,
                bbox: BBox::new(x, y, x + w, y + h),
            }
        })
        .collect()
}

#[test]
fn parallel_matches_sequential_suppression() {
    let scene = make_scene(4000);
    for class_aware in [false, true] {
        let base = NmsConfig {
            iou_threshold: 0.4,
            class_aware,
            parallel: false,
        };
        let sequential = suppress_detections(scene.clone(), &base).unwrap();
        let parallel = suppress_detections(
            scene.clone(),
            &NmsConfig {
                parallel: true,
                ..base
            },
        )
        .unwrap();
        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }
}
