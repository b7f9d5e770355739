// Detector facade: confidence filtering, box rescaling, clean-category
// filtering, and running statistics.

use nutricycle::config::DetectionConfig;
use nutricycle::detect::{BoundingBox, DetectionBackend, Detector, RawDetection, WasteCategory};
use nutricycle::frame::Frame;
use std::sync::Arc;

/// Backend that replays a fixed set of raw detections.
struct FixedBackend {
    raw: Vec<RawDetection>,
}

impl DetectionBackend for FixedBackend {
    fn infer(&self, _frame: &Frame) -> anyhow::Result<Vec<RawDetection>> {
        Ok(self.raw.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct FailingBackend;

impl DetectionBackend for FailingBackend {
    fn infer(&self, _frame: &Frame) -> anyhow::Result<Vec<RawDetection>> {
        anyhow::bail!("model exploded")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn raw(label: &str, confidence: f32, bbox: BoundingBox) -> RawDetection {
    RawDetection {
        label: label.to_string(),
        confidence,
        bbox,
    }
}

fn detector_with(raw: Vec<RawDetection>, config: &DetectionConfig) -> Detector {
    Detector::new(Arc::new(FixedBackend { raw }), config)
}

#[test]
fn rescales_boxes_with_independent_axis_factors() {
    let config = DetectionConfig {
        inference_size: 320,
        ..DetectionConfig::default()
    };
    let detector = detector_with(
        vec![raw("bottle", 0.8, BoundingBox::new(10.0, 20.0, 30.0, 40.0))],
        &config,
    );

    // 640x480 frame against 320x320 inference: sx = 2.0, sy = 1.5.
    let frame = Frame::solid(640, 480, [0, 0, 0]);
    let detections = detector.detect_frame(&frame).unwrap();

    assert_eq!(detections.len(), 1);
    let bbox = detections[0].bbox;
    assert_eq!(bbox.x1, 20.0);
    assert_eq!(bbox.y1, 30.0);
    assert_eq!(bbox.x2, 60.0);
    assert_eq!(bbox.y2, 60.0);
}

#[test]
fn rescaled_boxes_stay_within_frame_bounds() {
    let config = DetectionConfig {
        inference_size: 320,
        ..DetectionConfig::default()
    };
    let detector = detector_with(
        vec![raw("bottle", 0.9, BoundingBox::new(-5.0, 0.0, 320.0, 400.0))],
        &config,
    );

    let frame = Frame::solid(640, 480, [0, 0, 0]);
    let bbox = detector.detect_frame(&frame).unwrap()[0].bbox;

    assert!(bbox.x1 >= 0.0 && bbox.y1 >= 0.0);
    assert!(bbox.x2 <= 640.0);
    assert!(bbox.y2 <= 480.0);
}

#[test]
fn drops_detections_below_confidence_threshold() {
    let config = DetectionConfig::default(); // threshold 0.5
    let detector = detector_with(
        vec![
            raw("bottle", 0.49, BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            raw("fork", 0.51, BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
        ],
        &config,
    );

    let frame = Frame::solid(320, 320, [0, 0, 0]);
    let detections = detector.detect_frame(&frame).unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].category, WasteCategory::Metal);
}

#[test]
fn confidence_is_always_within_unit_interval() {
    let config = DetectionConfig::default();
    let detector = detector_with(
        vec![raw("bottle", 1.2, BoundingBox::new(0.0, 0.0, 1.0, 1.0))],
        &config,
    );

    let frame = Frame::solid(320, 320, [0, 0, 0]);
    let detections = detector.detect_frame(&frame).unwrap();

    assert_eq!(detections.len(), 1);
    assert!(detections[0].confidence <= 1.0);
    assert!(detections[0].confidence >= 0.0);
}

#[test]
fn clean_category_is_filtered_but_still_counted() {
    let config = DetectionConfig::default(); // filter_clean = true
    let detector = detector_with(
        vec![
            raw("broccoli", 0.9, BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            raw("bottle", 0.8, BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
        ],
        &config,
    );

    let frame = Frame::solid(320, 320, [0, 0, 0]);
    let detections = detector.detect_frame(&frame).unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].category, WasteCategory::Plastic);

    let stats = detector.stats();
    assert_eq!(stats[&WasteCategory::LeafyVegetable], 1);
    assert_eq!(stats[&WasteCategory::Plastic], 1);
    assert_eq!(detector.contamination_count(), 1);
}

#[test]
fn unfiltered_mode_returns_clean_detections_too() {
    let config = DetectionConfig {
        filter_clean: false,
        ..DetectionConfig::default()
    };
    let detector = detector_with(
        vec![raw("broccoli", 0.9, BoundingBox::new(0.0, 0.0, 1.0, 1.0))],
        &config,
    );

    let frame = Frame::solid(320, 320, [0, 0, 0]);
    let detections = detector.detect_frame(&frame).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].category, WasteCategory::LeafyVegetable);
}

#[test]
fn reset_zeroes_all_categories() {
    let config = DetectionConfig::default();
    let detector = detector_with(
        vec![raw("bottle", 0.9, BoundingBox::new(0.0, 0.0, 1.0, 1.0))],
        &config,
    );

    let frame = Frame::solid(320, 320, [0, 0, 0]);
    detector.detect_frame(&frame).unwrap();
    assert_eq!(detector.contamination_count(), 1);

    detector.reset_stats();
    assert_eq!(detector.contamination_count(), 0);

    let stats = detector.stats();
    assert_eq!(stats.len(), WasteCategory::ALL.len());
    assert!(stats.values().all(|&count| count == 0));
}

#[test]
fn backend_failure_propagates_as_error() {
    let config = DetectionConfig::default();
    let detector = Detector::new(Arc::new(FailingBackend), &config);

    let frame = Frame::solid(320, 320, [0, 0, 0]);
    assert!(detector.detect_frame(&frame).is_err());
}
