// Session log: non-empty gating, JSON persistence, per-category summary.

use chrono::Utc;
use nutricycle::detect::{BoundingBox, Detection, WasteCategory};
use nutricycle::session_log::SessionLogger;

fn detection(category: WasteCategory, confidence: f32) -> Detection {
    Detection {
        category,
        original_label: category.as_str().to_string(),
        confidence,
        bbox: BoundingBox::new(0.0, 0.0, 4.0, 4.0),
        timestamp: Utc::now(),
    }
}

#[test]
fn empty_detection_lists_are_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    let logger = SessionLogger::new(dir.path().to_str().unwrap()).unwrap();

    logger.log_detection(&[], 1);

    let summary = logger.summary();
    assert_eq!(summary.total_frames, 0);
    assert!(summary.type_counts.is_empty());
}

#[test]
fn summary_counts_by_category() {
    let dir = tempfile::tempdir().unwrap();
    let logger = SessionLogger::new(dir.path().to_str().unwrap()).unwrap();

    logger.log_detection(
        &[
            detection(WasteCategory::Plastic, 0.8),
            detection(WasteCategory::Metal, 0.9),
        ],
        1,
    );
    logger.log_detection(&[detection(WasteCategory::Plastic, 0.7)], 2);

    let summary = logger.summary();
    assert_eq!(summary.total_frames, 2);
    assert_eq!(summary.type_counts[&WasteCategory::Plastic], 2);
    assert_eq!(summary.type_counts[&WasteCategory::Metal], 1);
}

#[test]
fn save_writes_parseable_json() {
    let dir = tempfile::tempdir().unwrap();
    let logger = SessionLogger::new(dir.path().to_str().unwrap()).unwrap();

    logger.log_detection(&[detection(WasteCategory::Paper, 0.6)], 7);
    logger.save().unwrap();

    let contents = std::fs::read_to_string(logger.log_path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();

    let entries = parsed["detections"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["frame_id"], 7);
    assert_eq!(entries[0]["count"], 1);
    assert_eq!(entries[0]["objects"][0]["type"], "paper");
    assert!(parsed["session_id"].is_string());
}

#[test]
fn save_on_empty_session_still_produces_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let logger = SessionLogger::new(dir.path().to_str().unwrap()).unwrap();

    logger.save().unwrap();
    assert!(logger.log_path().exists());
}
