//! Detection orchestration around a black-box classification model.
//!
//! `Detector` owns a `DetectionBackend` and handles everything around it:
//! resizing frames to the model's input resolution, confidence filtering,
//! label-to-category mapping, rescaling boxes back to the source frame, and
//! running per-category statistics.

pub mod backend;
pub mod category;
pub mod types;

pub use backend::{create_backend, DetectionBackend, StubBackend};
pub use category::{map_label, WasteCategory};
pub use types::{BoundingBox, Detection, RawDetection};

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::DetectionConfig;
use crate::frame::Frame;

/// Detection facade shared by the streaming worker and the one-shot endpoint.
pub struct Detector {
    backend: Arc<dyn DetectionBackend>,
    confidence_threshold: f32,
    inference_size: u32,
    filter_clean: bool,
    counts: Mutex<HashMap<WasteCategory, u64>>,
}

impl Detector {
    pub fn new(backend: Arc<dyn DetectionBackend>, config: &DetectionConfig) -> Self {
        Self {
            backend,
            confidence_threshold: config.confidence_threshold,
            inference_size: config.inference_size,
            filter_clean: config.filter_clean,
            counts: Mutex::new(empty_counts()),
        }
    }

    /// The fixed square resolution frames are resized to before inference.
    pub fn inference_size(&self) -> u32 {
        self.inference_size
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Run the full detection pass on a frame.
    ///
    /// The frame is resized to the inference resolution, the backend is
    /// invoked, and returned boxes are rescaled back to the frame's own
    /// resolution with independent horizontal/vertical factors. Per-category
    /// counts are updated for every kept detection, including clean-category
    /// ones that `filter_clean` subsequently drops from the result.
    pub fn detect_frame(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let inference_frame = frame.resize(self.inference_size, self.inference_size)?;
        let raw = self.backend.infer(&inference_frame)?;

        let sx = frame.width as f32 / self.inference_size as f32;
        let sy = frame.height as f32 / self.inference_size as f32;
        let now = Utc::now();

        let mut detections = Vec::new();
        for detection in raw {
            if detection.confidence < self.confidence_threshold {
                continue;
            }
            let category = category::map_label(&detection.label);

            {
                let mut counts = self.counts.lock().expect("detector counts lock poisoned");
                *counts.entry(category).or_insert(0) += 1;
            }

            if self.filter_clean && !category.is_contamination() {
                continue;
            }

            detections.push(Detection {
                category,
                original_label: detection.label,
                confidence: detection.confidence.clamp(0.0, 1.0),
                bbox: detection
                    .bbox
                    .scale(sx, sy)
                    .clamp_to(frame.width, frame.height),
                timestamp: now,
            });
        }

        Ok(detections)
    }

    /// Snapshot of the per-category running counts. All categories are always
    /// present, zero when unseen.
    pub fn stats(&self) -> HashMap<WasteCategory, u64> {
        self.counts
            .lock()
            .expect("detector counts lock poisoned")
            .clone()
    }

    /// Total count of non-clean detections since the last reset.
    pub fn contamination_count(&self) -> u64 {
        let counts = self.counts.lock().expect("detector counts lock poisoned");
        counts
            .iter()
            .filter(|(category, _)| category.is_contamination())
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn reset_stats(&self) {
        let mut counts = self.counts.lock().expect("detector counts lock poisoned");
        *counts = empty_counts();
    }
}

fn empty_counts() -> HashMap<WasteCategory, u64> {
    WasteCategory::ALL.iter().map(|c| (*c, 0)).collect()
}
