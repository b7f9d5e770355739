//! Batch aggregation: operator-controlled time windows during which
//! detections accumulate into a single summary record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::info;

use crate::detect::{Detection, WasteCategory};

/// Finalized summary of one batch window. Frozen once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub total_items: usize,
    pub item_counts: HashMap<WasteCategory, u64>,
    pub max_confidence: f32,
}

/// Immutable view of the aggregator for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub batches: Vec<BatchRecord>,
    pub active: bool,
    pub current_batch_items: usize,
}

/// Outcome of `start()`: the window's start time, and whether a window was
/// already open (idempotent, not an error).
#[derive(Debug, Clone, Copy)]
pub struct BatchStart {
    pub start_time: DateTime<Utc>,
    pub already_active: bool,
}

struct ActiveBatch {
    started_at: DateTime<Utc>,
    detections: Vec<Detection>,
}

struct Inner {
    active: Option<ActiveBatch>,
    history: VecDeque<BatchRecord>,
    next_id: u64,
}

/// State machine accumulating detections while a batch window is open.
///
/// At most one window is open at a time; finished records are retained in a
/// bounded FIFO history, oldest evicted first.
pub struct BatchAggregator {
    inner: Mutex<Inner>,
    max_history: usize,
}

impl BatchAggregator {
    pub fn new(max_history: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                active: None,
                history: VecDeque::new(),
                next_id: 1,
            }),
            max_history,
        }
    }

    /// Open a batch window. Re-opening an already open window is a no-op that
    /// reports the original start time.
    pub fn start(&self) -> BatchStart {
        let mut inner = self.lock();
        if let Some(active) = &inner.active {
            return BatchStart {
                start_time: active.started_at,
                already_active: true,
            };
        }

        let started_at = Utc::now();
        inner.active = Some(ActiveBatch {
            started_at,
            detections: Vec::new(),
        });
        info!("batch started at {}", started_at);

        BatchStart {
            start_time: started_at,
            already_active: false,
        }
    }

    /// Append detections to the open window; no-op while idle.
    pub fn add(&self, detections: &[Detection]) {
        let mut inner = self.lock();
        if let Some(active) = inner.active.as_mut() {
            active.detections.extend_from_slice(detections);
        }
    }

    /// Close the open window and produce its record, or `None` when no window
    /// is open.
    pub fn end(&self) -> Option<BatchRecord> {
        let mut inner = self.lock();
        let active = inner.active.take()?;

        let end_time = Utc::now();
        let duration = end_time.signed_duration_since(active.started_at);

        let mut item_counts: HashMap<WasteCategory, u64> = HashMap::new();
        let mut max_confidence: f32 = 0.0;
        for detection in &active.detections {
            *item_counts.entry(detection.category).or_insert(0) += 1;
            max_confidence = max_confidence.max(detection.confidence);
        }

        let record = BatchRecord {
            id: inner.next_id,
            start_time: active.started_at,
            end_time,
            duration_seconds: duration.num_milliseconds() as f64 / 1000.0,
            total_items: active.detections.len(),
            item_counts,
            max_confidence,
        };
        inner.next_id += 1;

        inner.history.push_back(record.clone());
        while inner.history.len() > self.max_history {
            inner.history.pop_front();
        }

        info!(
            "batch {} ended: {:.2}s, {} items",
            record.id, record.duration_seconds, record.total_items
        );

        Some(record)
    }

    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        let inner = self.lock();
        BatchSnapshot {
            batches: inner.history.iter().cloned().collect(),
            active: inner.active.is_some(),
            current_batch_items: inner
                .active
                .as_ref()
                .map(|a| a.detections.len())
                .unwrap_or(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("batch aggregator lock poisoned")
    }
}
