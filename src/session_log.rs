//! Durable append-only record of detection events for one service session.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::detect::{Detection, WasteCategory};

#[derive(Debug, Clone, Serialize)]
struct LogEntry {
    frame_id: u64,
    timestamp: DateTime<Utc>,
    count: usize,
    objects: Vec<Detection>,
}

#[derive(Debug, Serialize)]
struct SessionFile<'a> {
    session_id: &'a Uuid,
    session_start: DateTime<Utc>,
    detections: &'a [LogEntry],
}

/// Per-category summary of everything logged this session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub session_start: DateTime<Utc>,
    pub total_frames: usize,
    pub type_counts: HashMap<WasteCategory, u64>,
}

/// In-memory session log, flushed to a JSON file on demand.
pub struct SessionLogger {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    log_path: PathBuf,
    entries: Mutex<Vec<LogEntry>>,
}

impl SessionLogger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;

        let started_at = Utc::now();
        let log_path = dir.join(format!(
            "detections_{}.json",
            started_at.format("%Y%m%d_%H%M%S")
        ));
        info!("session log: {}", log_path.display());

        Ok(Self {
            session_id: Uuid::new_v4(),
            started_at,
            log_path,
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Append a timestamped entry. Empty detection lists are not logged.
    pub fn log_detection(&self, detections: &[Detection], frame_id: u64) {
        if detections.is_empty() {
            return;
        }

        let entry = LogEntry {
            frame_id,
            timestamp: Utc::now(),
            count: detections.len(),
            objects: detections.to_vec(),
        };

        self.entries
            .lock()
            .expect("session log lock poisoned")
            .push(entry);
    }

    /// Persist all accumulated entries.
    pub fn save(&self) -> Result<()> {
        let json = {
            let entries = self.entries.lock().expect("session log lock poisoned");
            serde_json::to_string_pretty(&SessionFile {
                session_id: &self.session_id,
                session_start: self.started_at,
                detections: &entries,
            })?
        };

        fs::write(&self.log_path, json)
            .with_context(|| format!("write session log {}", self.log_path.display()))?;
        Ok(())
    }

    /// Total logged frames and per-category counts across the session.
    pub fn summary(&self) -> SessionSummary {
        let entries = self.entries.lock().expect("session log lock poisoned");

        let mut type_counts: HashMap<WasteCategory, u64> = HashMap::new();
        for entry in entries.iter() {
            for object in &entry.objects {
                *type_counts.entry(object.category).or_insert(0) += 1;
            }
        }

        SessionSummary {
            session_id: self.session_id,
            session_start: self.started_at,
            total_frames: entries.len(),
            type_counts,
        }
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }
}
