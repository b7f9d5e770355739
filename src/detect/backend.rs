use anyhow::{bail, Result};
use std::sync::Arc;

use super::types::RawDetection;
use crate::config::DetectionConfig;
use crate::frame::Frame;

/// Object-classification model boundary.
///
/// The model itself is a black box: frame in, classified boxes out, with box
/// coordinates in the pixel space of the frame that was passed in. Backends
/// must be callable concurrently from the worker and one-shot request paths.
pub trait DetectionBackend: Send + Sync {
    /// Run inference on a frame.
    fn infer(&self, frame: &Frame) -> Result<Vec<RawDetection>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Backend that never detects anything. Lets the full pipeline run where no
/// model is deployed.
pub struct StubBackend;

impl DetectionBackend for StubBackend {
    fn infer(&self, _frame: &Frame) -> Result<Vec<RawDetection>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Create a detection backend from configuration.
///
/// Returns `None` for the explicit "none" backend; inference-dependent
/// endpoints then report the service as unavailable.
pub fn create_backend(config: &DetectionConfig) -> Result<Option<Arc<dyn DetectionBackend>>> {
    match config.backend.as_str() {
        "stub" => Ok(Some(Arc::new(StubBackend))),
        "none" => Ok(None),
        other => bail!("unknown detection backend '{}'", other),
    }
}
