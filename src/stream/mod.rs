//! Resilient stream sources.
//!
//! A `StreamSource` connects to a camera, reads frames, and recovers from
//! transport failures with bounded reconnection. The ESP32 variant layers
//! latency metrics and optional quality adaptation on top of a raw
//! `CameraTransport`; the synthetic variant generates a test pattern and keeps
//! the default status implementation.

pub mod esp32;
pub mod resilient;
pub mod synthetic;

pub use esp32::{Esp32Source, HttpCameraTransport};
pub use resilient::{CameraTransport, QualityLevel, ResilientSource, QUALITY_LEVELS};
pub use synthetic::SyntheticSource;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::StreamConfig;
use crate::frame::Frame;

/// Stream source variant selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// ESP32-CAM MJPEG over HTTP.
    Esp32,
    /// Generated test pattern, no network.
    Synthetic,
}

impl Default for StreamKind {
    fn default() -> Self {
        StreamKind::Synthetic
    }
}

/// Point-in-time snapshot of a source's health. Recomputed on demand, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StreamStatus {
    pub connected: bool,
    pub fps: f64,
    pub latency_seconds: f64,
    pub quality: String,
    pub reconnect_attempts: u32,
}

impl StreamStatus {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            fps: 0.0,
            latency_seconds: 0.0,
            quality: "n/a".to_string(),
            reconnect_attempts: 0,
        }
    }
}

/// Capability interface implemented by every source variant.
pub trait StreamSource: Send {
    /// Establish the connection. Also clears a previous give-up state.
    fn connect(&mut self) -> Result<()>;

    /// Read the next frame. Transport failures trigger bounded reconnection
    /// inside the call; after the retry budget is exhausted the source stays
    /// disconnected and keeps failing fast until `connect()` is called again.
    fn read(&mut self) -> Result<Frame>;

    /// Release the connection.
    fn stop(&mut self);

    /// Health snapshot. Simple variants keep this default.
    fn status(&self) -> StreamStatus {
        StreamStatus {
            connected: true,
            fps: 0.0,
            latency_seconds: 0.0,
            quality: "n/a".to_string(),
            reconnect_attempts: 0,
        }
    }
}

/// Build a stream source from configuration.
pub fn create_source(config: &StreamConfig) -> Result<Box<dyn StreamSource>> {
    match config.kind {
        StreamKind::Esp32 => {
            let transport = HttpCameraTransport::new(&config.url)?;
            Ok(Box::new(ResilientSource::new(transport, config.clone())))
        }
        StreamKind::Synthetic => Ok(Box::new(SyntheticSource::new(640, 480))),
    }
}
