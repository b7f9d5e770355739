use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::stream::StreamKind;

/// Top-level service configuration.
///
/// Every section carries documented defaults, so a missing config file yields a
/// working local setup (synthetic stream + stub detection backend).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub stream: StreamConfig,
    pub detection: DetectionConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "nutricycle".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Source variant: "esp32" (MJPEG over HTTP) or "synthetic" (test pattern).
    pub kind: StreamKind,

    /// Camera stream URL (esp32 only).
    pub url: String,

    /// Reconnection attempts before the source gives up and stays disconnected.
    pub max_reconnect_attempts: u32,

    /// Fixed backoff between reconnection attempts, in seconds.
    pub reconnect_backoff_secs: u64,

    /// Step the requested stream quality down/up based on observed latency.
    /// Off by default: slow links have shown request timeouts when enabled.
    pub adaptive_quality: bool,

    /// Latency above this steps quality down; below half of it steps back up.
    pub latency_threshold_secs: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            kind: StreamKind::Synthetic,
            url: "http://192.168.1.17:81/stream".to_string(),
            max_reconnect_attempts: 5,
            reconnect_backoff_secs: 2,
            adaptive_quality: false,
            latency_threshold_secs: 2.0,
        }
    }
}

impl StreamConfig {
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detection backend: "stub" (always empty) or "none" (detection unavailable).
    pub backend: String,

    /// Minimum confidence for a detection to be kept.
    pub confidence_threshold: f32,

    /// Square inference resolution the model expects.
    pub inference_size: u32,

    /// Frames skipped between inference runs (14 = infer 1 in every 15 ticks).
    pub skip_frames: u64,

    /// Drop clean-category (leafy vegetable) detections from results, keeping
    /// only contamination. Counts still include them.
    pub filter_clean: bool,

    /// Delay after each scheduler tick, bounding CPU usage.
    pub tick_interval_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            backend: "stub".to_string(),
            confidence_threshold: 0.5,
            inference_size: 320,
            skip_frames: 14,
            filter_clean: true,
            tick_interval_ms: 50,
        }
    }
}

impl DetectionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of finished batch records retained in memory (FIFO).
    pub max_history: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_history: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for session detection logs.
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults when the file
    /// is absent.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate cross-field constraints once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.service.http.port == 0 {
            bail!("service.http.port must be non-zero");
        }
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            bail!(
                "detection.confidence_threshold must be within [0, 1], got {}",
                self.detection.confidence_threshold
            );
        }
        if self.detection.inference_size == 0 {
            bail!("detection.inference_size must be positive");
        }
        if self.batch.max_history == 0 {
            bail!("batch.max_history must be at least 1");
        }
        if self.stream.latency_threshold_secs <= 0.0 {
            bail!("stream.latency_threshold_secs must be positive");
        }
        Ok(())
    }
}
