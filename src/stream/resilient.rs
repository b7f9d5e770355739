//! Reconnection, latency metrics, and quality adaptation, generic over the
//! underlying camera transport.

use anyhow::{bail, Result};
use std::collections::VecDeque;
use std::thread;
use std::time::Instant;
use tracing::{info, warn};

use super::{StreamSource, StreamStatus};
use crate::config::StreamConfig;
use crate::frame::Frame;

/// Raw transport under a `ResilientSource`: open a connection, pull frames,
/// optionally honor remote quality requests.
pub trait CameraTransport: Send {
    fn open(&mut self) -> Result<()>;

    fn next_frame(&mut self) -> Result<Frame>;

    fn close(&mut self);

    /// Best-effort request to change the remote stream quality. The default
    /// does nothing; failures are never surfaced past the source.
    fn request_quality(&mut self, _level: QualityLevel) -> Result<()> {
        Ok(())
    }
}

/// A discrete remote stream quality setting. `framesize` is the ESP32-CAM
/// sensor framesize index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityLevel {
    pub name: &'static str,
    pub framesize: u8,
}

/// Supported quality levels, highest fidelity first.
pub const QUALITY_LEVELS: [QualityLevel; 4] = [
    QualityLevel {
        name: "SVGA",
        framesize: 9,
    },
    QualityLevel {
        name: "VGA",
        framesize: 8,
    },
    QualityLevel {
        name: "CIF",
        framesize: 6,
    },
    QualityLevel {
        name: "QVGA",
        framesize: 5,
    },
];

/// Inter-frame interval samples kept for the fps/latency estimate.
const INTERVAL_WINDOW: usize = 30;

/// Samples required before quality adaptation acts on the latency estimate.
const MIN_ADAPT_SAMPLES: usize = 5;

/// Stream source wrapper adding bounded reconnection and adaptive quality to
/// any `CameraTransport`.
pub struct ResilientSource<T: CameraTransport> {
    transport: T,
    config: StreamConfig,
    connected: bool,
    gave_up: bool,
    reconnect_attempts: u32,
    intervals: VecDeque<f64>,
    last_arrival: Option<Instant>,
    quality_idx: usize,
}

impl<T: CameraTransport> ResilientSource<T> {
    pub fn new(transport: T, config: StreamConfig) -> Self {
        Self {
            transport,
            config,
            connected: false,
            gave_up: false,
            reconnect_attempts: 0,
            intervals: VecDeque::with_capacity(INTERVAL_WINDOW),
            last_arrival: None,
            quality_idx: 0,
        }
    }

    /// Mean inter-frame interval over the rolling window, in seconds.
    fn mean_interval(&self) -> Option<f64> {
        if self.intervals.is_empty() {
            return None;
        }
        Some(self.intervals.iter().sum::<f64>() / self.intervals.len() as f64)
    }

    fn note_arrival(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_arrival {
            if self.intervals.len() == INTERVAL_WINDOW {
                self.intervals.pop_front();
            }
            self.intervals.push_back(now.duration_since(last).as_secs_f64());
        }
        self.last_arrival = Some(now);
    }

    /// Step quality at most one level per read cycle based on observed
    /// latency.
    fn maybe_adapt_quality(&mut self) {
        if !self.config.adaptive_quality {
            return;
        }
        if self.intervals.len() < MIN_ADAPT_SAMPLES {
            return;
        }
        let Some(latency) = self.mean_interval() else {
            return;
        };

        let threshold = self.config.latency_threshold_secs;
        if latency > threshold && self.quality_idx + 1 < QUALITY_LEVELS.len() {
            self.quality_idx += 1;
            self.push_quality(latency);
        } else if latency < threshold / 2.0 && self.quality_idx > 0 {
            self.quality_idx -= 1;
            self.push_quality(latency);
        }
    }

    fn push_quality(&mut self, latency: f64) {
        let level = QUALITY_LEVELS[self.quality_idx];
        info!(
            "stream latency {:.2}s, requesting quality {}",
            latency, level.name
        );
        if let Err(err) = self.transport.request_quality(level) {
            warn!("quality control request failed (ignored): {:#}", err);
        }
        // Fresh window so one adjustment settles before the next is judged.
        self.intervals.clear();
        self.last_arrival = None;
    }

    /// Re-establish the stream. `failed` is the number of consecutive
    /// transport failures the caller already charged against the budget; the
    /// total never exceeds `max_reconnect_attempts`.
    fn reconnect(&mut self, failed: u32) -> Result<Frame> {
        let max = self.config.max_reconnect_attempts;
        self.reconnect_attempts = failed;
        for attempt in (failed + 1)..=max {
            self.reconnect_attempts = attempt;
            info!("stream reconnect attempt {}/{}", attempt, max);
            thread::sleep(self.config.reconnect_backoff());

            match self.transport.open() {
                Ok(()) => match self.transport.next_frame() {
                    Ok(frame) => {
                        info!("stream reconnected after {} attempt(s)", attempt);
                        self.connected = true;
                        self.reconnect_attempts = 0;
                        self.intervals.clear();
                        self.last_arrival = None;
                        self.note_arrival();
                        return Ok(frame);
                    }
                    Err(err) => {
                        warn!("read after reconnect failed: {:#}", err);
                        self.transport.close();
                    }
                },
                Err(err) => warn!("reconnect attempt {} failed: {:#}", attempt, err),
            }
        }

        self.gave_up = true;
        self.connected = false;
        bail!(
            "stream reconnection exhausted after {} consecutive failures",
            max
        )
    }

    /// Current quality level name.
    pub fn quality(&self) -> &'static str {
        QUALITY_LEVELS[self.quality_idx].name
    }
}

impl<T: CameraTransport> StreamSource for ResilientSource<T> {
    fn connect(&mut self) -> Result<()> {
        self.transport.open()?;
        self.connected = true;
        self.gave_up = false;
        self.reconnect_attempts = 0;
        self.intervals.clear();
        self.last_arrival = None;
        Ok(())
    }

    fn read(&mut self) -> Result<Frame> {
        if self.gave_up {
            bail!(
                "stream disconnected after {} failed reconnect attempts; restart required",
                self.config.max_reconnect_attempts
            );
        }
        if !self.connected {
            return self.reconnect(0);
        }

        match self.transport.next_frame() {
            Ok(frame) => {
                self.note_arrival();
                self.maybe_adapt_quality();
                Ok(frame)
            }
            Err(err) => {
                warn!("stream read failed: {:#}", err);
                self.connected = false;
                self.transport.close();
                // The failure that got us here counts against the budget.
                self.reconnect(1)
            }
        }
    }

    fn stop(&mut self) {
        self.transport.close();
        self.connected = false;
        self.last_arrival = None;
    }

    fn status(&self) -> StreamStatus {
        let mean = self.mean_interval().unwrap_or(0.0);
        StreamStatus {
            connected: self.connected,
            fps: if mean > 0.0 { 1.0 / mean } else { 0.0 },
            latency_seconds: mean,
            quality: self.quality().to_string(),
            reconnect_attempts: self.reconnect_attempts,
        }
    }
}
