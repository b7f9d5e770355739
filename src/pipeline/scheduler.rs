use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use super::shared_frame::SharedFrameBuffer;
use crate::batch::BatchAggregator;
use crate::detect::Detector;
use crate::frame::Frame;
use crate::session_log::SessionLogger;
use crate::stream::{StreamSource, StreamStatus};

/// Sleep after a failed read before the next attempt.
const RECONNECT_POLL: Duration = Duration::from_secs(1);

/// Placeholder frame resolution while the stream is down.
const PLACEHOLDER_SIZE: (u32, u32) = (640, 480);

/// Drives the main ingestion loop: read, throttle inference, republish.
///
/// Constructed with shared handles and consumed by `run()` on a blocking
/// worker thread.
pub struct FrameScheduler {
    pub source: Box<dyn StreamSource>,
    pub detector: Arc<Detector>,
    pub batches: Arc<BatchAggregator>,
    pub session_log: Arc<SessionLogger>,
    pub frames: Arc<SharedFrameBuffer>,
    pub status: Arc<Mutex<StreamStatus>>,
    pub active: Arc<AtomicBool>,
    pub frame_count: Arc<AtomicU64>,

    /// Ticks skipped between inference runs.
    pub skip_frames: u64,
    pub tick_interval: Duration,
}

impl FrameScheduler {
    /// Run until the active flag clears, then release the source.
    pub fn run(mut self) {
        info!("frame scheduler started (skip_frames={})", self.skip_frames);

        let placeholder =
            Frame::placeholder(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1);
        let mut tick: u64 = 0;
        let mut last_output: Option<Frame> = None;

        while self.active.load(Ordering::SeqCst) {
            let frame = match self.source.read() {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("stream read failed: {:#}", err);
                    self.frames.publish(placeholder.clone());
                    self.publish_status();
                    thread::sleep(RECONNECT_POLL);
                    continue;
                }
            };

            let output = if tick % (self.skip_frames + 1) == 0 {
                // Per-invocation statistics reflect the current frame only.
                self.detector.reset_stats();

                match self.detector.detect_frame(&frame) {
                    Ok(detections) => {
                        if !detections.is_empty() {
                            let frame_id = self.frame_count.load(Ordering::SeqCst);
                            self.session_log.log_detection(&detections, frame_id);
                            self.batches.add(&detections);
                        }
                    }
                    // One bad tick is "no detections"; the loop keeps going.
                    Err(err) => warn!("inference failed this tick: {:#}", err),
                }
                frame
            } else {
                // Keep the published stream continuous without re-invoking
                // the model.
                last_output.clone().unwrap_or(frame)
            };

            last_output = Some(output.clone());
            self.frames.publish(output);
            self.publish_status();

            self.frame_count.fetch_add(1, Ordering::SeqCst);
            tick += 1;

            thread::sleep(self.tick_interval);
        }

        self.source.stop();
        self.publish_status();
        info!("frame scheduler stopped after {} ticks", tick);
    }

    fn publish_status(&self) {
        let snapshot = self.source.status();
        let mut status = self.status.lock().expect("stream status lock poisoned");
        *status = snapshot;
    }
}
