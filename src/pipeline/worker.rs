use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::scheduler::FrameScheduler;
use super::shared_frame::SharedFrameBuffer;
use crate::batch::BatchAggregator;
use crate::config::{DetectionConfig, StreamConfig};
use crate::detect::Detector;
use crate::session_log::SessionLogger;
use crate::stream::{self, StreamStatus};

/// Lifecycle of the single long-lived ingestion worker.
///
/// `start()` while running and `stop()` while stopped are no-ops. The worker
/// observes the cleared active flag on its next tick, so shutdown latency is
/// bounded by one tick period plus any in-flight reconnection sleep.
pub struct PipelineWorker {
    stream_config: StreamConfig,
    detection_config: DetectionConfig,
    detector: Arc<Detector>,
    batches: Arc<BatchAggregator>,
    session_log: Arc<SessionLogger>,
    frames: Arc<SharedFrameBuffer>,
    status: Arc<Mutex<StreamStatus>>,
    frame_count: Arc<AtomicU64>,
    active: Arc<AtomicBool>,
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl PipelineWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stream_config: StreamConfig,
        detection_config: DetectionConfig,
        detector: Arc<Detector>,
        batches: Arc<BatchAggregator>,
        session_log: Arc<SessionLogger>,
        frames: Arc<SharedFrameBuffer>,
        status: Arc<Mutex<StreamStatus>>,
        frame_count: Arc<AtomicU64>,
    ) -> Self {
        Self {
            stream_config,
            detection_config,
            detector,
            batches,
            session_log,
            frames,
            status,
            frame_count,
            active: Arc::new(AtomicBool::new(false)),
            handle: tokio::sync::Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the worker. Returns false (and changes nothing) when it is
    /// already running.
    pub async fn start(&self) -> Result<bool> {
        if self.active.swap(true, Ordering::SeqCst) {
            info!("pipeline worker already running");
            return Ok(false);
        }

        // Fresh statistics for the new run; avoids cumulative counts.
        self.detector.reset_stats();
        self.frame_count.store(0, Ordering::SeqCst);

        let mut source = match stream::create_source(&self.stream_config) {
            Ok(source) => source,
            Err(err) => {
                self.active.store(false, Ordering::SeqCst);
                return Err(err).context("create stream source");
            }
        };

        let detector = Arc::clone(&self.detector);
        let batches = Arc::clone(&self.batches);
        let session_log = Arc::clone(&self.session_log);
        let frames = Arc::clone(&self.frames);
        let status = Arc::clone(&self.status);
        let active = Arc::clone(&self.active);
        let frame_count = Arc::clone(&self.frame_count);
        let skip_frames = self.detection_config.skip_frames;
        let tick_interval = self.detection_config.tick_interval();

        // The initial connect happens on the worker thread, so a slow camera
        // never blocks the control request.
        let task = tokio::task::spawn_blocking(move || {
            if let Err(err) = source.connect() {
                // Leave recovery to the read path's bounded reconnection.
                warn!("initial stream connect failed: {:#}", err);
            }
            FrameScheduler {
                source,
                detector,
                batches,
                session_log,
                frames,
                status,
                active,
                frame_count,
                skip_frames,
                tick_interval,
            }
            .run();
        });

        {
            let mut handle = self.handle.lock().await;
            *handle = Some(task);
        }

        info!("pipeline worker started");
        Ok(true)
    }

    /// Clear the active flag and wait for the loop to exit. Returns whether a
    /// worker was running.
    pub async fn stop(&self) -> bool {
        let was_running = self.active.swap(false, Ordering::SeqCst);

        let task = {
            let mut handle = self.handle.lock().await;
            handle.take()
        };
        if let Some(task) = task {
            if let Err(err) = task.await {
                error!("pipeline worker panicked: {}", err);
            }
        }

        if was_running {
            info!("pipeline worker stopped");
        }
        was_running
    }
}
