use anyhow::Result;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use crate::batch::BatchAggregator;
use crate::config::Config;
use crate::detect::{self, Detector};
use crate::pipeline::{PipelineWorker, SharedFrameBuffer};
use crate::session_log::SessionLogger;
use crate::stream::StreamStatus;

/// Service context built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Absent when configured without a detection backend; inference-dependent
    /// endpoints then report 503.
    pub detector: Option<Arc<Detector>>,

    pub batches: Arc<BatchAggregator>,
    pub session_log: Arc<SessionLogger>,
    pub frames: Arc<SharedFrameBuffer>,
    pub stream_status: Arc<Mutex<StreamStatus>>,
    pub frame_count: Arc<AtomicU64>,

    /// Present whenever a detector is; the worker needs one to run inference.
    pub worker: Option<Arc<PipelineWorker>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let detector = detect::create_backend(&config.detection)?
            .map(|backend| Arc::new(Detector::new(backend, &config.detection)));

        let batches = Arc::new(BatchAggregator::new(config.batch.max_history));
        let session_log = Arc::new(SessionLogger::new(&config.logging.dir)?);
        let frames = Arc::new(SharedFrameBuffer::new());
        let stream_status = Arc::new(Mutex::new(StreamStatus::disconnected()));
        let frame_count = Arc::new(AtomicU64::new(0));

        let worker = detector.as_ref().map(|detector| {
            Arc::new(PipelineWorker::new(
                config.stream.clone(),
                config.detection.clone(),
                Arc::clone(detector),
                Arc::clone(&batches),
                Arc::clone(&session_log),
                Arc::clone(&frames),
                Arc::clone(&stream_status),
                Arc::clone(&frame_count),
            ))
        });

        Ok(Self {
            config,
            detector,
            batches,
            session_log,
            frames,
            stream_status,
            frame_count,
            worker,
        })
    }
}
