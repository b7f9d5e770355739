pub mod batch;
pub mod config;
pub mod detect;
pub mod frame;
pub mod http;
pub mod pipeline;
pub mod session_log;
pub mod stream;

pub use batch::{BatchAggregator, BatchRecord, BatchSnapshot};
pub use config::Config;
pub use detect::{Detection, DetectionBackend, Detector, RawDetection, WasteCategory};
pub use frame::Frame;
pub use http::{create_router, AppState};
pub use pipeline::{FrameScheduler, PipelineWorker, SharedFrameBuffer};
pub use session_log::{SessionLogger, SessionSummary};
pub use stream::{CameraTransport, ResilientSource, StreamSource, StreamStatus};
