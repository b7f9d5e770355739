//! The detection pipeline: one long-lived worker reads frames from a stream
//! source, throttles inference, and hands results off to the batch
//! aggregator, the session log, and the shared frame slot.

pub mod scheduler;
pub mod shared_frame;
pub mod worker;

pub use scheduler::FrameScheduler;
pub use shared_frame::SharedFrameBuffer;
pub use worker::PipelineWorker;
