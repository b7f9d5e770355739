//! HTTP control surface for the contamination monitor:
//! - POST /detection/start|stop - control the ingestion worker
//! - GET  /statistics, POST /statistics/reset - aggregate detection counts
//! - POST /batch/start|end, GET /batch/history - batch windows
//! - GET  /stream/status - live stream health
//! - GET  /video_feed - MJPEG republish of the processed stream
//! - POST /detect - stateless one-shot detection on uploaded image bytes

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
