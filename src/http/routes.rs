use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service status
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        // Worker control
        .route("/detection/start", post(handlers::start_detection))
        .route("/detection/stop", post(handlers::stop_detection))
        // Statistics
        .route("/statistics", get(handlers::get_statistics))
        .route("/statistics/reset", post(handlers::reset_statistics))
        // Batch management
        .route("/batch/start", post(handlers::start_batch))
        .route("/batch/end", post(handlers::end_batch))
        .route("/batch/history", get(handlers::get_batch_history))
        // Stream
        .route("/stream/status", get(handlers::get_stream_status))
        .route("/video_feed", get(handlers::video_feed))
        // One-shot detection
        .route("/detect", post(handlers::detect_image))
        // CORS for the operator frontend, tracing for request logging
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
