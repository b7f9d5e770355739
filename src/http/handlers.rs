use super::state::AppState;
use crate::batch::{BatchRecord, BatchSnapshot};
use crate::detect::{Detection, WasteCategory};
use crate::frame::Frame;
use crate::session_log::SessionSummary;
use crate::stream::StreamStatus;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Poll cadence of the republished MJPEG feed.
const FEED_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: String,
    pub status: &'static str,
    pub detection_active: bool,
    pub frame_count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub counts: HashMap<WasteCategory, u64>,
    pub session_info: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct BatchStartResponse {
    pub status: &'static str,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BatchEndResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchRecord>,
}

#[derive(Debug, Serialize)]
pub struct StreamStatusResponse {
    #[serde(flatten)]
    pub stream: StreamStatus,
    pub contamination_detected: bool,
    pub contamination_count: u64,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    pub image_width: u32,
    pub image_height: u32,
}

fn service_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "detector not initialized".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(IndexResponse {
        service: state.config.service.name.clone(),
        status: "running",
        detection_active: state.worker.as_ref().is_some_and(|w| w.is_active()),
        frame_count: state.frame_count.load(Ordering::SeqCst),
    })
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /detection/start
/// Start the ingestion worker; no-op when already running.
pub async fn start_detection(State(state): State<AppState>) -> Response {
    let Some(worker) = state.worker.as_ref() else {
        return service_unavailable();
    };

    match worker.start().await {
        Ok(true) => Json(StatusResponse { status: "started" }).into_response(),
        Ok(false) => Json(StatusResponse {
            status: "already_running",
        })
        .into_response(),
        Err(err) => {
            error!("failed to start pipeline worker: {:#}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to start detection: {err}"),
                }),
            )
                .into_response()
        }
    }
}

/// POST /detection/stop
/// Stop the worker and persist the session log.
pub async fn stop_detection(State(state): State<AppState>) -> Response {
    if let Some(worker) = state.worker.as_ref() {
        worker.stop().await;
    }

    if let Err(err) = state.session_log.save() {
        warn!("failed to save session log: {:#}", err);
    }

    Json(StatusResponse { status: "stopped" }).into_response()
}

/// GET /statistics
pub async fn get_statistics(State(state): State<AppState>) -> Response {
    let Some(detector) = state.detector.as_ref() else {
        return service_unavailable();
    };

    Json(StatisticsResponse {
        counts: detector.stats(),
        session_info: state.session_log.summary(),
    })
    .into_response()
}

/// POST /statistics/reset
pub async fn reset_statistics(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(detector) = state.detector.as_ref() {
        detector.reset_stats();
    }
    Json(StatusResponse { status: "reset" })
}

/// POST /batch/start
/// Idempotent: re-starting reports the original start time.
pub async fn start_batch(State(state): State<AppState>) -> impl IntoResponse {
    let started = state.batches.start();
    Json(BatchStartResponse {
        status: if started.already_active {
            "already_active"
        } else {
            "started"
        },
        start_time: started.start_time,
    })
}

/// POST /batch/end
pub async fn end_batch(State(state): State<AppState>) -> impl IntoResponse {
    match state.batches.end() {
        Some(record) => Json(BatchEndResponse {
            status: "ended",
            summary: Some(record),
        }),
        None => Json(BatchEndResponse {
            status: "no_active_batch",
            summary: None,
        }),
    }
}

/// GET /batch/history
pub async fn get_batch_history(State(state): State<AppState>) -> Json<BatchSnapshot> {
    Json(state.batches.snapshot())
}

/// GET /stream/status
pub async fn get_stream_status(State(state): State<AppState>) -> impl IntoResponse {
    let stream = state
        .stream_status
        .lock()
        .expect("stream status lock poisoned")
        .clone();

    let contamination_count = state
        .detector
        .as_ref()
        .map(|d| d.contamination_count())
        .unwrap_or(0);

    Json(StreamStatusResponse {
        stream,
        contamination_detected: contamination_count > 0,
        contamination_count,
    })
}

/// GET /video_feed
/// Republish the latest processed frame as an MJPEG multipart stream.
pub async fn video_feed(State(state): State<AppState>) -> Response {
    let frames = Arc::clone(&state.frames);

    let stream = futures::stream::unfold(frames, |frames| async move {
        loop {
            tokio::time::sleep(FEED_INTERVAL).await;

            // Empty slot: nothing published yet, keep polling.
            let Some(frame) = frames.latest() else {
                continue;
            };
            let jpeg = match frame.to_jpeg() {
                Ok(jpeg) => jpeg,
                Err(err) => {
                    warn!("failed to encode feed frame: {:#}", err);
                    continue;
                }
            };

            let mut part = Vec::with_capacity(jpeg.len() + 64);
            part.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
            part.extend_from_slice(&jpeg);
            part.extend_from_slice(b"\r\n");
            return Some((Ok::<_, std::convert::Infallible>(part), frames));
        }
    });

    (
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        Body::from_stream(stream),
    )
        .into_response()
}

enum OneShotError {
    Decode,
    Inference(anyhow::Error),
}

/// POST /detect
/// Stateless one-shot detection on raw image bytes. Independent of the
/// streaming loop: never touches the shared frame slot or the tick counter.
pub async fn detect_image(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(detector) = state.detector.clone() else {
        return service_unavailable();
    };

    let result = tokio::task::spawn_blocking(move || {
        let frame = Frame::from_jpeg(&body).map_err(|_| OneShotError::Decode)?;
        let detections = detector
            .detect_frame(&frame)
            .map_err(OneShotError::Inference)?;
        Ok::<_, OneShotError>((detections, frame.width, frame.height))
    })
    .await;

    match result {
        Ok(Ok((detections, image_width, image_height))) => {
            info!(
                "one-shot detection: {} result(s) on {}x{} image",
                detections.len(),
                image_width,
                image_height
            );
            Json(DetectResponse {
                detections,
                image_width,
                image_height,
            })
            .into_response()
        }
        Ok(Err(OneShotError::Decode)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_image".to_string(),
            }),
        )
            .into_response(),
        Ok(Err(OneShotError::Inference(err))) => {
            error!("one-shot inference failed: {:#}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("inference failed: {err}"),
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("one-shot detection task failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                }),
            )
                .into_response()
        }
    }
}
