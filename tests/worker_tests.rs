// Pipeline worker lifecycle against the synthetic stream source: start/stop
// idempotency and end-to-end frame publication.

use nutricycle::config::Config;
use nutricycle::http::AppState;
use std::time::Duration;

fn test_state(log_dir: &std::path::Path) -> AppState {
    let mut cfg = Config::default();
    cfg.logging.dir = log_dir.to_str().unwrap().to_string();
    cfg.detection.tick_interval_ms = 5;
    AppState::new(cfg).unwrap()
}

#[tokio::test]
async fn worker_publishes_frames_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let worker = state.worker.as_ref().expect("stub backend enables worker");

    assert!(worker.start().await.unwrap());
    tokio::time::sleep(Duration::from_millis(100)).await;

    let frame = state.frames.latest().expect("worker published a frame");
    assert_eq!((frame.width, frame.height), (640, 480));
    assert!(state.stream_status.lock().unwrap().connected);

    assert!(worker.stop().await);
    assert!(!worker.is_active());
}

#[tokio::test]
async fn start_while_running_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let worker = state.worker.as_ref().unwrap();

    assert!(worker.start().await.unwrap());
    assert!(!worker.start().await.unwrap());

    assert!(worker.stop().await);
    // Stopping an already stopped worker is also a no-op.
    assert!(!worker.stop().await);
}

#[tokio::test]
async fn state_without_backend_has_no_worker() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.logging.dir = dir.path().to_str().unwrap().to_string();
    cfg.detection.backend = "none".to_string();

    let state = AppState::new(cfg).unwrap();
    assert!(state.detector.is_none());
    assert!(state.worker.is_none());
}
