mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::StatusCode;

use stratus::api::router::create_router;
use stratus::models::bot_state::{ACTIVATED_MESSAGE, IDLE_MESSAGE, PAUSED_MESSAGE};
use stratus::models::Mode;

use common::{build_state, call, test_config, FailingTransport, RecordingTransport};

#[tokio::test]
async fn test_initial_status() {
    let state = build_state(test_config(None), Arc::new(RecordingTransport::default()));
    let app = create_router(state);

    let (status, json) = call(&app, "GET", "/api/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_running"], false);
    assert_eq!(json["status_message"], "Bot is currently idle.");
    assert_eq!(json["realized_pnl_today"], 0.0);
    assert_eq!(json["daily_losses"], 0);
    assert_eq!(json["max_daily_losses"], 3);
    assert_eq!(json["active_trades"], serde_json::json!([]));
}

#[tokio::test]
async fn test_start_then_stop() {
    let transport = Arc::new(RecordingTransport::default());
    let state = build_state(test_config(None), transport.clone());
    let store = state.store.clone();
    let app = create_router(state);

    let (status, json) = call(&app, "POST", "/api/control/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Bot started successfully.");
    assert_eq!(store.read_snapshot().mode, Mode::Running);

    let (_, json) = call(&app, "GET", "/api/status", None).await;
    assert_eq!(json["is_running"], true);

    let (status, json) = call(&app, "POST", "/api/control/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Bot stopped successfully.");
    assert_eq!(store.read_snapshot().mode, Mode::Paused);

    let alerts = transport.wait_for(2).await;
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].contains("ACTIVATED"));
    assert!(alerts[1].contains("DEACTIVATED"));
}

#[tokio::test]
async fn test_repeated_start_alerts_once() {
    let transport = Arc::new(RecordingTransport::default());
    let state = build_state(test_config(None), transport.clone());
    let app = create_router(state);

    for _ in 0..3 {
        let (status, json) = call(&app, "POST", "/api/control/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Bot started successfully.");
    }

    // Stop on an already-paused bot is also a quiet success
    let state = build_state(test_config(None), transport.clone());
    let paused_app = create_router(state);
    let (status, _) = call(&paused_app, "POST", "/api/control/stop", None).await;
    assert_eq!(status, StatusCode::OK);

    let alerts = transport.wait_for(1).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(transport.messages().len(), 1);
}

#[tokio::test]
async fn test_failing_alerts_do_not_affect_control() {
    let transport = Arc::new(FailingTransport::default());
    let state = build_state(test_config(None), transport.clone());
    let store = state.store.clone();
    let app = create_router(state);

    let (status, _) = call(&app, "POST", "/api/control/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.read_snapshot().mode, Mode::Running);

    let (status, _) = call(&app, "POST", "/api/control/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.read_snapshot().mode, Mode::Paused);

    for _ in 0..100 {
        if transport.attempts.load(Ordering::SeqCst) == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_auth_required_when_token_set() {
    let state = build_state(test_config(Some("s3cret")), Arc::new(RecordingTransport::default()));
    let store = state.store.clone();
    let app = create_router(state);

    let (status, json) = call(&app, "POST", "/api/control/start", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert_eq!(store.read_snapshot().mode, Mode::Paused);

    let (status, _) = call(&app, "POST", "/api/control/start", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "POST", "/api/control/start", Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.read_snapshot().mode, Mode::Running);
}

#[tokio::test]
async fn test_health_is_public() {
    let state = build_state(test_config(Some("s3cret")), Arc::new(RecordingTransport::default()));
    let app = create_router(state);

    let (status, json) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["is_running"], false);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = build_state(test_config(None), Arc::new(RecordingTransport::default()));
    let app = create_router(state);

    let (status, json) = call(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_wrong_method_rejected() {
    let state = build_state(test_config(None), Arc::new(RecordingTransport::default()));
    let store = state.store.clone();
    let app = create_router(state);

    let (status, _) = call(&app, "GET", "/api/control/start", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(store.read_snapshot().mode, Mode::Paused);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_start_stop_keeps_mode_valid() {
    let state = build_state(test_config(None), Arc::new(RecordingTransport::default()));
    let controller = state.controller.clone();

    let mut handles = Vec::new();
    for i in 0..64 {
        let ctl = controller.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                ctl.start();
            } else {
                ctl.stop();
            }
            // Mode and message are written together; a torn read would pair
            // a running mode with a paused message or vice versa.
            let report = ctl.status();
            if report.is_running {
                assert_eq!(report.status_message, ACTIVATED_MESSAGE);
            } else {
                assert!(
                    report.status_message == PAUSED_MESSAGE
                        || report.status_message == IDLE_MESSAGE
                );
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    controller.start();
    assert!(controller.status().is_running);
}
