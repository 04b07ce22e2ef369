use crux_core::testing::AppTester;
use shared::capabilities::{
    HttpHeaders, HttpOperation, HttpResponse, PlayerOperation, TimeOperation, TimerElapsed,
};
use shared::detection::MediaType;
use shared::{App, Effect, ErrorKind, Event, Model, RunPhase, MOCK_DELAY_MS};

fn tester() -> AppTester<App, Effect> {
    AppTester::<App, Effect>::default()
}

fn select_image(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(
        Event::MediaSelected {
            file_name: "bin.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        },
        model,
    );
}

fn select_video(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(
        Event::ModelSelected {
            model_id: "best2".to_string(),
        },
        model,
    );
    app.update(
        Event::MediaSelected {
            file_name: "flight.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            bytes: vec![0x00, 0x00, 0x00, 0x18],
        },
        model,
    );
}

/// Runs a mock detection to completion: opts into mock mode, issues the
/// detect request, then resolves the timer the way the shell's clock would.
fn run_mock_detection(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(Event::MockModeSet { enabled: true }, model);
    let update = app.update(Event::DetectRequested, model);

    let mut timer = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Time(request) => Some(request),
            _ => None,
        })
        .expect("mock run should request a timer");

    let TimeOperation::DelayMs { ms } = &timer.operation;
    assert_eq!(*ms, MOCK_DELAY_MS);

    let update = app.resolve(&mut timer, TimerElapsed).unwrap();
    for event in update.events {
        app.update(event, model);
    }
}

#[test]
fn mock_image_detection_completes_with_canned_results() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    assert_eq!(model.phase, RunPhase::Idle);

    run_mock_detection(&app, &mut model);

    assert_eq!(model.phase, RunPhase::Complete);
    let results = model.results.as_ref().unwrap();
    assert_eq!(results.detections.len(), 3);
    assert!((results.processing_time - 0.45).abs() < f32::EPSILON);
    assert_eq!(results.class_counts["plastic"], 1);
    assert_eq!(results.class_counts["paper"], 1);
    assert_eq!(results.class_counts["glass"], 1);
    assert!(!results.is_video());

    assert_eq!(model.history.len(), 1);
    let item = model.history.items().next().unwrap();
    assert_eq!(item.media, "bin.jpg");
    assert_eq!(item.media_type, MediaType::Image);
    assert_eq!(item.model_id, "yolo");
}

#[test]
fn mock_video_detection_arms_playback() {
    let app = tester();
    let mut model = Model::default();

    select_video(&app, &mut model);
    assert_eq!(model.media_type, MediaType::Video);

    run_mock_detection(&app, &mut model);

    assert_eq!(model.phase, RunPhase::Complete);
    let results = model.results.as_ref().unwrap();
    assert_eq!(results.frame_count, Some(150));
    assert_eq!(results.fps, Some(30.0));
    assert!(results.class_counts.contains_key("drone"));
    assert!(results.class_counts.contains_key("person"));
    assert!(results.class_counts.contains_key("vehicle"));

    assert!((model.playback.fps() - 30.0).abs() < f32::EPSILON);
    assert_eq!(model.playback.current_frame(), 0);
    assert!(!model.playback.is_playing());
}

#[test]
fn live_detection_posts_multipart_form() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);

    let request = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("live run should issue an HTTP request");

    let HttpOperation::Execute(http_request) = &request.operation;
    assert_eq!(http_request.url().as_str(), "http://localhost:5000/detect");

    let content_type = http_request.headers().get("Content-Type").unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(http_request.body().unwrap()).into_owned();
    assert!(body.contains("name=\"file\"; filename=\"bin.jpg\""));
    assert!(body.contains("name=\"model\"\r\n\r\nyolo"));
    assert!(body.contains("name=\"media_type\"\r\n\r\nimage"));
    assert!(body.contains("name=\"confidence\"\r\n\r\n0.25"));
}

#[test]
fn live_detection_success_appends_history() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);
    assert_eq!(model.phase, RunPhase::Processing);

    let mut request = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .unwrap();

    let payload = serde_json::json!({
        "detections": [
            { "box": [10.0, 10.0, 50.0, 50.0], "class_name": "metal", "confidence": 0.66 }
        ],
        "processing_time": 0.31,
        "class_counts": { "metal": 1 }
    });
    let response = HttpResponse::new(
        200,
        HttpHeaders::new(),
        serde_json::to_vec(&payload).unwrap(),
    );

    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.phase, RunPhase::Complete);
    assert_eq!(model.results.as_ref().unwrap().detections.len(), 1);
    assert_eq!(model.history.len(), 1);
    assert!(model.active_error.is_none());
}

#[test]
fn server_error_surfaces_status_and_body() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);

    let mut request = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .unwrap();

    let response = HttpResponse::new(500, HttpHeaders::new(), b"server error".to_vec());
    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.phase, RunPhase::Failed);
    let error = model.active_error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Upload);
    assert!(error.message.contains("500"));
    assert!(error.message.contains("server error"));
    assert!(model.history.is_empty());
    assert!(model.results.is_none());
}

#[test]
fn inconsistent_payload_fails_the_run() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);

    let mut request = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .unwrap();

    // class_counts tallies two but only one detection is listed
    let payload = serde_json::json!({
        "detections": [
            { "box": [0.0, 0.0, 10.0, 10.0], "class_name": "glass", "confidence": 0.9 }
        ],
        "processing_time": 0.2,
        "class_counts": { "glass": 2 }
    });
    let response = HttpResponse::new(
        200,
        HttpHeaders::new(),
        serde_json::to_vec(&payload).unwrap(),
    );

    let update = app.resolve(&mut request, Ok(response)).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.phase, RunPhase::Failed);
    assert_eq!(
        model.active_error.as_ref().unwrap().kind,
        ErrorKind::Deserialization
    );
    assert!(model.history.is_empty());
}

#[test]
fn stale_mock_result_is_discarded_after_clear() {
    let app = tester();
    let mut model = Model::default();

    app.update(Event::MockModeSet { enabled: true }, &mut model);
    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);

    let mut timer = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Time(request) => Some(request),
            _ => None,
        })
        .unwrap();

    // The user clears the upload while the timer is still pending.
    app.update(Event::MediaCleared, &mut model);
    assert_eq!(model.phase, RunPhase::Idle);

    let update = app.resolve(&mut timer, TimerElapsed).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.phase, RunPhase::Idle);
    assert!(model.results.is_none());
    assert!(model.history.is_empty());
}

#[test]
fn response_from_superseded_run_is_discarded() {
    let app = tester();
    let mut model = Model::default();

    app.update(Event::MockModeSet { enabled: true }, &mut model);
    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);

    let mut first_timer = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Time(request) => Some(request),
            _ => None,
        })
        .unwrap();

    // Re-stage and resubmit before the first timer fires.
    select_image(&app, &mut model);
    app.update(Event::DetectRequested, &mut model);
    let current_run = model.run_seq;

    let update = app.resolve(&mut first_timer, TimerElapsed).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    // The first run's completion must not have landed.
    assert_eq!(model.run_seq, current_run);
    assert_eq!(model.phase, RunPhase::Processing);
    assert!(model.results.is_none());
    assert!(model.history.is_empty());
}

#[test]
fn file_picked_during_processing_replaces_staged_upload() {
    let app = tester();
    let mut model = Model::default();

    app.update(Event::MockModeSet { enabled: true }, &mut model);
    select_image(&app, &mut model);
    let update = app.update(Event::DetectRequested, &mut model);
    assert_eq!(model.phase, RunPhase::Processing);

    let mut timer = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Time(request) => Some(request),
            _ => None,
        })
        .unwrap();

    // Picking another file mid-run restages immediately.
    app.update(
        Event::MediaSelected {
            file_name: "second.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        },
        &mut model,
    );

    assert_eq!(model.phase, RunPhase::Idle);
    assert_eq!(
        model.staged_media.as_ref().unwrap().file_name,
        "second.jpg"
    );

    // The abandoned run's timer still fires but its result is discarded.
    let update = app.resolve(&mut timer, TimerElapsed).unwrap();
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.phase, RunPhase::Idle);
    assert!(model.results.is_none());
    assert!(model.history.is_empty());
}

#[test]
fn switching_models_clears_run_state() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    run_mock_detection(&app, &mut model);
    assert_eq!(model.phase, RunPhase::Complete);

    app.update(
        Event::ModelSelected {
            model_id: "best2".to_string(),
        },
        &mut model,
    );

    assert_eq!(model.phase, RunPhase::Idle);
    assert!(model.staged_media.is_none());
    assert!(model.results.is_none());
    assert_eq!(model.media_type, MediaType::Video);
    // History survives the switch.
    assert_eq!(model.history.len(), 1);
}

#[test]
fn image_model_rejects_video_files() {
    let app = tester();
    let mut model = Model::default();

    app.update(
        Event::MediaSelected {
            file_name: "flight.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            bytes: vec![0],
        },
        &mut model,
    );

    assert!(model.staged_media.is_none());
    let error = model.active_error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Validation);
}

#[test]
fn seek_and_skip_drive_the_player() {
    let app = tester();
    let mut model = Model::default();

    select_video(&app, &mut model);
    run_mock_detection(&app, &mut model);

    let update = app.update(Event::SeekRequested { frame: 42 }, &mut model);
    assert_eq!(model.playback.current_frame(), 42);

    let seek = update
        .effects.into_iter()
        .find_map(|e| match e {
            Effect::Player(request) => Some(request.operation.clone()),
            _ => None,
        })
        .expect("seek should reach the player");
    match seek {
        PlayerOperation::SeekTo { seconds } => {
            assert!((seconds - 42.0 / 30.0).abs() < 1e-9);
        }
        other => panic!("unexpected player operation: {other:?}"),
    }

    // Near the end, skipping forward clamps to the final frame.
    app.update(Event::SeekRequested { frame: 147 }, &mut model);
    app.update(Event::SkipForwardRequested, &mut model);
    assert_eq!(model.playback.current_frame(), 149);

    app.update(Event::SkipBackwardRequested, &mut model);
    assert_eq!(model.playback.current_frame(), 139);
}

#[test]
fn playback_reflects_engine_reports() {
    let app = tester();
    let mut model = Model::default();

    select_video(&app, &mut model);
    run_mock_detection(&app, &mut model);

    app.update(Event::PlaybackStateChanged { playing: true }, &mut model);
    assert!(model.playback.is_playing());

    app.update(Event::PlaybackTimeUpdated { seconds: 2.5 }, &mut model);
    assert_eq!(model.playback.current_frame(), 75);

    app.update(Event::PlaybackEnded, &mut model);
    assert!(!model.playback.is_playing());
}

#[test]
fn history_selection_shows_past_run() {
    let app = tester();
    let mut model = Model::default();

    select_image(&app, &mut model);
    run_mock_detection(&app, &mut model);

    let id = model.history.items().next().unwrap().id.clone();
    app.update(Event::HistoryItemSelected { id: id.clone() }, &mut model);
    assert_eq!(model.selected_history_id.as_deref(), Some(id.as_str()));

    app.update(
        Event::HistoryItemSelected {
            id: "no-such-id".to_string(),
        },
        &mut model,
    );
    assert_eq!(model.selected_history_id.as_deref(), Some(id.as_str()));

    app.update(Event::HistoryDetailClosed, &mut model);
    assert!(model.selected_history_id.is_none());
}

#[test]
fn api_url_setting_round_trips() {
    let app = tester();
    let mut model = Model::default();

    app.update(
        Event::ApiUrlSet {
            url: "https://api.example.com/detect".to_string(),
        },
        &mut model,
    );
    assert_eq!(model.api_url, "https://api.example.com/detect");

    app.update(
        Event::ApiUrlSet {
            url: "ftp://nope".to_string(),
        },
        &mut model,
    );
    // Invalid URLs are rejected and the previous value kept.
    assert_eq!(model.api_url, "https://api.example.com/detect");
    assert_eq!(
        model.active_error.as_ref().unwrap().kind,
        ErrorKind::Validation
    );

    app.update(Event::ApiUrlReset, &mut model);
    assert_eq!(model.api_url, shared::DEFAULT_API_URL);
}
