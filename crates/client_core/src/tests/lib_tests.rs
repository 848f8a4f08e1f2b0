use super::*;
use std::{
    collections::HashMap,
    env, fs,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{Mode, QueryParams},
    protocol::REPORT_FILE_NAME,
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::download::download_report;

#[derive(Clone)]
struct ScriptedResponse {
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
    delay: Duration,
}

impl ScriptedResponse {
    fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
            delay: Duration::ZERO,
        }
    }

    fn raw(status: StatusCode, content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status,
            content_type,
            body: body.to_vec(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Default)]
struct MockApiState {
    validate_by_mode: Arc<Mutex<HashMap<Mode, ScriptedResponse>>>,
    generate_report: Arc<Mutex<Option<ScriptedResponse>>>,
    received: Arc<Mutex<Vec<ValidateRequest>>>,
}

impl MockApiState {
    async fn on_validate(&self, mode: Mode, response: ScriptedResponse) {
        self.validate_by_mode.lock().await.insert(mode, response);
    }

    async fn on_generate_report(&self, response: ScriptedResponse) {
        *self.generate_report.lock().await = Some(response);
    }
}

fn scripted_into_response(scripted: ScriptedResponse) -> Response {
    (
        scripted.status,
        [(axum::http::header::CONTENT_TYPE, scripted.content_type)],
        scripted.body,
    )
        .into_response()
}

async fn handle_validate(
    State(state): State<MockApiState>,
    Json(request): Json<ValidateRequest>,
) -> Response {
    state.received.lock().await.push(request.clone());
    let scripted = state
        .validate_by_mode
        .lock()
        .await
        .get(&request.mode)
        .cloned()
        .unwrap_or_else(|| {
            ScriptedResponse::json(StatusCode::OK, serde_json::json!({ "report": {} }))
        });
    tokio::time::sleep(scripted.delay).await;
    scripted_into_response(scripted)
}

async fn handle_generate_report(State(state): State<MockApiState>) -> Response {
    let scripted = state.generate_report.lock().await.clone().unwrap_or_else(|| {
        ScriptedResponse::json(
            StatusCode::OK,
            serde_json::json!({ "error": "no report configured" }),
        )
    });
    scripted_into_response(scripted)
}

async fn spawn_mock_api(state: MockApiState) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/validate", post(handle_validate))
        .route("/generate_report", get(handle_generate_report))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn temp_dir(label: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("idea_validator_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[tokio::test]
async fn validate_posts_idea_and_mode_and_returns_nested_report() {
    let state = MockApiState::default();
    state
        .on_validate(
            Mode::Deep,
            ScriptedResponse::json(
                StatusCode::OK,
                serde_json::json!({
                    "idea": "robot barista",
                    "mode": "deep",
                    "report": {
                        "problem": "Queues at peak hours",
                        "traction": { "monthly_mrr": [1, 2, 3] },
                    },
                }),
            ),
        )
        .await;
    let api_base = spawn_mock_api(state.clone()).await.expect("spawn api");

    let api = HttpValidationApi::new(format!("{api_base}/"));
    let report = api
        .validate(&ValidateRequest::new("robot barista", Mode::Deep))
        .await
        .expect("validate");

    assert_eq!(report.problem(), Some("Queues at peak hours"));
    assert_eq!(report.mrr_series(), vec![1.0, 2.0, 3.0]);
    assert_eq!(
        state.received.lock().await.as_slice(),
        &[ValidateRequest::new("robot barista", Mode::Deep)]
    );
}

#[tokio::test]
async fn server_error_with_error_body_shows_exact_message() {
    let state = MockApiState::default();
    state
        .on_validate(
            Mode::Fast,
            ScriptedResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "bad idea" }),
            ),
        )
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");

    let controller = ReportFetchController::new(Arc::new(HttpValidationApi::new(api_base)));
    let outcome = controller
        .fetch(QueryParams::new("sell ice to penguins", Mode::Fast))
        .await;

    assert_eq!(
        outcome,
        FetchOutcome::Applied(FetchState::Error("bad idea".to_string()))
    );
    assert_eq!(
        controller.snapshot().state,
        FetchState::Error("bad idea".to_string())
    );
}

#[tokio::test]
async fn error_field_fails_even_with_success_status() {
    let state = MockApiState::default();
    state
        .on_validate(
            Mode::Fast,
            ScriptedResponse::json(
                StatusCode::OK,
                serde_json::json!({ "error": "Please enter a startup idea." }),
            ),
        )
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");

    let err = HttpValidationApi::new(api_base)
        .validate(&ValidateRequest::new("x", Mode::Fast))
        .await
        .expect_err("must fail");
    assert_eq!(err.user_message(), "Please enter a startup idea.");
}

#[tokio::test]
async fn failing_status_without_json_body_names_the_status() {
    let state = MockApiState::default();
    state
        .on_validate(
            Mode::Fast,
            ScriptedResponse::raw(
                StatusCode::SERVICE_UNAVAILABLE,
                "text/html",
                b"<html>upstream down</html>",
            ),
        )
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");

    let err = HttpValidationApi::new(api_base)
        .validate(&ValidateRequest::new("x", Mode::Fast))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::Status { .. }), "{err:?}");
    assert_eq!(err.user_message(), "Validate failed: 503");
}

#[tokio::test]
async fn undecodable_success_body_uses_generic_message() {
    let state = MockApiState::default();
    state
        .on_validate(
            Mode::Fast,
            ScriptedResponse::raw(StatusCode::OK, "application/json", b"{not json"),
        )
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");

    let err = HttpValidationApi::new(api_base)
        .validate(&ValidateRequest::new("x", Mode::Fast))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::Decode { .. }), "{err:?}");
    assert_eq!(err.user_message(), error::GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn unreachable_api_surfaces_generic_error_state() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let controller =
        ReportFetchController::new(Arc::new(HttpValidationApi::new(format!("http://{addr}"))));
    let outcome = controller.fetch(QueryParams::new("x", Mode::Fast)).await;

    assert_eq!(
        outcome,
        FetchOutcome::Applied(FetchState::Error(
            error::GENERIC_FAILURE_MESSAGE.to_string()
        ))
    );
}

#[tokio::test]
async fn slow_fast_mode_failure_never_replaces_deep_result() {
    let state = MockApiState::default();
    state
        .on_validate(
            Mode::Fast,
            ScriptedResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "fast mode exploded" }),
            )
            .delayed(Duration::from_millis(300)),
        )
        .await;
    state
        .on_validate(
            Mode::Deep,
            ScriptedResponse::json(
                StatusCode::OK,
                serde_json::json!({ "report": { "problem": "deep problem" } }),
            ),
        )
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");
    let controller = ReportFetchController::new(Arc::new(HttpValidationApi::new(api_base)));

    let fast = controller.spawn_fetch(QueryParams::new("meal kits", Mode::Fast));
    let deep = controller.spawn_fetch(QueryParams::new("meal kits", Mode::Deep));

    assert_eq!(fast.await.expect("join fast"), FetchOutcome::Superseded);
    let FetchOutcome::Applied(FetchState::Success(report)) = deep.await.expect("join deep")
    else {
        panic!("deep request should succeed");
    };
    assert_eq!(report.problem(), Some("deep problem"));

    tokio::time::sleep(Duration::from_millis(400)).await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.params.mode, Mode::Deep);
    assert!(matches!(snapshot.state, FetchState::Success(_)));
}

#[tokio::test]
async fn download_saves_binary_report_under_fixed_name() {
    let state = MockApiState::default();
    state
        .on_generate_report(ScriptedResponse::raw(
            StatusCode::OK,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            b"PK\x03\x04docx-bytes",
        ))
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");
    let dir = temp_dir("download_ok");

    let api = HttpValidationApi::new(api_base);
    let path = download_report(&api, &dir).await.expect("download");

    assert_eq!(path, dir.join(REPORT_FILE_NAME));
    assert_eq!(fs::read(&path).expect("read saved"), b"PK\x03\x04docx-bytes");

    fs::remove_dir_all(dir).expect("cleanup");
}

#[tokio::test]
async fn download_json_payload_is_surfaced_as_alert() {
    let state = MockApiState::default();
    state
        .on_generate_report(ScriptedResponse::json(
            StatusCode::OK,
            serde_json::json!({ "error": "Validate an idea first" }),
        ))
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");
    let dir = temp_dir("download_err");

    let api = HttpValidationApi::new(api_base);
    let err = download_report(&api, &dir).await.expect_err("must fail");

    assert_eq!(err.alert_message(), "Validate an idea first");
    assert!(!dir.join(REPORT_FILE_NAME).exists());

    fs::remove_dir_all(dir).expect("cleanup");
}

#[tokio::test]
async fn download_json_payload_without_message_uses_fallback() {
    let state = MockApiState::default();
    state
        .on_generate_report(ScriptedResponse::raw(
            StatusCode::INTERNAL_SERVER_ERROR,
            "application/json; charset=utf-8",
            b"{}",
        ))
        .await;
    let api_base = spawn_mock_api(state).await.expect("spawn api");

    let err = HttpValidationApi::new(api_base)
        .generate_report()
        .await
        .expect_err("must fail");
    assert_eq!(err.alert_message(), error::REPORT_GENERATION_FAILED_MESSAGE);
}
