//! HTTP client tests against an in-process fake of the training API

use aitrain_client::{
    ChatNotifier, ClientError, JobApi, JobPoller, Notifier, NotifierConfig, PollConfig,
    TrainingClient,
};
use aitrain_core::domain::job::JobState;
use aitrain_core::domain::spec::JobSpec;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "valid-token";
const BOT_TOKEN: &str = "T0KEN";

struct FakeJob {
    body: Value,
    states: VecDeque<String>,
}

#[derive(Default)]
struct FakeService {
    jobs: HashMap<String, FakeJob>,
    next_id: usize,
    script: Vec<String>,
    logs: String,
    last_request: Option<Value>,
    messages: Vec<Value>,
    /// Status the chat bot answers with; `None` accepts every message
    notify_status: Option<StatusCode>,
}

type Shared = Arc<Mutex<FakeService>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "invalid credentials").into_response()
}

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("job {} not found", id)).into_response()
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"user": "user-abc", "tenant": "tenant-1"})).into_response()
}

async fn create_job(State(state): State<Shared>, headers: HeaderMap, Json(req): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let image = req["image"].as_str().unwrap_or_default().to_string();
    if image.is_empty() {
        return (StatusCode::BAD_REQUEST, "image is required").into_response();
    }

    let mut service = state.lock().unwrap();
    service.next_id += 1;
    let id = format!("job-{}", service.next_id);
    let body = json!({
        "id": id,
        "createdAt": "2024-03-01T10:00:00Z",
        "spec": {"image": image, "timeout": req.get("timeout").cloned().unwrap_or(Value::Null)},
        "status": {"state": "QUEUED"}
    });
    let states = service.script.iter().cloned().collect();

    service.last_request = Some(req);
    service.jobs.insert(id, FakeJob { body: body.clone(), states });

    Json(body).into_response()
}

async fn get_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut service = state.lock().unwrap();
    let Some(job) = service.jobs.get_mut(&id) else {
        return not_found(&id);
    };

    let next = if job.states.len() > 1 {
        job.states.pop_front()
    } else {
        job.states.front().cloned()
    };
    if let Some(next) = next {
        job.body["status"]["state"] = json!(next);
    }

    Json(job.body.clone()).into_response()
}

async fn get_logs(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let service = state.lock().unwrap();
    if !service.jobs.contains_key(&id) {
        return not_found(&id);
    }
    service.logs.clone().into_response()
}

async fn start_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    set_state(state, headers, id, "QUEUED")
}

async fn kill_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    set_state(state, headers, id, "INTERRUPTING")
}

fn set_state(state: Shared, headers: HeaderMap, id: String, new_state: &str) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut service = state.lock().unwrap();
    let Some(job) = service.jobs.get_mut(&id) else {
        return not_found(&id);
    };
    job.body["status"]["state"] = json!(new_state);
    job.states.clear();
    job.states.push_back(new_state.to_string());

    Json(job.body.clone()).into_response()
}

async fn delete_job(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    match state.lock().unwrap().jobs.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&id),
    }
}

async fn send_message(State(state): State<Shared>, Json(message): Json<Value>) -> Response {
    let mut service = state.lock().unwrap();
    service.messages.push(message);

    match service.notify_status {
        Some(status) => (status, "bot unavailable").into_response(),
        None => Json(json!({"ok": true})).into_response(),
    }
}

/// Starts the fake service and returns its base URL
async fn spawn_service(script: &[&str], logs: &str) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeService {
        script: script.iter().map(|s| s.to_string()).collect(),
        logs: logs.to_string(),
        ..Default::default()
    }));

    let app = Router::new()
        .route("/v1/me", get(me))
        .route("/v1/job", post(create_job))
        .route("/v1/job/{id}", get(get_job).delete(delete_job))
        .route("/v1/job/{id}/log", get(get_logs))
        .route("/v1/job/{id}/start", put(start_job))
        .route("/v1/job/{id}/kill", put(kill_job))
        .route(&format!("/bot{}/sendMessage", BOT_TOKEN), post(send_message))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

async fn connect(base_url: &str) -> TrainingClient {
    TrainingClient::connect_to(base_url, TOKEN).await.unwrap()
}

#[tokio::test]
async fn test_connect_validates_token() {
    let (base_url, _) = spawn_service(&["DONE"], "").await;

    let client = connect(&format!("{}/", base_url)).await;
    assert_eq!(client.base_url(), base_url);
    assert_eq!(client.me().await.unwrap().user, "user-abc");

    let err = TrainingClient::connect_to(&base_url, "wrong-token")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Auth { status: 401, .. }), "{err:?}");
}

#[tokio::test]
async fn test_submit_sends_cpu_only_resources() {
    let (base_url, state) = spawn_service(&["RUNNING"], "").await;
    let client = connect(&base_url).await;

    let handle = client
        .submit_job(&JobSpec::new("ubuntu").with_resources(2, 4))
        .await
        .unwrap();

    assert_eq!(handle.id, "job-1");
    assert_eq!(handle.state, JobState::Queued);

    let request = state.lock().unwrap().last_request.clone().unwrap();
    assert_eq!(request["resources"], json!({"cpu": 2, "gpu": 0}));
    assert_eq!(request["deletionRequested"], false);
    assert!(request.get("name").is_none());
}

#[tokio::test]
async fn test_refused_submission_carries_body() {
    let (base_url, _) = spawn_service(&["RUNNING"], "").await;
    let client = connect(&base_url).await;

    let err = client.submit_job(&JobSpec::new("")).await.unwrap_err();

    match err {
        ClientError::Submission { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "image is required");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_control_operations_on_missing_job_are_typed() {
    let (base_url, _) = spawn_service(&["RUNNING"], "").await;
    let client = connect(&base_url).await;

    let err = client.start_job("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Start { status: 404, .. }), "{err:?}");

    let err = client.stop_job("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Stop { status: 404, .. }), "{err:?}");

    let err = client.delete_job("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Delete { status: 404, .. }), "{err:?}");

    let err = client.get_info("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::InfoFetch { status: 404, .. }), "{err:?}");

    let err = client.get_logs("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::LogFetch { status: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn test_job_id_is_stable_until_deleted() {
    let (base_url, _) = spawn_service(&["RUNNING", "RUNNING", "DONE"], "").await;
    let client = connect(&base_url).await;

    let handle = client.submit_job(&JobSpec::new("ubuntu")).await.unwrap();
    for _ in 0..4 {
        let job = client.get_info(&handle.id).await.unwrap();
        assert_eq!(job.id, handle.id);
    }

    let body = client.delete_job(&handle.id).await.unwrap();
    assert!(body.is_empty());

    let err = client.get_info(&handle.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_stop_and_start_return_raw_body() {
    let (base_url, _) = spawn_service(&["RUNNING"], "").await;
    let client = connect(&base_url).await;
    let handle = client.submit_job(&JobSpec::new("ubuntu")).await.unwrap();

    let body = client.stop_job(&handle.id).await.unwrap();
    let stopped: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stopped["status"]["state"], "INTERRUPTING");

    let body = client.start_job(&handle.id).await.unwrap();
    let started: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(started["status"]["state"], "QUEUED");
    assert_eq!(started["id"], handle.id.as_str());
}

#[tokio::test]
async fn test_run_until_done() {
    let (base_url, _) = spawn_service(&["INITIALIZING", "RUNNING", "DONE"], "never read").await;
    let client = connect(&base_url).await;
    let config = PollConfig::default().with_interval(Duration::from_millis(10));

    let job = JobPoller::new(client, config)
        .run(&JobSpec::new("ubuntu").with_command(["echo", "hi"]))
        .await
        .unwrap();

    assert_eq!(job.state(), &JobState::Done);
    assert_eq!(job.extra.get("createdAt"), None);
    assert!(job.created_at.is_some());
}

#[tokio::test]
async fn test_run_reports_failure_with_logs() {
    let (base_url, _) = spawn_service(&["RUNNING", "FAILED"], "CUDA out of memory").await;
    let client = connect(&base_url).await;
    let config = PollConfig::default().with_interval(Duration::from_millis(10));

    let err = JobPoller::new(client, config)
        .run(&JobSpec::new("ubuntu"))
        .await
        .unwrap_err();

    match err {
        ClientError::JobFailed { state, logs, .. } => {
            assert_eq!(state, JobState::Failed);
            assert_eq!(logs, "CUDA out of memory");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_run_hits_local_timeout() {
    let (base_url, _) = spawn_service(&["RUNNING"], "").await;
    let client = connect(&base_url).await;
    let config = PollConfig::default()
        .with_interval(Duration::from_millis(10))
        .with_local_timeout(Duration::from_millis(50));

    let err = JobPoller::new(client, config)
        .run(&JobSpec::new("ubuntu"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Timeout {
            budget: aitrain_client::Budget::Local,
            ..
        }
    ));
}

#[tokio::test]
async fn test_job_id_stays_one_path_segment() {
    let (base_url, _) = spawn_service(&["RUNNING"], "").await;
    let client = connect(&base_url).await;

    let err = client.stop_job("a/b").await.unwrap_err();
    match err {
        ClientError::Stop { id, status, body } => {
            assert_eq!(id, "a/b");
            assert_eq!(status, 404);
            assert_eq!(body, "job a/b not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.get_info("x?y").await.unwrap_err();
    match err {
        ClientError::InfoFetch { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "job x?y not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.delete_job("..").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidJobId(_)), "{err:?}");
}

fn chat_notifier(base_url: &str) -> ChatNotifier {
    let config = NotifierConfig::new(BOT_TOKEN, "42").with_endpoint(base_url);
    ChatNotifier::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_run_notifies_each_state_change() {
    let (base_url, state) = spawn_service(&["RUNNING", "DONE"], "").await;
    let client = connect(&base_url).await;
    let config = PollConfig::default().with_interval(Duration::from_millis(10));

    let job = JobPoller::new(client, config)
        .with_notifier(Arc::new(chat_notifier(&base_url)))
        .run(&JobSpec::new("ubuntu"))
        .await
        .unwrap();

    assert_eq!(job.state(), &JobState::Done);

    let messages = state.lock().unwrap().messages.clone();
    assert_eq!(
        messages,
        vec![
            json!({"chat_id": "42", "text": "Job job-1 is now QUEUED"}),
            json!({"chat_id": "42", "text": "Job job-1 is now RUNNING"}),
            json!({"chat_id": "42", "text": "Job job-1 is now DONE"}),
        ]
    );
}

#[tokio::test]
async fn test_refused_notification_does_not_fail_run() {
    let (base_url, state) = spawn_service(&["RUNNING", "DONE"], "").await;
    state.lock().unwrap().notify_status = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let notifier = chat_notifier(&base_url);

    let err = notifier.notify("job-0", &JobState::Running).await.unwrap_err();
    match err {
        ClientError::Notification { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "bot unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let client = connect(&base_url).await;
    let config = PollConfig::default().with_interval(Duration::from_millis(10));
    let job = JobPoller::new(client, config)
        .with_notifier(Arc::new(notifier))
        .run(&JobSpec::new("ubuntu"))
        .await
        .unwrap();

    assert_eq!(job.state(), &JobState::Done);
    assert_eq!(state.lock().unwrap().messages.len(), 4);
}
