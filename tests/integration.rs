//! End-to-end tests against an in-process HTTP API
//!
//! These tests run full suites through the real reqwest-backed client
//! against a small axum server that mimics the system under test: a login
//! endpoint issuing a bearer token and an in-memory users resource.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use apiflow::{
    Config, FailFast, Matcher, ReqwestClient, RequestStep, Runner, TaskQueue, ValueType,
};

const TOKEN: &str = "tok-emily-1";

#[derive(Clone, Default)]
struct AppState {
    users: Arc<Mutex<HashMap<u64, Value>>>,
    next_id: Arc<Mutex<u64>>,
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] == "emilys" && body["password"] == "emilyspass" {
        (StatusCode::OK, Json(json!({ "token": TOKEN })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
    }
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "missing or invalid token"})),
        );
    }

    let mut next_id = state.next_id.lock().unwrap();
    *next_id += 1;
    let id = *next_id;

    let mut user = body;
    user["id"] = json!(id);
    state.users.lock().unwrap().insert(id, user.clone());
    (StatusCode::CREATED, Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> (StatusCode, Json<Value>) {
    match state.users.lock().unwrap().get(&id) {
        Some(user) => (StatusCode::OK, Json(user.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "user not found"})),
        ),
    }
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> (StatusCode, Json<Value>) {
    match state.users.lock().unwrap().remove(&id) {
        Some(_) => (StatusCode::OK, Json(json!({ "id": id }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "user not found"})),
        ),
    }
}

/// Start the stub API on an ephemeral port and return its base URL
async fn spawn_api() -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/users/add", post(create_user))
        .route("/users/:id", get(get_user).delete(delete_user))
        .with_state(AppState::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.base_url = Some(base_url.to_string());
    config
        .credentials
        .insert("username".to_string(), "emilys".to_string());
    config
        .credentials
        .insert("password".to_string(), "emilyspass".to_string());
    config
}

fn login_step() -> RequestStep {
    RequestStep::post("/auth/login")
        .name("login")
        .body(json!({"username": "{env.username}", "password": "{env.password}"}))
        .expect("status", Matcher::Eq(json!(200)))
        .expect("body.token", Matcher::TypeOf(ValueType::String))
        .save_env("token", "body.token")
        .alias("login")
}

#[tokio::test]
async fn login_create_fetch_delete_flow() {
    let base_url = spawn_api().await;
    let config = test_config(&base_url);

    let mut queue = TaskQueue::new("user flow");
    login_step().enqueue(&mut queue);
    RequestStep::post("/users/add")
        .name("create user")
        .bearer_from_env("token")
        .body(json!({
            "firstName": "Kalethar",
            "lastName": "Stormblade",
            "username": "kalethar_user",
            "email": "kalethar@example.com",
        }))
        .expect("status", Matcher::Eq(json!(201)))
        .expect("body.id", Matcher::TypeOf(ValueType::Number))
        .save_env("created_id", "body.id")
        .alias("createUser")
        .enqueue(&mut queue);
    RequestStep::get("/users/{alias.createUser.body.id}")
        .name("fetch created user")
        .expect("status", Matcher::Eq(json!(200)))
        .expect("body.username", Matcher::Eq(json!("kalethar_user")))
        .alias("getUser")
        .enqueue(&mut queue);
    RequestStep::delete("/users/{env.created_id}")
        .name("delete user")
        .expect("status", Matcher::Eq(json!(200)))
        .enqueue(&mut queue);

    let mut runner = Runner::new(&config, Arc::new(ReqwestClient::new()));
    let report = runner.run(vec![queue]).await;
    assert!(!report.has_failures(), "{report:#?}");

    // The fetch observed exactly the document the create produced.
    let ctx = runner.context();
    let created = ctx.aliases.resolve("createUser").unwrap();
    let fetched = ctx.aliases.resolve("getUser").unwrap();
    assert_eq!(created["body"], fetched["body"]);
}

#[tokio::test]
async fn token_published_by_login_is_visible_across_suites() {
    let base_url = spawn_api().await;
    let config = test_config(&base_url);

    let mut auth_suite = TaskQueue::new("auth");
    login_step().enqueue(&mut auth_suite);

    // A different suite, same run: no login of its own.
    let mut users_suite = TaskQueue::new("users");
    RequestStep::post("/users/add")
        .name("create with shared token")
        .bearer_from_env("token")
        .body(json!({"firstName": "Velra", "username": "velra_user"}))
        .expect("status", Matcher::Eq(json!(201)))
        .enqueue(&mut users_suite);

    let mut runner = Runner::new(&config, Arc::new(ReqwestClient::new()));
    let report = runner.run(vec![auth_suite, users_suite]).await;
    assert!(!report.has_failures(), "{report:#?}");
    assert_eq!(
        runner.context().env.get_str("token").as_deref(),
        Some(TOKEN)
    );
}

#[tokio::test]
async fn missing_user_is_404_under_leniency_and_failure_without() {
    let base_url = spawn_api().await;
    let config = test_config(&base_url);

    let mut lenient = TaskQueue::new("lenient");
    RequestStep::get("/users/12346")
        .name("fetch deleted user")
        .fail_on_status_code(false)
        .expect("status", Matcher::Eq(json!(404)))
        .enqueue(&mut lenient);

    let mut strict = TaskQueue::new("strict");
    RequestStep::get("/users/12346")
        .name("fetch deleted user strictly")
        .enqueue(&mut strict);

    let mut runner = Runner::new(&config, Arc::new(ReqwestClient::new()));
    let report = runner.run(vec![lenient, strict]).await;

    assert!(!report.suites[0].has_failures(), "{report:#?}");
    assert!(report.suites[1].has_failures());
    match &report.suites[1].steps[0].status {
        apiflow::engine::StepStatus::Failed { kind, message } => {
            assert_eq!(*kind, apiflow::FailureKind::Status);
            assert!(message.contains("404"), "{message}");
        }
        other => panic!("unexpected status {other:?}"),
    }
}

#[tokio::test]
async fn invalid_credentials_fail_the_login_step() {
    let base_url = spawn_api().await;
    let mut config = test_config(&base_url);
    config
        .credentials
        .insert("password".to_string(), "wrongpass".to_string());
    config.fail_fast = FailFast::Suite;

    let mut queue = TaskQueue::new("auth");
    login_step().enqueue(&mut queue);
    RequestStep::post("/users/add")
        .name("never runs")
        .bearer_from_env("token")
        .body(json!({"username": "x"}))
        .enqueue(&mut queue);

    let mut runner = Runner::new(&config, Arc::new(ReqwestClient::new()));
    let report = runner.run(vec![queue]).await;

    assert!(report.suites[0].aborted);
    assert!(report.suites[0].steps[0].is_failure());
    assert!(report.suites[0].steps[1].is_skipped());
    // The failed login released its alias and published no token.
    assert!(runner.context().env.get("token").is_none());
    assert!(runner.context().aliases.resolve("login").is_err());
}

#[tokio::test]
async fn yaml_suite_runs_end_to_end() {
    let base_url = spawn_api().await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("newUser.json"),
        serde_json::to_string_pretty(&json!({
            "firstName": "Kalethar",
            "lastName": "Stormblade",
            "username": "kalethar_user",
            "email": "kalethar@example.com",
        }))
        .unwrap(),
    )
    .unwrap();

    let suite_path = dir.path().join("users.yaml");
    std::fs::write(
        &suite_path,
        r#"
name: user flow
description: create a user from fixture, validate and delete it cleanly
commands:
  login:
    request: { method: POST, path: /auth/login }
    body: { username: "{env.username}", password: "{env.password}" }
    expect:
      - { path: status, equals: 200 }
      - { path: body.token, type: string }
    save_env: { token: body.token }
steps:
  - command: login
  - request: { method: POST, path: /users/add }
    name: create user
    alias: createUser
    bearer_env: token
    body_fixture: newUser
    expect:
      - { path: status, equals: 201 }
      - { path: body, includes: { firstName: Kalethar, email: kalethar@example.com } }
      - { path: body.id, type: number }
    save_env: { created_id: body.id }
  - request: { method: GET, path: "/users/{alias.createUser.body.id}" }
    name: fetch created user
    expect:
      - { path: status, equals: 200 }
      - { path: body.username, equals: kalethar_user }
  - request: { method: DELETE, path: "/users/{env.created_id}" }
    name: delete user
    expect:
      - { path: status, equals: 200 }
"#,
    )
    .unwrap();

    let mut config = test_config(&base_url);
    config.fixtures_dir = dir.path().to_path_buf();

    let queue = apiflow::suite::compile(apiflow::suite::load_suite(&suite_path).unwrap()).unwrap();
    let mut runner = Runner::new(&config, Arc::new(ReqwestClient::new()));
    let report = runner.run(vec![queue]).await;

    assert!(!report.has_failures(), "{report:#?}");
    assert_eq!(report.total_steps(), 4);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn check_style_compilation_never_touches_the_network() {
    // No server at this address; compilation must still succeed.
    let suite: apiflow::suite::SuiteFile = serde_yaml::from_str(
        r#"
name: offline
commands:
  login:
    request: { method: POST, path: /auth/login }
steps:
  - command: login
  - request: { method: GET, path: /users/1 }
"#,
    )
    .unwrap();

    let queue = apiflow::suite::compile(suite).unwrap();
    assert_eq!(
        queue
            .step_names()
            .into_iter()
            .map(|(n, _)| n)
            .collect::<Vec<_>>(),
        vec!["POST /auth/login", "GET /users/1"]
    );
}
