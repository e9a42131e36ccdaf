mod common;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chatrelay::backend;
use chatrelay::config::BackendConfig;
use serde_json::{json, Value};

use common::{spawn, Recorder};

/// Stand-in for the hosted completions API
async fn spawn_completions(reply: &'static str) -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                move |State(recorder): State<Recorder>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    recorder.push(json!({ "auth": auth, "body": body }));
                    Json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": reply } }]
                    }))
                },
            ),
        )
        .with_state(recorder.clone());
    (spawn(router).await, recorder)
}

async fn spawn_backend(base_url: String, api_key: Option<&str>) -> String {
    let config = BackendConfig {
        bind: "127.0.0.1:0".to_string(),
        api_key: api_key.map(str::to_string),
        base_url,
        request_timeout_secs: 5,
        ..BackendConfig::default()
    };
    spawn(backend::router(&config).unwrap()).await
}

async fn post_chat(backend_url: &str, body: &str) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", backend_url))
        .header("Content-Type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn health_check_reports_ok() {
    let backend = spawn_backend("http://127.0.0.1:9".to_string(), None).await;

    let body: Value = reqwest::get(format!("{}/", backend))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn completes_with_system_prompt_prepended() {
    let (completions, recorder) = spawn_completions("Breathe in, breathe out.").await;
    let backend = spawn_backend(completions, Some("sk-test")).await;

    let (status, body) = post_chat(
        &backend,
        r#"{"messages":[{"role":"user","content":"I feel stuck"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "Breathe in, breathe out." }));

    let calls = recorder.bodies();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["auth"], "Bearer sk-test");
    assert_eq!(calls[0]["body"]["model"], "gpt-4");
    assert_eq!(
        calls[0]["body"]["messages"],
        json!([
            { "role": "system", "content": "You are a supportive mental coach." },
            { "role": "user", "content": "I feel stuck" }
        ])
    );
}

#[tokio::test]
async fn caller_system_prompt_is_not_duplicated() {
    let (completions, recorder) = spawn_completions("ok").await;
    let backend = spawn_backend(completions, Some("sk-test")).await;

    let (status, _) = post_chat(
        &backend,
        r#"{"messages":[{"role":"system","content":"Be brief."},{"role":"user","content":"Hi"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let messages = &recorder.bodies()[0]["body"]["messages"];
    assert_eq!(messages.as_array().unwrap().len(), 2);
    assert_eq!(messages[0]["content"], "Be brief.");
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
    let (completions, recorder) = spawn_completions("unused").await;
    let backend = spawn_backend(completions, None).await;

    let (status, body) = post_chat(&backend, r#"{"messages":[]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "OPENAI_API_KEY not configured" }));
    assert!(recorder.bodies().is_empty());
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let (completions, recorder) = spawn_completions("unused").await;
    let backend = spawn_backend(completions, Some("sk-test")).await;

    for body in ["", "{oops", r#"{"history":[]}"#, r#"{"messages":"Hello"}"#] {
        let (status, response) = post_chat(&backend, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert!(response["error"].is_string());
    }

    let (_, response) = post_chat(&backend, r#"{"history":[]}"#).await;
    assert_eq!(response, json!({ "error": "Missing 'messages' field in request" }));
    assert!(recorder.bodies().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_reported() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let completions = spawn(router).await;
    let backend = spawn_backend(completions, Some("sk-test")).await;

    let (status, body) = post_chat(
        &backend,
        r#"{"messages":[{"role":"user","content":"Hi"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Error calling OpenAI API: "), "{}", error);
    assert!(error.contains("rate limited"), "{}", error);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let backend = spawn_backend("http://127.0.0.1:9".to_string(), None).await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/api/chat", backend))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
