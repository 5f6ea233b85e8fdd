use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use gateway_hooks::precompact::precompact;
use gateway_hooks::retrieve::retrieve;
use gateway_hooks::{GatewayClient, HookConfig};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct FakeGateway {
    stored: Arc<Mutex<Vec<Value>>>,
    /// Upserts accepted before answering 503
    capacity: Option<usize>,
}

async fn upsert(
    State(gateway): State<FakeGateway>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut stored = gateway.stored.lock().unwrap();
    if gateway.capacity.is_some_and(|cap| stored.len() >= cap) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    let point = body["points"][0].clone();
    stored.push(point.clone());
    Ok(Json(json!({
        "collection": body["collection"],
        "acknowledged": [point["id"]],
    })))
}

async fn collection(Path(name): Path<String>) -> StatusCode {
    if name == "claude_vectors" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn search(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["limit"], 10);
    Json(json!({
        "query": body["query"],
        "collection": body["collection"],
        "total": 1,
        "results": [{
            "id": "m1",
            "score": 0.8,
            "payload": {"role": "assistant", "content": "use cargo nextest"}
        }],
    }))
}

async fn spawn(gateway: FakeGateway) -> HookConfig {
    let app = Router::new()
        .route("/vectors/upsert", post(upsert))
        .route("/vectors/search", post(search))
        .route("/collections/{name}", get(collection))
        .with_state(gateway);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HookConfig {
        endpoint: format!("http://{}", addr),
        timeout: Duration::from_secs(2),
        token_threshold: 5,
        ..HookConfig::default()
    }
}

fn unreachable() -> HookConfig {
    HookConfig {
        endpoint: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_millis(500),
        token_threshold: 5,
        ..HookConfig::default()
    }
}

const LONG: &str = "one two three four five six seven";

fn transcript() -> String {
    [
        json!({"role": "user", "content": LONG, "timestamp": "t1"}).to_string(),
        json!({"role": "assistant", "content": "short reply"}).to_string(),
        "{broken json".to_string(),
        json!({"type": "assistant", "message": {"role": "assistant", "content": LONG}})
            .to_string(),
    ]
    .join("\n")
        + "\n"
}

fn write_transcript(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("session.jsonl");
    std::fs::write(&path, transcript()).unwrap();
    path
}

#[tokio::test]
async fn test_precompact_replaces_long_entries() {
    let gateway = FakeGateway::default();
    let config = spawn(gateway.clone()).await;
    let client = GatewayClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_transcript(&dir);

    let event = json!({"payload": {"transcript_path": path, "session_id": "s-1"}});
    let report = precompact(&client, &config, &event).await.unwrap();
    assert_eq!(report.status, "success");
    assert_eq!(report.vectorized, 2);
    assert_eq!(report.total_messages, 4);

    let stored = gateway.stored.lock().unwrap().clone();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["content"], LONG);
    assert_eq!(stored[0]["payload"]["role"], "user");
    assert_eq!(stored[0]["payload"]["timestamp"], "t1");
    assert_eq!(stored[0]["payload"]["session"], "s-1");
    assert_eq!(stored[0]["payload"]["source"], "precompact");

    let rewritten = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = rewritten.lines().collect();
    assert_eq!(lines.len(), 4);

    let first: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(
        first["content"],
        format!("[[VEC:{}]]", stored[0]["id"].as_str().unwrap())
    );
    assert_eq!(first["original_tokens"], 7);
    assert_eq!(lines[1], json!({"role": "assistant", "content": "short reply"}).to_string());
    assert_eq!(lines[2], "{broken json");

    let nested: Value = serde_json::from_str(lines[3]).unwrap();
    assert!(
        nested["message"]["content"]
            .as_str()
            .unwrap()
            .starts_with("[[VEC:")
    );
}

#[tokio::test]
async fn test_precompact_keeps_blank_lines() {
    let gateway = FakeGateway::default();
    let config = spawn(gateway).await;
    let client = GatewayClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spaced.jsonl");
    let short = json!({"role": "assistant", "content": "short reply"}).to_string();
    std::fs::write(
        &path,
        format!(
            "{}\n\n{}\n   \n",
            json!({"role": "user", "content": LONG}),
            short
        ),
    )
    .unwrap();

    let event = json!({"transcript_path": path});
    let report = precompact(&client, &config, &event).await.unwrap();
    assert_eq!(report.vectorized, 1);
    assert_eq!(report.total_messages, 2);

    let rewritten = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = rewritten.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("[[VEC:"));
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], short);
    assert_eq!(lines[3], "   ");
}

#[tokio::test]
async fn test_precompact_skips_when_gateway_is_down() {
    let config = unreachable();
    let client = GatewayClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_transcript(&dir);

    let event = json!({"transcript_path": path});
    let report = precompact(&client, &config, &event).await.unwrap();
    assert_eq!(report.status, "skipped");
    assert_eq!(report.vectorized, 0);
    assert!(report.reason.is_some());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), transcript());
}

#[tokio::test]
async fn test_precompact_keeps_progress_when_gateway_fails_midway() {
    let gateway = FakeGateway {
        capacity: Some(1),
        ..FakeGateway::default()
    };
    let config = spawn(gateway).await;
    let client = GatewayClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_transcript(&dir);

    let report = precompact(&client, &config, &json!({"transcript_path": path}))
        .await
        .unwrap();
    assert_eq!(report.status, "partial");
    assert_eq!(report.vectorized, 1);

    let rewritten = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = rewritten.lines().collect();
    assert!(lines[0].contains("[[VEC:"));
    assert!(lines[3].contains(LONG));
}

#[tokio::test]
async fn test_missing_transcript_is_not_a_gateway_failure() {
    let config = unreachable();
    let client = GatewayClient::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let event = json!({"transcript_path": dir.path().join("absent.jsonl")});
    let err = precompact(&client, &config, &event).await.unwrap_err();
    assert_eq!(err.kind(), "transcript");
}

#[tokio::test]
async fn test_retrieve_enriches_prompt() {
    let config = spawn(FakeGateway::default()).await;
    let client = GatewayClient::new(&config).unwrap();

    let event = json!({"hook_event_name": "UserPromptSubmit", "prompt": "how do we run tests"});
    let out = retrieve(&client, &config, &event).await;
    let prompt = out["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("how do we run tests\n\n## Retrieved Context"));
    assert!(prompt.contains("use cargo nextest"));

    let tool = json!({"hook_event_name": "PreToolUse", "tool_input": {"command": "cargo test"}});
    let out = retrieve(&client, &config, &tool).await;
    assert_eq!(out["decision"], "block");
}

#[tokio::test]
async fn test_retrieve_approves_on_failure_or_missing_collection() {
    let event = json!({"hook_event_name": "UserPromptSubmit", "prompt": "anything"});

    let down = unreachable();
    let client = GatewayClient::new(&down).unwrap();
    assert_eq!(
        retrieve(&client, &down, &event).await,
        json!({"decision": "approve"})
    );

    let mut config = spawn(FakeGateway::default()).await;
    config.collection = "empty".to_string();
    let client = GatewayClient::new(&config).unwrap();
    assert_eq!(
        retrieve(&client, &config, &event).await,
        json!({"decision": "approve"})
    );
}
