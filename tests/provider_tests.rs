use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_openai::types::chat::ReasoningEffort;
use axum::{Json, Router, extract::State, routing::post};
use lingua_tutor::{
    CompletionOptions, ProviderError, TextCompletionClient,
    config::{OpenAiEnv, StageOptions},
    provider::OpenAiCompletionClient,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// What the stub chat-completions endpoint answers with.
#[derive(Clone)]
struct Stub {
    content: Value,
    delay:   Duration,
    body:    Arc<Mutex<Option<Value>>>,
}

impl Stub {
    fn replying(content: Value) -> Self {
        Self {
            content,
            delay: Duration::ZERO,
            body: Arc::default(),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn last_body(&self) -> Value {
        self.body
            .lock()
            .expect("body lock")
            .clone()
            .expect("a request reached the stub")
    }
}

async fn chat_completions(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    *stub.body.lock().expect("body lock") = Some(body);
    tokio::time::sleep(stub.delay).await;
    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 0,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": stub.content, "refusal": null },
            "finish_reason": "stop",
            "logprobs": null
        }]
    }))
}

async fn spawn_stub(stub: Stub) -> SocketAddr {
    let app = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(stub);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    addr
}

fn client_for(env: OpenAiEnv, timeout: Duration) -> OpenAiCompletionClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    OpenAiCompletionClient::new(env, http, timeout)
}

fn env_for(addr: SocketAddr) -> OpenAiEnv {
    OpenAiEnv::new(format!("http://{addr}"), "test-key", "gpt-4o-mini")
}

#[tokio::test]
async fn returns_the_first_choice_content() {
    let stub = Stub::replying(json!("Clean"));
    let addr = spawn_stub(stub.clone()).await;
    let client = client_for(env_for(addr), Duration::from_secs(5));

    let text = client
        .complete("Is this clean?", &CompletionOptions::default())
        .await
        .expect("completion");
    assert_eq!(text, "Clean");

    let body = stub.last_body();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Is this clean?");
}

#[tokio::test]
async fn slow_provider_times_out() {
    let stub = Stub::replying(json!("too late")).delayed(Duration::from_millis(500));
    let addr = spawn_stub(stub).await;
    let client = client_for(env_for(addr), Duration::from_millis(100));

    let err = client
        .complete("hello", &CompletionOptions::default())
        .await
        .unwrap_err();
    match err {
        ProviderError::Timeout(after) => assert_eq!(after, Duration::from_millis(100)),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn null_content_is_an_empty_response() {
    let addr = spawn_stub(Stub::replying(Value::Null)).await;
    let client = client_for(env_for(addr), Duration::from_secs(5));

    let err = client
        .complete("hello", &CompletionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse), "got {err:?}");
}

#[tokio::test]
async fn moderation_options_reach_the_request_body() {
    let stub = Stub::replying(json!("Clean"));
    let addr = spawn_stub(stub.clone()).await;
    let client = client_for(env_for(addr), Duration::from_secs(5));

    client
        .complete("Screen this.", &StageOptions::default().moderation)
        .await
        .expect("completion");

    let body = stub.last_body();
    assert_eq!(body["temperature"], json!(0.0));
    assert_eq!(body["max_completion_tokens"], json!(5));
    assert!(body.get("reasoning_effort").is_none());
}

#[tokio::test]
async fn stage_model_overrides_the_default_model() {
    let stub = Stub::replying(json!("ok"));
    let addr = spawn_stub(stub.clone()).await;
    let client = client_for(env_for(addr), Duration::from_secs(5));

    let options = CompletionOptions::builder().model("gpt-4o").build();
    client.complete("hi", &options).await.expect("completion");

    assert_eq!(stub.last_body()["model"], "gpt-4o");
}

#[tokio::test]
async fn reasoning_effort_suppresses_temperature() {
    let stub = Stub::replying(json!("Clean"));
    let addr = spawn_stub(stub.clone()).await;
    let env = env_for(addr).with_reasoning_effort(ReasoningEffort::Low);
    let client = client_for(env, Duration::from_secs(5));

    client
        .complete("Screen this.", &StageOptions::default().moderation)
        .await
        .expect("completion");

    let body = stub.last_body();
    assert!(body.get("temperature").is_none(), "sent {body}");
    assert_eq!(body["reasoning_effort"], "low");
    assert_eq!(body["max_completion_tokens"], json!(5));
}
