
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use lingua_tutor::{
    CompletionOptions, TextCompletionClient,
    config::StageOptions,
    server::{AppState, router},
    tutor::TutorPrompts,
};
use mock_backends::{FailingClient, ScriptedClient, Step, reply};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app<C: TextCompletionClient + 'static>(client: C) -> Router {
    router(AppState::new(client, &TutorPrompts::load(), &StageOptions::default()))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

fn chat_script(verdict: Step) -> ScriptedClient {
    ScriptedClient::new([
        reply(r#"{"mark": 8, "mistakes": ["minor tense issue"]}"#),
        reply("Good job, minor tense issue noted."),
        verdict,
    ])
}

#[tokio::test]
async fn chat_returns_mark_and_feedback() {
    let (status, body) = post(
        app(chat_script(reply("Clean"))),
        "/api/chat",
        json!({ "language": "French", "answer": "Je suis allé au magasin" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "mark": 8, "feedback": "Good job, minor tense issue noted." })
    );
}

#[tokio::test]
async fn chat_rejects_flagged_feedback() {
    let (status, body) = post(
        app(chat_script(reply("Flagged"))),
        "/api/chat",
        json!({ "language": "French", "answer": "Je suis allé au magasin" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Generated feedback contains inappropriate content.");
    assert!(body.get("feedback").is_none());
}

#[tokio::test]
async fn chat_succeeds_when_moderation_is_down() {
    let (status, body) = post(
        app(chat_script(Step::Fail)),
        "/api/chat",
        json!({ "language": "French", "answer": "Je suis allé au magasin" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mark"], 8);
}

#[tokio::test]
async fn chat_validates_fields() {
    let client = ScriptedClient::new([]);
    let (status, body) = post(
        app(client.clone()),
        "/api/chat",
        json!({ "language": 42 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    let fields: Vec<&str> = errors
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, ["language", "answer"]);
    assert!(client.prompts().is_empty());
}

#[tokio::test]
async fn chat_rejects_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("build request");
    let (status, body) = send(app(ScriptedClient::new([])), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn chat_hides_provider_details() {
    let (status, body) = post(
        app(FailingClient),
        "/api/chat",
        json!({ "language": "French", "answer": "Bonjour" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("graded"));
    assert!(!message.contains("connection refused"));
}

#[tokio::test]
async fn chat_reports_unparseable_grades() {
    let client = ScriptedClient::new([reply("Eight out of ten!")]);
    let (status, body) = post(
        app(client),
        "/api/chat",
        json!({ "language": "French", "answer": "Bonjour" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().expect("message").contains("Eight"));
}

#[tokio::test]
async fn lesson_exercise_and_feedback_return_text() {
    let (status, body) = post(
        app(ScriptedClient::new([reply("A lesson.")])),
        "/api/lesson",
        json!({ "language": "German", "topic": "articles" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "lesson": "A lesson." }));

    let (status, body) = post(
        app(ScriptedClient::new([reply("An exercise.")])),
        "/api/exercise",
        json!({ "language": "German", "topic": "articles" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "exercise": "An exercise." }));

    let (status, body) = post(
        app(ScriptedClient::new([reply("Some feedback.")])),
        "/api/feedback",
        json!({ "language": "German", "answer": "Der Hund" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "feedback": "Some feedback." }));
}

#[tokio::test]
async fn lesson_routes_use_the_lesson_options() {
    let client = ScriptedClient::new([reply("A lesson.")]);
    let stages = StageOptions {
        lesson: CompletionOptions::builder().model("lesson-model").max_tokens(400).build(),
        ..StageOptions::default()
    };
    let app = router(AppState::new(client.clone(), &TutorPrompts::load(), &stages));

    let (status, _) = post(
        app,
        "/api/lesson",
        json!({ "language": "german", "topic": "cases" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(client.options(), [stages.lesson]);
}

#[tokio::test]
async fn lesson_requires_both_fields() {
    let (status, body) = post(
        app(ScriptedClient::new([])),
        "/api/lesson",
        json!({ "language": "German" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Language and topic are required.");
}

#[tokio::test]
async fn exercise_reports_provider_failure() {
    let (status, body) = post(
        app(FailingClient),
        "/api/exercise",
        json!({ "language": "German", "topic": "articles" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate exercise.");
}

#[tokio::test]
async fn health_is_ok() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let (status, body) = send(app(FailingClient), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
