// tests/api_tests.rs

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use mindmap_backend::{
    config::Config,
    error::AppError,
    exam::ExamEngine,
    models::exam_record::{ExamAnswerRecord, ExamAttempt, NewExamAttempt},
    routes,
    state::AppState,
    store::{AttemptStore, MemorySessionStore, SqliteStore},
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{StubGenerator, mind_map, two_question_reply};

const JWT_SECRET: &str = "test_secret_for_integration_tests";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:1".to_string(),
        openai_model: "test-model".to_string(),
        mindmap_path: "unused".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
    }
}

/// Attempt store whose first summary write fails.
struct FailOnceAttempts {
    inner: Arc<SqliteStore>,
    failed: AtomicBool,
}

#[async_trait]
impl AttemptStore for FailOnceAttempts {
    async fn insert_attempt(&self, attempt: &NewExamAttempt) -> Result<String, AppError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(AppError::Database("connection to /var/lib/app.db lost".into()));
        }
        self.inner.insert_attempt(attempt).await
    }

    async fn insert_answers(&self, answers: &[ExamAnswerRecord]) -> Result<(), AppError> {
        self.inner.insert_answers(answers).await
    }

    async fn list_attempts(&self, user_id: &str, limit: i64) -> Result<Vec<ExamAttempt>, AppError> {
        self.inner.list_attempts(user_id, limit).await
    }

    async fn get_attempt(&self, user_id: &str, id: &str) -> Result<Option<ExamAttempt>, AppError> {
        self.inner.get_attempt(user_id, id).await
    }

    async fn get_answers(&self, attempt_id: &str) -> Result<Vec<ExamAnswerRecord>, AppError> {
        self.inner.get_answers(attempt_id).await
    }
}

/// Builds the router over an in-memory database and a canned generator.
async fn spawn_app(reply: String) -> (Router, Arc<StubGenerator>) {
    spawn_app_with(reply, false).await
}

async fn spawn_app_with(reply: String, fail_first_summary: bool) -> (Router, Arc<StubGenerator>) {
    let store = Arc::new(
        SqliteStore::in_memory()
            .await
            .expect("Failed to create in-memory database"),
    );
    let generator = StubGenerator::new(reply);

    let attempts: Arc<dyn AttemptStore> = if fail_first_summary {
        Arc::new(FailOnceAttempts {
            inner: store.clone(),
            failed: AtomicBool::new(false),
        })
    } else {
        store.clone()
    };

    let engine = ExamEngine::new(mind_map(), store, attempts, generator.clone());
    let state = AppState {
        engine,
        sessions: Arc::new(MemorySessionStore::new()),
        config: test_config(),
    };

    (routes::create_router(state), generator)
}

fn token(user_id: &str) -> String {
    sign_jwt(user_id, None, JWT_SECRET, 600).unwrap()
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _) = spawn_app(two_question_reply()).await;
    let (status, _) = call(&app, Method::GET, "/random_path_that_does_not_exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected_without_side_effects() {
    let (app, generator) = spawn_app(two_question_reply()).await;

    let (status, body) = call(&app, Method::GET, "/api/mindmap", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        Some("not-a-token"),
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(generator.calls(), 0);

    let (status, _) = call(&app, Method::GET, "/api/exam/attempts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mind_map_starts_undiscovered() {
    let (app, _) = spawn_app(two_question_reply()).await;
    let token = token("fresh-user");

    let (status, body) = call(&app, Method::GET, "/api/mindmap", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let nodes = body["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    for node in nodes {
        assert_eq!(node["category"], "undiscovered");
        assert!(node["score"].is_null());
    }
    assert_eq!(body["edges"][0]["label"], "defines");
}

#[tokio::test]
async fn full_exam_flow_updates_scores_and_history() {
    let (app, generator) = spawn_app(two_question_reply()).await;
    let token = token("student-1");
    let token = Some(token.as_str());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        token,
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(generator.calls(), 1);
    assert_eq!(body["state"], "answering");
    assert_eq!(body["index"], 0);
    assert_eq!(body["totalQuestions"], 2);
    assert_eq!(body["question"]["options"].as_array().unwrap().len(), 4);
    assert!(body["question"].get("correctAnswer").is_none());

    // Cannot move on without an answer.
    let (status, _) = call(&app, Method::POST, "/api/exam/session/next", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selectedAnswer"], "A");

    let (status, body) = call(&app, Method::POST, "/api/exam/session/next", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "answering");
    assert_eq!(body["session"]["index"], 1);

    // Wrong answer on the second question.
    call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "C" })),
    )
    .await;

    let (status, body) = call(&app, Method::POST, "/api/exam/session/next", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    let result = &body["result"];
    assert_eq!(result["correctCount"], 1);
    assert_eq!(result["totalQuestions"], 2);
    assert_eq!(result["totalScorePercentage"], 50);
    assert_eq!(result["updatedScores"]["connectives"], 20);
    assert_eq!(result["updatedScores"]["tautologies"], 0);
    let attempt_id = result["attemptId"].as_str().unwrap().to_string();

    // Session is gone after a successful submission.
    let (status, _) = call(&app, Method::GET, "/api/exam/session", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Scores come back from the store.
    let (_, body) = call(&app, Method::GET, "/api/mindmap", token, None).await;
    let nodes = body["nodes"].as_array().unwrap();
    let connectives = nodes.iter().find(|n| n["id"] == "connectives").unwrap();
    assert_eq!(connectives["score"], 20);
    assert_eq!(connectives["category"], "weak");
    let tautologies = nodes.iter().find(|n| n["id"] == "tautologies").unwrap();
    assert_eq!(tautologies["score"], 0);
    assert_eq!(tautologies["category"], "weak");

    let (status, body) = call(&app, Method::GET, "/api/exam/attempts", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let attempts = body.as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["id"], attempt_id.as_str());
    assert_eq!(attempts[0]["mode"], "discovery");
    assert_eq!(attempts[0]["totalScorePercentage"], 50);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/exam/attempts/{}", attempt_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let answers = body["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["isCorrect"], true);
    assert_eq!(answers[1]["userAnswer"], "C");
    assert_eq!(answers[1]["correctAnswer"], "B");

    // Another user cannot see it.
    let other = self::token("student-2");
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/exam/attempts/{}", attempt_id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Both nodes are weak now, so a weak-areas exam is possible.
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        token,
        Some(json!({ "mode": "weak-areas" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn previous_keeps_answers() {
    let (app, _) = spawn_app(two_question_reply()).await;
    let token = token("student-3");
    let token = Some(token.as_str());

    call(
        &app,
        Method::POST,
        "/api/exam/generate",
        token,
        Some(json!({ "mode": "full-material" })),
    )
    .await;

    // At the first question `previous` is a no-op.
    let (status, body) =
        call(&app, Method::POST, "/api/exam/session/previous", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 0);

    call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "D" })),
    )
    .await;
    call(&app, Method::POST, "/api/exam/session/next", token, None).await;

    let (_, body) = call(&app, Method::POST, "/api/exam/session/previous", token, None).await;
    assert_eq!(body["index"], 0);
    assert_eq!(body["selectedAnswer"], "D");
    assert_eq!(body["answered"], 1);
}

#[tokio::test]
async fn weak_areas_without_weak_nodes_is_422() {
    let (app, generator) = spawn_app(two_question_reply()).await;
    let token = token("newcomer");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        Some(&token),
        Some(json!({ "mode": "weak-areas" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("weak-areas"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn unknown_mode_falls_back_to_full_material() {
    let (app, _) = spawn_app(two_question_reply()).await;
    let token = token("student-4");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        Some(&token),
        Some(json!({ "mode": "surprise-me" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mode"], "full-material");
}

#[tokio::test]
async fn invalid_generator_reply_is_502_and_starts_no_session() {
    let (app, _) = spawn_app("Sorry, I cannot help with that.".to_string()).await;
    let token = token("student-5");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        Some(&token),
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, Method::GET, "/api/exam/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn three_option_question_is_502() {
    let reply = json!({
        "questions": [{
            "question": "Which connective is this one?",
            "options": ["and", "or", "not"],
            "correctAnswer": "A"
        }]
    })
    .to_string();
    let (app, _) = spawn_app(reply).await;
    let token = token("student-6");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/exam/generate",
        Some(&token),
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn cancel_discards_session_without_history() {
    let (app, _) = spawn_app(two_question_reply()).await;
    let token = token("student-7");
    let token = Some(token.as_str());

    call(
        &app,
        Method::POST,
        "/api/exam/generate",
        token,
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "A" })),
    )
    .await;

    // Submitting an unfinished exam is refused.
    let (status, _) = call(&app, Method::POST, "/api/exam/session/submit", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::DELETE, "/api/exam/session", token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, "/api/exam/session", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/exam/attempts", token, None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (_, body) = call(&app, Method::GET, "/api/mindmap", token, None).await;
    for node in body["nodes"].as_array().unwrap() {
        assert!(node["score"].is_null());
    }
}

#[tokio::test]
async fn failed_submission_keeps_completed_session_for_retry() {
    let (app, _) = spawn_app_with(two_question_reply(), true).await;
    let token = token("student-8");
    let token = Some(token.as_str());

    call(
        &app,
        Method::POST,
        "/api/exam/generate",
        token,
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    for answer in ["A", "B"] {
        call(
            &app,
            Method::POST,
            "/api/exam/session/answer",
            token,
            Some(json!({ "answer": answer })),
        )
        .await;
        call(&app, Method::POST, "/api/exam/session/next", token, None).await;
    }

    // The last `next` above hit the failing summary write; the session stays completed.
    let (status, body) = call(&app, Method::GET, "/api/exam/session", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "completed");
    assert_eq!(body["answered"], 2);
    assert!(body["question"].is_null());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "C" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = call(&app, Method::GET, "/api/exam/attempts", token, None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, body) = call(&app, Method::POST, "/api/exam/session/submit", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalScorePercentage"], 100);
    assert_eq!(body["updatedScores"]["connectives"], 20);
    assert_eq!(body["updatedScores"]["tautologies"], 20);

    let (status, _) = call(&app, Method::GET, "/api/exam/session", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/exam/attempts", token, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_summary_write_returns_500_without_database_detail() {
    let (app, _) = spawn_app_with(two_question_reply(), true).await;
    let token = token("student-9");
    let token = Some(token.as_str());

    call(
        &app,
        Method::POST,
        "/api/exam/generate",
        token,
        Some(json!({ "mode": "discovery" })),
    )
    .await;
    call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "A" })),
    )
    .await;
    call(&app, Method::POST, "/api/exam/session/next", token, None).await;
    call(
        &app,
        Method::POST,
        "/api/exam/session/answer",
        token,
        Some(json!({ "answer": "B" })),
    )
    .await;

    let (status, body) = call(&app, Method::POST, "/api/exam/session/next", token, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = body["error"].as_str().unwrap();
    assert!(text.contains("summary"));
    assert!(!text.contains("/var/lib"));
}
