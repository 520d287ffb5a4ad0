// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{exam, mindmap},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges the mind map and exam sub-routers.
/// * Applies global middleware (Auth, Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let exam_routes = Router::new()
        .route("/generate", post(exam::generate_exam))
        .route(
            "/session",
            get(exam::get_session).delete(exam::cancel_session),
        )
        .route("/session/answer", post(exam::select_answer))
        .route("/session/next", post(exam::next_question))
        .route("/session/previous", post(exam::previous_question))
        .route("/session/submit", post(exam::submit_session))
        .route("/attempts", get(exam::list_attempts))
        .route("/attempts/{id}", get(exam::get_attempt));

    Router::new()
        .route("/api/mindmap", get(mindmap::get_mind_map))
        .nest("/api/exam", exam_routes)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
