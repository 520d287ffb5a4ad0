// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    exam::{
        ExamEngine,
        session::{
            Advance, ExamSession, SessionView, discard_session, load_session, save_session,
        },
    },
    models::{
        exam::{AnswerLabel, ExamMode},
        exam_record::{AttemptListParams, SubmitOutcome},
        user::CurrentUser,
    },
    store::SessionStore,
    utils::jwt::MaybeUser,
};

#[derive(Debug, Deserialize)]
pub struct GenerateExamRequest {
    #[serde(default = "default_mode")]
    pub mode: ExamMode,
}

fn default_mode() -> ExamMode {
    ExamMode::FullMaterial
}

#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub answer: AnswerLabel,
}

/// Response of `next`: either the following question or the submission result.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdvanceResponse {
    Answering { session: SessionView },
    Completed { result: SubmitOutcome },
}

fn require_user(user: &MaybeUser) -> Result<&CurrentUser, AppError> {
    user.user().ok_or(AppError::Unauthenticated)
}

async fn active_session(
    sessions: &dyn SessionStore,
    user: &CurrentUser,
) -> Result<ExamSession, AppError> {
    load_session(sessions, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active exam session".to_string()))
}

/// Generates a new exam and starts a session for it.
///
/// Any previous session of the caller is replaced.
pub async fn generate_exam(
    State(engine): State<ExamEngine>,
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
    Json(req): Json<GenerateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = engine.generate_exam(user.user(), req.mode).await?;
    let user = require_user(&user)?;

    let session = ExamSession::new(exam)?;
    save_session(sessions.as_ref(), &user.id, &session).await?;

    Ok((StatusCode::CREATED, Json(session.view())))
}

pub async fn get_session(
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&user)?;
    let session = active_session(sessions.as_ref(), user).await?;
    Ok(Json(session.view()))
}

pub async fn select_answer(
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&user)?;
    let mut session = active_session(sessions.as_ref(), user).await?;

    session.select_answer(req.answer)?;
    save_session(sessions.as_ref(), &user.id, &session).await?;

    Ok(Json(session.view()))
}

/// Advances to the next question, or submits the exam after the last one.
///
/// The completed session is kept until submission succeeds, so a failed
/// submission can be retried via `submit_session`.
pub async fn next_question(
    State(engine): State<ExamEngine>,
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&user)?;
    let mut session = active_session(sessions.as_ref(), user).await?;

    let advance = session.next()?;
    save_session(sessions.as_ref(), &user.id, &session).await?;

    match advance {
        Advance::Answering(_) => Ok(Json(AdvanceResponse::Answering {
            session: session.view(),
        })),
        Advance::Completed(answers) => {
            let result = engine
                .submit_results(Some(user), session.exam(), &answers)
                .await?;
            discard_session(sessions.as_ref(), &user.id).await;
            Ok(Json(AdvanceResponse::Completed { result }))
        }
    }
}

pub async fn previous_question(
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&user)?;
    let mut session = active_session(sessions.as_ref(), user).await?;

    session.previous()?;
    save_session(sessions.as_ref(), &user.id, &session).await?;

    Ok(Json(session.view()))
}

/// Retries the submission of a completed session.
pub async fn submit_session(
    State(engine): State<ExamEngine>,
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&user)?;
    let session = active_session(sessions.as_ref(), user).await?;

    let answers = session
        .final_answers()
        .ok_or_else(|| AppError::BadRequest("The exam is not completed yet".to_string()))?;

    let result = engine
        .submit_results(Some(user), session.exam(), &answers)
        .await?;
    discard_session(sessions.as_ref(), &user.id).await;

    Ok(Json(result))
}

/// Abandons the current session. Nothing is persisted.
pub async fn cancel_session(
    State(sessions): State<Arc<dyn SessionStore>>,
    user: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&user)?;
    let session = active_session(sessions.as_ref(), user).await?;

    session.cancel()?;
    discard_session(sessions.as_ref(), &user.id).await;
    tracing::info!(user_id = %user.id, "Exam session cancelled");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_attempts(
    State(engine): State<ExamEngine>,
    user: MaybeUser,
    Query(params): Query<AttemptListParams>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = engine.attempt_history(user.user(), params.limit).await?;
    Ok(Json(attempts))
}

pub async fn get_attempt(
    State(engine): State<ExamEngine>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = engine.attempt_detail(user.user(), &id).await?;
    Ok(Json(detail))
}
