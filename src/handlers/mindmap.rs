// src/handlers/mindmap.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{error::AppError, exam::ExamEngine, utils::jwt::MaybeUser};

/// Returns the knowledge graph with the caller's scores and categories.
pub async fn get_mind_map(
    State(engine): State<ExamEngine>,
    user: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let view = engine.mind_map(user.user()).await?;
    Ok(Json(view))
}
