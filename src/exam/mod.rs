// src/exam/mod.rs

//! Mastery scoring and exam generation.
//!
//! Flow: `selector` picks nodes, `generate_exam` asks the content generator
//! for questions, an `ExamSession` collects answers, and `submit_results`
//! grades them and updates node scores.

use std::sync::Arc;

use crate::{
    error::AppError,
    llm::ContentGenerator,
    models::{
        exam_record::{ExamAttempt, ExamAttemptDetail},
        node::{MindMap, MindMapView},
        user::CurrentUser,
    },
    store::{AttemptStore, ScoreStore},
};

pub mod generator;
pub mod prompt;
pub mod results;
pub mod scoring;
pub mod selector;
pub mod session;

const MAX_HISTORY_LIMIT: i64 = 100;

/// Entry point for the exam operations. Cheap to clone.
#[derive(Clone)]
pub struct ExamEngine {
    graph: Arc<MindMap>,
    scores: Arc<dyn ScoreStore>,
    attempts: Arc<dyn AttemptStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl ExamEngine {
    pub fn new(
        graph: Arc<MindMap>,
        scores: Arc<dyn ScoreStore>,
        attempts: Arc<dyn AttemptStore>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            graph,
            scores,
            attempts,
            generator,
        }
    }

    /// The knowledge graph with the caller's current scores.
    pub async fn mind_map(&self, user: Option<&CurrentUser>) -> Result<MindMapView, AppError> {
        let user = user.ok_or(AppError::Unauthenticated)?;
        let scores = self.scores.get_all(&user.id).await?;
        Ok(self.graph.view(&scores))
    }

    /// The caller's attempts, newest first.
    pub async fn attempt_history(
        &self,
        user: Option<&CurrentUser>,
        limit: Option<i64>,
    ) -> Result<Vec<ExamAttempt>, AppError> {
        let user = user.ok_or(AppError::Unauthenticated)?;
        let limit = limit.unwrap_or(20).clamp(1, MAX_HISTORY_LIMIT);
        self.attempts.list_attempts(&user.id, limit).await
    }

    pub async fn attempt_detail(
        &self,
        user: Option<&CurrentUser>,
        attempt_id: &str,
    ) -> Result<ExamAttemptDetail, AppError> {
        let user = user.ok_or(AppError::Unauthenticated)?;
        let attempt = self
            .attempts
            .get_attempt(&user.id, attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam attempt not found".to_string()))?;
        let answers = self.attempts.get_answers(&attempt.id).await?;
        Ok(ExamAttemptDetail { attempt, answers })
    }
}
