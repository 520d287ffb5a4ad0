// src/store/mod.rs

//! Persistence seams used by the exam engine.
//!
//! The engine only sees these traits. `SqliteStore` backs scores and attempt
//! history; `MemorySessionStore` holds the ephemeral exam hand-off blobs.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        exam_record::{ExamAnswerRecord, ExamAttempt, NewExamAttempt},
        node::Score,
    },
};

pub mod session;
pub mod sqlite;

pub use session::MemorySessionStore;
pub use sqlite::SqliteStore;

/// Current mastery score per (user, node). The only authority for scores.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// `Ok(None)` means the node is undiscovered for this user.
    async fn get(&self, user_id: &str, node_id: &str) -> Result<Option<Score>, AppError>;

    /// Insert or replace the score for (user, node).
    async fn set(&self, user_id: &str, node_id: &str, score: Score) -> Result<(), AppError>;

    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, Score>, AppError>;
}

/// Append-only exam history.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Writes the attempt summary and returns its generated id.
    async fn insert_attempt(&self, attempt: &NewExamAttempt) -> Result<String, AppError>;

    async fn insert_answers(&self, answers: &[ExamAnswerRecord]) -> Result<(), AppError>;

    /// Newest first.
    async fn list_attempts(&self, user_id: &str, limit: i64)
    -> Result<Vec<ExamAttempt>, AppError>;

    async fn get_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
    ) -> Result<Option<ExamAttempt>, AppError>;

    async fn get_answers(&self, attempt_id: &str) -> Result<Vec<ExamAnswerRecord>, AppError>;
}

/// Ephemeral key-value blob storage. No durability beyond the process.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String);

    async fn remove(&self, key: &str) -> Option<String>;
}
