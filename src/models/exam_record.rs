// src/models/exam_record.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    exam::{AnswerLabel, ExamMode},
    node::Score,
};

/// Attempt summary about to be written. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewExamAttempt {
    pub user_id: String,
    pub mode: ExamMode,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub total_score_percentage: u8,
    pub node_ids: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Represents the 'exam_attempts' table.
/// Rows are append-only: written once per completed exam, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAttempt {
    pub id: String,
    pub user_id: String,
    pub mode: ExamMode,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub total_score_percentage: i64,
    pub node_ids: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Represents the 'exam_answers' table: one graded question of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnswerRecord {
    pub exam_attempt_id: String,
    pub question_index: i64,
    pub user_answer: AnswerLabel,
    pub correct_answer: AnswerLabel,
    pub is_correct: bool,
    pub node_id: Option<String>,
}

/// An attempt together with its answer log.
#[derive(Debug, Serialize)]
pub struct ExamAttemptDetail {
    #[serde(flatten)]
    pub attempt: ExamAttempt,
    pub answers: Vec<ExamAnswerRecord>,
}

/// Result of a successful submission.
///
/// `updated_scores` holds the computed score of every node touched by the
/// exam, including nodes whose upsert failed; clients may show them
/// optimistically until the next read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub attempt_id: String,
    pub total_score_percentage: u8,
    pub correct_count: usize,
    pub total_questions: usize,
    pub updated_scores: BTreeMap<String, Score>,
}

/// Query parameters for listing attempts.
#[derive(Debug, Deserialize)]
pub struct AttemptListParams {
    pub limit: Option<i64>,
}
