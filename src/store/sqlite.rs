// src/store/sqlite.rs

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    types::Json,
};

use crate::{
    error::AppError,
    models::{
        exam::{AnswerLabel, ExamMode},
        exam_record::{ExamAnswerRecord, ExamAttempt, NewExamAttempt},
        node::Score,
    },
    store::{AttemptStore, ScoreStore},
};

/// Helper struct for reading `exam_attempts` rows.
#[derive(sqlx::FromRow)]
struct AttemptRow {
    id: String,
    user_id: String,
    exam_mode: String,
    total_questions: i64,
    correct_answers: i64,
    total_score_percentage: i64,
    node_ids: Json<Vec<String>>,
    completed_at: DateTime<Utc>,
}

impl From<AttemptRow> for ExamAttempt {
    fn from(row: AttemptRow) -> Self {
        ExamAttempt {
            id: row.id,
            user_id: row.user_id,
            mode: ExamMode::parse_lenient(&row.exam_mode),
            total_questions: row.total_questions,
            correct_answers: row.correct_answers,
            total_score_percentage: row.total_score_percentage,
            node_ids: row.node_ids.0,
            completed_at: row.completed_at,
        }
    }
}

/// Helper struct for reading `exam_answers` rows.
#[derive(sqlx::FromRow)]
struct AnswerRow {
    exam_attempt_id: String,
    question_index: i64,
    user_answer: String,
    correct_answer: String,
    is_correct: bool,
    node_id: Option<String>,
}

impl TryFrom<AnswerRow> for ExamAnswerRecord {
    type Error = AppError;

    fn try_from(row: AnswerRow) -> Result<Self, Self::Error> {
        let label = |raw: &str| raw.parse::<AnswerLabel>().map_err(AppError::Database);
        Ok(ExamAnswerRecord {
            user_answer: label(&row.user_answer)?,
            correct_answer: label(&row.correct_answer)?,
            exam_attempt_id: row.exam_attempt_id,
            question_index: row.question_index,
            is_correct: row.is_correct,
            node_id: row.node_id,
        })
    }
}

/// SQLite-backed score and attempt store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `url`.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database. A single connection keeps it alive.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn get(&self, user_id: &str, node_id: &str) -> Result<Option<Score>, AppError> {
        let score: Option<i64> = sqlx::query_scalar(
            "SELECT score FROM user_node_scores WHERE user_id = ? AND node_id = ?",
        )
        .bind(user_id)
        .bind(node_id)
        .fetch_optional(&self.pool)
        .await?;

        score
            .map(|s| Score::try_from(s).map_err(AppError::Database))
            .transpose()
    }

    async fn set(&self, user_id: &str, node_id: &str, score: Score) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_node_scores (user_id, node_id, score, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, node_id) DO UPDATE SET
                score = excluded.score,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(node_id)
        .bind(score.value() as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_all(&self, user_id: &str) -> Result<HashMap<String, Score>, AppError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT node_id, score FROM user_node_scores WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(node_id, score)| {
                Score::try_from(score)
                    .map(|s| (node_id, s))
                    .map_err(AppError::Database)
            })
            .collect()
    }
}

#[async_trait]
impl AttemptStore for SqliteStore {
    async fn insert_attempt(&self, attempt: &NewExamAttempt) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO exam_attempts
                (id, user_id, exam_mode, total_questions, correct_answers,
                 total_score_percentage, node_ids, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&attempt.user_id)
        .bind(attempt.mode.as_str())
        .bind(attempt.total_questions as i64)
        .bind(attempt.correct_answers as i64)
        .bind(attempt.total_score_percentage as i64)
        .bind(Json(&attempt.node_ids))
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_answers(&self, answers: &[ExamAnswerRecord]) -> Result<(), AppError> {
        if answers.is_empty() {
            return Ok(());
        }

        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO exam_answers
                (exam_attempt_id, question_index, user_answer, correct_answer, is_correct, node_id) ",
        );

        query_builder.push_values(answers, |mut row, answer| {
            row.push_bind(answer.exam_attempt_id.clone())
                .push_bind(answer.question_index)
                .push_bind(answer.user_answer.as_str())
                .push_bind(answer.correct_answer.as_str())
                .push_bind(answer.is_correct)
                .push_bind(answer.node_id.clone());
        });

        query_builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn list_attempts(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ExamAttempt>, AppError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, exam_mode, total_questions, correct_answers,
                   total_score_percentage, node_ids, completed_at
            FROM exam_attempts
            WHERE user_id = ?
            ORDER BY completed_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExamAttempt::from).collect())
    }

    async fn get_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
    ) -> Result<Option<ExamAttempt>, AppError> {
        let row: Option<AttemptRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, exam_mode, total_questions, correct_answers,
                   total_score_percentage, node_ids, completed_at
            FROM exam_attempts
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ExamAttempt::from))
    }

    async fn get_answers(&self, attempt_id: &str) -> Result<Vec<ExamAnswerRecord>, AppError> {
        let rows: Vec<AnswerRow> = sqlx::query_as(
            r#"
            SELECT exam_attempt_id, question_index, user_answer, correct_answer, is_correct, node_id
            FROM exam_answers
            WHERE exam_attempt_id = ?
            ORDER BY question_index
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExamAnswerRecord::try_from).collect()
    }
}
