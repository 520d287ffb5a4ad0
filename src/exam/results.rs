// src/exam/results.rs

use std::collections::BTreeMap;

use chrono::Utc;

use crate::{
    error::{AppError, PersistenceStage},
    exam::{
        ExamEngine,
        scoring::{self, GradedQuestion},
    },
    models::{
        exam::{Exam, UserAnswer},
        exam_record::{ExamAnswerRecord, NewExamAttempt, SubmitOutcome},
        node::Score,
        user::CurrentUser,
    },
};

impl ExamEngine {
    /// Grades a completed exam and persists the outcome.
    ///
    /// Ordering is fixed: attempt summary (fatal on failure), answer log
    /// (logged on failure), then one read-modify-write per touched node
    /// (each logged and skipped on failure). Computed scores are returned
    /// for every touched node even when their upsert failed.
    pub async fn submit_results(
        &self,
        user: Option<&CurrentUser>,
        exam: &Exam,
        answers: &[UserAnswer],
    ) -> Result<SubmitOutcome, AppError> {
        let user = user.ok_or(AppError::Unauthenticated)?;

        let grade = scoring::grade(exam, answers)?;

        let attempt = NewExamAttempt {
            user_id: user.id.clone(),
            mode: exam.mode,
            total_questions: grade.total_questions,
            correct_answers: grade.correct_count,
            total_score_percentage: grade.percentage,
            node_ids: exam.node_ids.clone(),
            completed_at: Utc::now(),
        };

        let attempt_id = self
            .attempts
            .insert_attempt(&attempt)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save exam attempt: {}", e);
                AppError::Persistence {
                    stage: PersistenceStage::Summary,
                    message: e.to_string(),
                }
            })?;

        let log = answer_log(&attempt_id, &grade.questions);
        if let Err(e) = self.attempts.insert_answers(&log).await {
            tracing::error!(
                attempt_id = %attempt_id,
                stage = %PersistenceStage::AnswerLog,
                "Failed to save exam answers, continuing with score updates: {}",
                e
            );
        }

        let updated_scores = self.update_node_scores(&user.id, &grade.questions).await;

        tracing::info!(
            user_id = %user.id,
            attempt_id = %attempt_id,
            score = grade.percentage,
            "Exam results saved"
        );

        Ok(SubmitOutcome {
            attempt_id,
            total_score_percentage: grade.percentage,
            correct_count: grade.correct_count,
            total_questions: grade.total_questions,
            updated_scores,
        })
    }

    async fn update_node_scores(
        &self,
        user_id: &str,
        questions: &[GradedQuestion],
    ) -> BTreeMap<String, Score> {
        let mut updated = BTreeMap::new();

        for (node_id, tally) in scoring::tally_by_node(questions) {
            let current = match self.scores.get(user_id, &node_id).await {
                Ok(current) => current,
                Err(e) => {
                    tracing::error!(
                        node_id = %node_id,
                        stage = %PersistenceStage::ScoreUpdate,
                        "Failed to fetch node score, skipping: {}",
                        e
                    );
                    continue;
                }
            };

            let new_score = scoring::apply_tally(current, tally);

            if let Err(e) = self.scores.set(user_id, &node_id, new_score).await {
                tracing::error!(
                    node_id = %node_id,
                    stage = %PersistenceStage::ScoreUpdate,
                    "Failed to update node score: {}",
                    e
                );
            }

            updated.insert(node_id, new_score);
        }

        updated
    }
}

fn answer_log(attempt_id: &str, questions: &[GradedQuestion]) -> Vec<ExamAnswerRecord> {
    questions
        .iter()
        .map(|q| ExamAnswerRecord {
            exam_attempt_id: attempt_id.to_string(),
            question_index: q.question_index as i64,
            user_answer: q.user_answer,
            correct_answer: q.correct_answer,
            is_correct: q.is_correct,
            node_id: q.node_id.clone(),
        })
        .collect()
}
