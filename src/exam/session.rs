// src/exam/session.rs

//! Sequential answering of one exam by one user.
//!
//! `Answering(i)` moves to `Answering(i + 1)` only once question `i` has an
//! answer, so reaching `Completed` guarantees a dense answer list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::AppError,
    models::exam::{AnswerLabel, Exam, ExamMode, PublicQuestion, UserAnswer},
    store::SessionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum SessionState {
    Answering(usize),
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Question {} has no answer yet", .0 + 1)]
    Unanswered(usize),

    #[error("The exam session is already completed")]
    AlreadyCompleted,

    #[error("The exam has no questions")]
    EmptyExam,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unanswered(_) => AppError::BadRequest(err.to_string()),
            SessionError::AlreadyCompleted => AppError::Conflict(err.to_string()),
            SessionError::EmptyExam => AppError::Internal(err.to_string()),
        }
    }
}

/// Outcome of `ExamSession::next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Answering(usize),
    Completed(Vec<UserAnswer>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    exam: Exam,
    state: SessionState,
    answers: Vec<Option<AnswerLabel>>,
}

impl ExamSession {
    pub fn new(exam: Exam) -> Result<Self, SessionError> {
        if exam.questions.is_empty() {
            return Err(SessionError::EmptyExam);
        }
        let answers = vec![None; exam.questions.len()];
        Ok(Self {
            exam,
            state: SessionState::Answering(0),
            answers,
        })
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn answer_at(&self, index: usize) -> Option<AnswerLabel> {
        self.answers.get(index).copied().flatten()
    }

    /// Records or replaces the answer to the current question.
    pub fn select_answer(&mut self, label: AnswerLabel) -> Result<(), SessionError> {
        let SessionState::Answering(index) = self.state else {
            return Err(SessionError::AlreadyCompleted);
        };
        self.answers[index] = Some(label);
        Ok(())
    }

    pub fn next(&mut self) -> Result<Advance, SessionError> {
        let SessionState::Answering(index) = self.state else {
            return Err(SessionError::AlreadyCompleted);
        };
        if self.answers[index].is_none() {
            return Err(SessionError::Unanswered(index));
        }

        if index + 1 < self.answers.len() {
            self.state = SessionState::Answering(index + 1);
            return Ok(Advance::Answering(index + 1));
        }

        let answers = self.collect_answers()?;
        self.state = SessionState::Completed;
        Ok(Advance::Completed(answers))
    }

    /// Steps back one question; stays put on the first one.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        let SessionState::Answering(index) = self.state else {
            return Err(SessionError::AlreadyCompleted);
        };
        let index = index.saturating_sub(1);
        self.state = SessionState::Answering(index);
        Ok(index)
    }

    /// Abandons the session without producing a result.
    pub fn cancel(self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Answering(_) => Ok(()),
            SessionState::Completed => Err(SessionError::AlreadyCompleted),
        }
    }

    /// The finalized answer list, once completed.
    pub fn final_answers(&self) -> Option<Vec<UserAnswer>> {
        match self.state {
            SessionState::Completed => self.collect_answers().ok(),
            SessionState::Answering(_) => None,
        }
    }

    fn collect_answers(&self) -> Result<Vec<UserAnswer>, SessionError> {
        self.answers
            .iter()
            .enumerate()
            .map(|(question_index, answer)| {
                answer
                    .map(|answer| UserAnswer {
                        question_index,
                        answer,
                    })
                    .ok_or(SessionError::Unanswered(question_index))
            })
            .collect()
    }

    pub fn view(&self) -> SessionView {
        let (question, selected_answer) = match self.state {
            SessionState::Answering(i) => (
                Some(PublicQuestion::from(&self.exam.questions[i])),
                self.answer_at(i),
            ),
            SessionState::Completed => (None, None),
        };

        SessionView {
            mode: self.exam.mode,
            state: self.state,
            total_questions: self.answers.len(),
            answered: self.answers.iter().filter(|a| a.is_some()).count(),
            question,
            selected_answer,
        }
    }
}

/// Client-facing snapshot of a session. Never includes correct answers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub mode: ExamMode,
    #[serde(flatten)]
    pub state: SessionState,
    pub total_questions: usize,
    pub answered: usize,
    pub question: Option<PublicQuestion>,
    pub selected_answer: Option<AnswerLabel>,
}

fn session_key(user_id: &str) -> String {
    format!("exam_session:{}", user_id)
}

pub async fn load_session(
    store: &dyn SessionStore,
    user_id: &str,
) -> Result<Option<ExamSession>, AppError> {
    match store.get(&session_key(user_id)).await {
        Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
        None => Ok(None),
    }
}

pub async fn save_session(
    store: &dyn SessionStore,
    user_id: &str,
    session: &ExamSession,
) -> Result<(), AppError> {
    let blob = serde_json::to_string(session)?;
    store.set(&session_key(user_id), blob).await;
    Ok(())
}

pub async fn discard_session(store: &dyn SessionStore, user_id: &str) -> bool {
    store.remove(&session_key(user_id)).await.is_some()
}
