// src/models/exam.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::node::ScoreCategory;

/// Policy selecting which nodes seed a new exam.
///
/// Deserialization is lenient: an unknown mode string falls back to
/// `FullMaterial` rather than rejecting the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum ExamMode {
    Discovery,
    WeakAreas,
    FullMaterial,
}

/// Which nodes an exam mode draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFilter {
    Category(ScoreCategory),
    All,
}

impl ExamMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamMode::Discovery => "discovery",
            ExamMode::WeakAreas => "weak-areas",
            ExamMode::FullMaterial => "full-material",
        }
    }

    pub fn node_filter(self) -> NodeFilter {
        match self {
            ExamMode::Discovery => NodeFilter::Category(ScoreCategory::Undiscovered),
            ExamMode::WeakAreas => NodeFilter::Category(ScoreCategory::Weak),
            ExamMode::FullMaterial => NodeFilter::All,
        }
    }

    /// Parses a mode, mapping anything unrecognized to `FullMaterial`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(ExamMode::FullMaterial)
    }
}

impl FromStr for ExamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "discovery" => Ok(ExamMode::Discovery),
            "weak-areas" => Ok(ExamMode::WeakAreas),
            "full-material" => Ok(ExamMode::FullMaterial),
            other => Err(format!("unknown exam mode '{}'", other)),
        }
    }
}

impl From<String> for ExamMode {
    fn from(raw: String) -> Self {
        ExamMode::parse_lenient(&raw)
    }
}

impl fmt::Display for ExamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four option labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLabel {
    A,
    B,
    C,
    D,
}

impl AnswerLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLabel::A => "A",
            AnswerLabel::B => "B",
            AnswerLabel::C => "C",
            AnswerLabel::D => "D",
        }
    }
}

impl FromStr for AnswerLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(AnswerLabel::A),
            "B" => Ok(AnswerLabel::B),
            "C" => Ok(AnswerLabel::C),
            "D" => Ok(AnswerLabel::D),
            other => Err(format!("'{}' is not one of A, B, C, D", other)),
        }
    }
}

impl fmt::Display for AnswerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub question: String,

    /// Option texts in label order A, B, C, D.
    pub options: [String; 4],

    pub correct_answer: AnswerLabel,

    /// Node the question was derived from, if the generator attributed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// A generated exam: 1 to 10 questions plus the mode and nodes it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub questions: Vec<ExamQuestion>,
    pub mode: ExamMode,
    pub node_ids: Vec<String>,
}

/// User's chosen option for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_index: usize,
    pub answer: AnswerLabel,
}

/// DTO for sending a question to the client (excludes the correct answer).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub question: String,
    pub options: [String; 4],
}

impl From<&ExamQuestion> for PublicQuestion {
    fn from(q: &ExamQuestion) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

/// Shape of the content-generation reply, before conversion to `Exam`.
#[derive(Debug, Deserialize, Validate)]
pub struct GeneratedExam {
    #[validate(
        length(min = 1, max = 10, message = "An exam must contain between 1 and 10 questions."),
        nested
    )]
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    #[validate(length(min = 10, message = "A question must be at least 10 characters long."))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(custom(function = validate_correct_answer))]
    pub correct_answer: String,
    #[serde(default)]
    pub node_id: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != 4 {
        return Err(validator::ValidationError::new("options_count")
            .with_message("Every question must have exactly 4 options.".into()));
    }
    if options.iter().any(|opt| opt.trim().is_empty()) {
        return Err(validator::ValidationError::new("option_empty")
            .with_message("All options must be filled in.".into()));
    }
    Ok(())
}

fn validate_correct_answer(answer: &str) -> Result<(), validator::ValidationError> {
    if answer.parse::<AnswerLabel>().is_err() {
        return Err(validator::ValidationError::new("correct_answer")
            .with_message("The correct answer must be A, B, C or D.".into()));
    }
    Ok(())
}
