// src/exam/generator.rs

use validator::Validate;

use crate::{
    error::AppError,
    exam::{
        ExamEngine,
        prompt::{SYSTEM_INSTRUCTION, build_exam_prompt},
        selector,
    },
    models::{
        exam::{AnswerLabel, Exam, ExamMode, ExamQuestion, GeneratedExam, GeneratedQuestion},
        node::Node,
        user::CurrentUser,
    },
};

impl ExamEngine {
    /// Builds a new exam for the caller.
    ///
    /// One call to the content generator, no retries. Nothing is persisted.
    pub async fn generate_exam(
        &self,
        user: Option<&CurrentUser>,
        mode: ExamMode,
    ) -> Result<Exam, AppError> {
        let user = user.ok_or(AppError::Unauthenticated)?;

        let scores = self.scores.get_all(&user.id).await?;
        let nodes = self.graph.with_scores(&scores);
        let node_ids = selector::select_nodes(&nodes, mode)?;

        let context_nodes: Vec<&Node> = node_ids
            .iter()
            .filter_map(|id| self.graph.get(id))
            .collect();
        let prompt = build_exam_prompt(&context_nodes);

        tracing::info!(
            user_id = %user.id,
            mode = %mode,
            nodes = ?node_ids,
            "Requesting exam questions"
        );

        let raw = self.generator.complete(SYSTEM_INSTRUCTION, &prompt).await?;
        let exam = parse_exam(&raw, mode, node_ids)?;

        tracing::info!(
            user_id = %user.id,
            questions = exam.questions.len(),
            "Exam generated"
        );

        Ok(exam)
    }
}

/// Parses and validates a raw generator reply into an `Exam`.
///
/// Non-JSON text is `MalformedUpstreamResponse`; JSON of the wrong shape or
/// failing the question rules is `InvalidResponseStructure`.
pub fn parse_exam(raw: &str, mode: ExamMode, node_ids: Vec<String>) -> Result<Exam, AppError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
        tracing::error!("Failed to parse AI response as JSON: {}", e);
        AppError::MalformedUpstreamResponse(excerpt(raw))
    })?;

    let generated: GeneratedExam = serde_json::from_value(value)
        .map_err(|e| AppError::InvalidResponseStructure(e.to_string()))?;

    if let Err(validation_errors) = generated.validate() {
        tracing::error!("AI response failed validation: {}", validation_errors);
        return Err(AppError::InvalidResponseStructure(
            validation_errors.to_string(),
        ));
    }

    let questions = generated
        .questions
        .into_iter()
        .map(|q| into_exam_question(q, &node_ids))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Exam {
        questions,
        mode,
        node_ids,
    })
}

fn into_exam_question(
    q: GeneratedQuestion,
    node_ids: &[String],
) -> Result<ExamQuestion, AppError> {
    let correct_answer: AnswerLabel = q
        .correct_answer
        .parse()
        .map_err(AppError::InvalidResponseStructure)?;

    let options: [String; 4] = q.options.try_into().map_err(|opts: Vec<String>| {
        AppError::InvalidResponseStructure(format!("expected 4 options, got {}", opts.len()))
    })?;

    // Attributions to nodes outside this exam must not move unrelated scores.
    let node_id = q.node_id.filter(|id| {
        let known = node_ids.contains(id);
        if !known {
            tracing::debug!("Dropping unknown node attribution '{}'", id);
        }
        known
    });

    Ok(ExamQuestion {
        question: q.question,
        options,
        correct_answer,
        node_id,
    })
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(200).collect()
}
