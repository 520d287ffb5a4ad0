// src/exam/scoring.rs

use std::collections::BTreeMap;

use crate::{
    config::{CORRECT_ANSWER_POINTS, INCORRECT_ANSWER_PENALTY},
    error::AppError,
    models::{
        exam::{AnswerLabel, Exam, UserAnswer},
        node::Score,
    },
};

/// One question after comparing the user's answer with the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedQuestion {
    pub question_index: usize,
    pub user_answer: AnswerLabel,
    pub correct_answer: AnswerLabel,
    pub is_correct: bool,
    pub node_id: Option<String>,
}

/// Grading result of a full answer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub questions: Vec<GradedQuestion>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub percentage: u8,
}

/// Correct/incorrect tally for one node within one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeTally {
    pub correct: u32,
    pub incorrect: u32,
}

impl NodeTally {
    pub fn delta(&self) -> i64 {
        self.correct as i64 * CORRECT_ANSWER_POINTS as i64
            - self.incorrect as i64 * INCORRECT_ANSWER_PENALTY as i64
    }
}

/// Grades `answers` against `exam`.
///
/// Requires exactly one answer per question index. A count mismatch is
/// `AnswerCountMismatch`; a gap in the indices is an internal error because
/// the exam session guarantees a dense answer list.
pub fn grade(exam: &Exam, answers: &[UserAnswer]) -> Result<Grade, AppError> {
    let total_questions = exam.questions.len();
    if answers.len() != total_questions {
        return Err(AppError::AnswerCountMismatch {
            expected: total_questions,
            actual: answers.len(),
        });
    }

    let questions = exam
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let user_answer = answers
                .iter()
                .find(|a| a.question_index == index)
                .ok_or_else(|| {
                    AppError::Internal(format!("Missing answer for question {}", index))
                })?
                .answer;

            Ok(GradedQuestion {
                question_index: index,
                user_answer,
                correct_answer: question.correct_answer,
                is_correct: user_answer == question.correct_answer,
                node_id: question.node_id.clone(),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let correct_count = questions.iter().filter(|q| q.is_correct).count();

    Ok(Grade {
        percentage: percentage(correct_count, total_questions),
        questions,
        correct_count,
        total_questions,
    })
}

/// `correct / total * 100`, rounded half up. Zero questions score 0.
pub fn percentage(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    ((200 * correct + total) / (2 * total)) as u8
}

/// Groups graded questions by node. Questions without a node are skipped.
pub fn tally_by_node(questions: &[GradedQuestion]) -> BTreeMap<String, NodeTally> {
    let mut tallies: BTreeMap<String, NodeTally> = BTreeMap::new();
    for q in questions {
        let Some(node_id) = &q.node_id else {
            continue;
        };
        let tally = tallies.entry(node_id.clone()).or_default();
        if q.is_correct {
            tally.correct += 1;
        } else {
            tally.incorrect += 1;
        }
    }
    tallies
}

/// New score after one attempt: the whole delta is applied to the current
/// score (undiscovered counts as 0), then clamped to 0..=100.
pub fn apply_tally(current: Option<Score>, tally: NodeTally) -> Score {
    let base = current.map_or(0, |s| s.value() as i64);
    Score::clamped(base + tally.delta())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::models::exam::{ExamMode, ExamQuestion};

    fn question(correct: AnswerLabel, node: Option<&str>) -> ExamQuestion {
        ExamQuestion {
            question: "Which statement is a tautology?".into(),
            options: ["p".into(), "q".into(), "p or not p".into(), "p and q".into()],
            correct_answer: correct,
            node_id: node.map(str::to_string),
        }
    }

    fn exam(questions: Vec<ExamQuestion>) -> Exam {
        Exam {
            questions,
            mode: ExamMode::FullMaterial,
            node_ids: vec!["x".into()],
        }
    }

    fn answers(labels: &[AnswerLabel]) -> Vec<UserAnswer> {
        labels
            .iter()
            .enumerate()
            .map(|(question_index, &answer)| UserAnswer {
                question_index,
                answer,
            })
            .collect()
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 8), 38);
        assert_eq!(percentage(0, 10), 0);
        assert_eq!(percentage(10, 10), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_grade_counts_correct_answers() {
        use crate::models::exam::AnswerLabel::*;
        let exam = exam(vec![question(A, None), question(B, None), question(C, None)]);

        let grade = grade(&exam, &answers(&[A, D, C])).unwrap();
        assert_eq!(grade.correct_count, 2);
        assert_eq!(grade.total_questions, 3);
        assert_eq!(grade.percentage, 67);
        assert!(!grade.questions[1].is_correct);
        assert_eq!(grade.questions[1].correct_answer, B);
    }

    #[test]
    fn test_grade_is_order_independent_and_repeatable() {
        use crate::models::exam::AnswerLabel::*;
        let exam = exam(vec![question(A, None), question(B, None)]);
        let mut shuffled = answers(&[A, C]);
        shuffled.reverse();

        let first = grade(&exam, &shuffled).unwrap();
        let second = grade(&exam, &shuffled).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.correct_count, 1);
        assert_eq!(first.questions[0].user_answer, A);
    }

    #[test]
    fn test_answer_count_mismatch() {
        use crate::models::exam::AnswerLabel::*;
        let exam = exam((0..10).map(|_| question(A, None)).collect());

        let err = grade(&exam, &answers(&[A; 8])).unwrap_err();
        assert!(matches!(
            err,
            AppError::AnswerCountMismatch {
                expected: 10,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_gap_in_indices_is_internal_error() {
        use crate::models::exam::AnswerLabel::*;
        let exam = exam(vec![question(A, None), question(B, None)]);
        let dup = vec![
            UserAnswer {
                question_index: 0,
                answer: A,
            },
            UserAnswer {
                question_index: 0,
                answer: B,
            },
        ];

        assert!(matches!(grade(&exam, &dup), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_node_delta_scenario() {
        use crate::models::exam::AnswerLabel::*;
        let exam = exam(vec![
            question(A, Some("X")),
            question(B, Some("X")),
            question(C, Some("X")),
            question(D, None),
        ]);
        let grade = grade(&exam, &answers(&[A, B, A, D])).unwrap();

        let tallies = tally_by_node(&grade.questions);
        assert_eq!(tallies.len(), 1);
        let tally = tallies["X"];
        assert_eq!(tally, NodeTally { correct: 2, incorrect: 1 });
        assert_eq!(tally.delta(), 30);

        assert_eq!(apply_tally(Score::new(50), tally).value(), 80);
        assert_eq!(apply_tally(None, tally).value(), 30);
        assert_eq!(apply_tally(Score::new(90), tally), Score::MAX);
    }

    #[test]
    fn test_clamp_at_zero_for_undiscovered() {
        let tally = NodeTally {
            correct: 0,
            incorrect: 3,
        };
        assert_eq!(apply_tally(None, tally), Score::MIN);
        assert_eq!(apply_tally(Score::new(25), tally), Score::MIN);
    }

    proptest! {
        #[test]
        fn prop_updated_score_stays_in_range(
            start in proptest::option::of(0u8..=100),
            correct in 0u32..50,
            incorrect in 0u32..50,
        ) {
            let current = start.and_then(Score::new);
            let updated = apply_tally(current, NodeTally { correct, incorrect });

            let expected = (start.unwrap_or(0) as i64 + 20 * correct as i64 - 10 * incorrect as i64)
                .clamp(0, 100);
            prop_assert_eq!(updated.value() as i64, expected);
        }

        #[test]
        fn prop_repeated_attempts_stay_in_range(
            steps in proptest::collection::vec((0u32..10, 0u32..10), 1..20),
        ) {
            let mut current: Option<Score> = None;
            let mut expected: i64 = 0;
            for (correct, incorrect) in steps {
                let updated = apply_tally(current, NodeTally { correct, incorrect });
                expected = (expected + 20 * correct as i64 - 10 * incorrect as i64).clamp(0, 100);
                prop_assert_eq!(updated.value() as i64, expected);
                current = Some(updated);
            }
        }

        #[test]
        fn prop_percentage_in_range(total in 1usize..100, correct in 0usize..100) {
            let correct = correct.min(total);
            let p = percentage(correct, total) as i64;
            let (c, t) = (correct as i64, total as i64);
            prop_assert!(p <= 100);
            // Nearest integer to 100c/t, with halves going up.
            prop_assert!((2 * p - 1) * t <= 200 * c && 200 * c < (2 * p + 1) * t);
        }
    }
}
