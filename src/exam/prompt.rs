// src/exam/prompt.rs

use crate::{
    config::{ARTICLE_EXCERPT_CHARS, REQUESTED_QUESTION_COUNT},
    models::node::Node,
};

pub const SYSTEM_INSTRUCTION: &str = "You are an educational assistant that writes exam questions. \
Always reply with valid JSON only, with no additional text.";

/// Renders the topic context for the selected nodes.
///
/// Articles are cut hard at `ARTICLE_EXCERPT_CHARS` characters.
pub fn build_context(nodes: &[&Node]) -> String {
    nodes
        .iter()
        .map(|node| {
            let mut parts = vec![format!("## {}", node.label)];

            if let Some(description) = &node.description {
                parts.push(format!("Description: {}", description));
            }
            if let Some(article) = &node.article {
                let excerpt: String = article.chars().take(ARTICLE_EXCERPT_CHARS).collect();
                parts.push(format!("Study material:\n{}", excerpt));
            }
            if !node.example_questions.is_empty() {
                let questions = node
                    .example_questions
                    .iter()
                    .enumerate()
                    .map(|(i, q)| format!("{}. {}", i + 1, q))
                    .collect::<Vec<_>>()
                    .join("\n");
                parts.push(format!("Example questions:\n{}", questions));
            }

            parts.join("\n\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn build_exam_prompt(nodes: &[&Node]) -> String {
    let node_ids = nodes
        .iter()
        .map(|n| format!("\"{}\"", n.id))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Generate an exam of closed multiple-choice questions (A, B, C, D; exactly one correct answer).

TOPIC CONTEXT:
{context}

INSTRUCTIONS:
1. Write exactly {count} exam questions based solely on the context above.
2. Every question must have exactly 4 answer options (A, B, C, D).
3. Exactly one option is correct.
4. Questions should test understanding of the material, not just recall.
5. Difficulty: intermediate to advanced.
6. Set "nodeId" to the id of the topic the question comes from, one of: {node_ids}.

RESPONSE FORMAT (JSON):
Return ONLY valid JSON, with no comments, markdown or text before or after it:

{{
  "questions": [
    {{
      "question": "Question text?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": "A",
      "nodeId": "topic_id"
    }}
  ]
}}

IMPORTANT:
- Return ONLY JSON.
- Every question must have exactly 4 options.
- correctAnswer must be "A", "B", "C" or "D".
- Write exactly {count} questions."#,
        context = build_context(nodes),
        count = REQUESTED_QUESTION_COUNT,
        node_ids = node_ids,
    )
}
