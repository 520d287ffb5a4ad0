// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use mindmap_backend::{error::AppError, llm::ContentGenerator, models::node::MindMap};

pub const MIND_MAP: &str = r#"{
    "nodes": [
        {
            "id": "connectives",
            "label": "Logical Connectives",
            "article": "Conjunction is true only when both operands are true."
        },
        {
            "id": "tautologies",
            "label": "Tautologies",
            "article": "A tautology is true under every valuation."
        }
    ],
    "edges": [
        { "source": "connectives", "target": "tautologies", "label": "defines" }
    ]
}"#;

pub fn mind_map() -> Arc<MindMap> {
    Arc::new(MindMap::from_json(MIND_MAP).unwrap())
}

/// Two questions: #0 answer A on `connectives`, #1 answer B on `tautologies`.
pub fn two_question_reply() -> String {
    serde_json::json!({
        "questions": [
            {
                "question": "When is a conjunction p and q true?",
                "options": ["Both true", "Either true", "Both false", "Never"],
                "correctAnswer": "A",
                "nodeId": "connectives"
            },
            {
                "question": "Which formula is a tautology?",
                "options": ["p and not p", "p or not p", "p -> not p", "not p"],
                "correctAnswer": "B",
                "nodeId": "tautologies"
            }
        ]
    })
    .to_string()
}

/// Content generator returning a canned reply and counting calls.
pub struct StubGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}
