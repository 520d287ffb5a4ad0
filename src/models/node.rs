// src/models/node.rs

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Mastery score of a node, always within 0..=100.
///
/// A node that has never been examined has no score at all; that state is
/// expressed as `Option<Score>::None`, never as `Score(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(100);

    /// Returns `None` when `value` is above 100.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Score(value))
    }

    /// Clamps an arbitrary integer into 0..=100.
    pub fn clamped(raw: i64) -> Self {
        Score(raw.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Score::new)
            .ok_or_else(|| format!("score {} is outside 0..=100", value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// Display band derived from a node's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    /// No score recorded.
    Undiscovered,
    /// 0..=39
    Weak,
    /// 40..=79
    Developing,
    /// 80..=100
    Mastered,
}

impl ScoreCategory {
    pub fn of(score: Option<Score>) -> Self {
        match score.map(Score::value) {
            None => ScoreCategory::Undiscovered,
            Some(0..=39) => ScoreCategory::Weak,
            Some(40..=79) => ScoreCategory::Developing,
            Some(_) => ScoreCategory::Mastered,
        }
    }
}

/// A topic in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Long-form educational content (Markdown).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example_questions: Vec<String>,
}

/// Directed relation between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// A node together with the current user's score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredNode {
    #[serde(flatten)]
    pub node: Node,
    pub score: Option<Score>,
    pub category: ScoreCategory,
}

impl ScoredNode {
    pub fn new(node: Node, score: Option<Score>) -> Self {
        Self {
            node,
            score,
            category: ScoreCategory::of(score),
        }
    }
}

/// Map view returned to clients.
#[derive(Debug, Serialize)]
pub struct MindMapView {
    pub nodes: Vec<ScoredNode>,
    pub edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct MindMapFile {
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

/// The static knowledge graph. Scores are per user and live in the score store.
#[derive(Debug, Clone)]
pub struct MindMap {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

impl MindMap {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, AppError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(AppError::BadRequest(format!(
                    "Duplicate node id '{}' in mind map",
                    node.id
                )));
            }
        }

        for edge in &edges {
            for end in [&edge.source, &edge.target] {
                if !index.contains_key(end) {
                    return Err(AppError::BadRequest(format!(
                        "Edge {} -> {} references unknown node '{}'",
                        edge.source, edge.target, end
                    )));
                }
            }
        }

        Ok(Self {
            nodes,
            edges,
            index,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let file: MindMapFile = serde_json::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid mind map definition: {}", e)))?;
        Self::new(file.nodes, file.edges)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Config(format!("cannot read mind map {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Attaches scores to every node. Scores for ids not in the map are ignored.
    pub fn with_scores(&self, scores: &HashMap<String, Score>) -> Vec<ScoredNode> {
        self.nodes
            .iter()
            .map(|node| ScoredNode::new(node.clone(), scores.get(&node.id).copied()))
            .collect()
    }

    pub fn view(&self, scores: &HashMap<String, Score>) -> MindMapView {
        MindMapView {
            nodes: self.with_scores(scores),
            edges: self.edges.clone(),
        }
    }
}
