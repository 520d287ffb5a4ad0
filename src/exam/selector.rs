// src/exam/selector.rs

use rand::{Rng, seq::SliceRandom};

use crate::{
    config::MAX_CONTEXT_NODES,
    error::AppError,
    models::{
        exam::{ExamMode, NodeFilter},
        node::ScoredNode,
    },
};

/// Ids of every node the mode may draw from, in map order.
pub fn eligible_node_ids(nodes: &[ScoredNode], mode: ExamMode) -> Vec<&str> {
    match mode.node_filter() {
        NodeFilter::All => nodes.iter().map(|n| n.node.id.as_str()).collect(),
        NodeFilter::Category(category) => nodes
            .iter()
            .filter(|n| n.category == category)
            .map(|n| n.node.id.as_str())
            .collect(),
    }
}

/// Picks up to `MAX_CONTEXT_NODES` eligible node ids at random.
///
/// Returns `AppError::NoEligibleNodes` instead of an empty selection.
pub fn select_nodes(nodes: &[ScoredNode], mode: ExamMode) -> Result<Vec<String>, AppError> {
    select_nodes_with(nodes, mode, &mut rand::rng())
}

pub fn select_nodes_with<R: Rng + ?Sized>(
    nodes: &[ScoredNode],
    mode: ExamMode,
    rng: &mut R,
) -> Result<Vec<String>, AppError> {
    let mut ids = eligible_node_ids(nodes, mode);
    if ids.is_empty() {
        return Err(AppError::NoEligibleNodes(mode));
    }

    ids.shuffle(rng);
    ids.truncate(MAX_CONTEXT_NODES);

    Ok(ids.into_iter().map(str::to_string).collect())
}
