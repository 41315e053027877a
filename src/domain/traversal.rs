//! Flowchart traversal: resolve the next step from a position and an answer.
//!
//! All functions read a snapshot and never mutate it. There is no cycle
//! detection here; see [`crate::domain::integrity`] for author-time checks.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::entities::{FlowchartData, QuestionNode, RecommendationEntry, Target};
use crate::domain::error::DomainError;

/// A recommendation reached by a step, with its id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommended<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub entry: &'a RecommendationEntry,
}

/// Result of following one answer.
///
/// Serializes as `{"type": "question"|"recommendation"|"end", "data": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Step<'a> {
    Question(&'a QuestionNode),
    Recommendation(Recommended<'a>),
    End,
}

impl Step<'_> {
    pub fn is_end(&self) -> bool {
        matches!(self, Step::End)
    }
}

/// First question of `category`, or `None` if the category is absent or empty.
pub fn first_question<'a>(data: &'a FlowchartData, category: &str) -> Option<&'a QuestionNode> {
    let first = data.category(category)?.first();
    if first.is_none() {
        debug!("first_question: category {} is empty", category);
    }
    first
}

/// Resolve a single reference id as seen from `category`.
pub fn resolve_target<'a>(
    data: &'a FlowchartData,
    category: &str,
    target: &str,
) -> Result<Step<'a>, DomainError> {
    match Target::classify(target) {
        Target::Recommendation(id) => data
            .recommendations
            .get_key_value(id)
            .map(|(id, entry)| Step::Recommendation(Recommended { id, entry }))
            .ok_or_else(|| DomainError::RecommendationNotFound(id.to_string())),
        Target::End => Ok(Step::End),
        Target::Question(id) => data
            .find_node(category, id)
            .map(Step::Question)
            .ok_or_else(|| DomainError::NodeNotFound {
                category: category.to_string(),
                id: id.to_string(),
            }),
    }
}

/// Follow `answer` from question `current_id`, reporting why a lookup failed.
///
/// A sequence-valued branch follows only its first element.
pub fn try_next_step<'a>(
    data: &'a FlowchartData,
    category: &str,
    current_id: &str,
    answer: &str,
) -> Result<Step<'a>, DomainError> {
    let nodes = data
        .category(category)
        .ok_or_else(|| DomainError::CategoryNotFound(category.to_string()))?;
    let current = nodes
        .iter()
        .find(|node| node.id == current_id)
        .ok_or_else(|| DomainError::NodeNotFound {
            category: category.to_string(),
            id: current_id.to_string(),
        })?;
    let next = current
        .next
        .get(answer)
        .ok_or_else(|| DomainError::AnswerNotFound {
            category: category.to_string(),
            id: current_id.to_string(),
            answer: answer.to_string(),
        })?;
    let target = next.primary().ok_or_else(|| DomainError::EmptyBranch {
        category: category.to_string(),
        id: current_id.to_string(),
        answer: answer.to_string(),
    })?;

    debug!(
        "next_step: {}/{} --{}--> {}",
        category, current_id, answer, target
    );
    resolve_target(data, category, target)
}

/// Total variant of [`try_next_step`]: lookup failures are logged and yield `None`.
pub fn next_step<'a>(
    data: &'a FlowchartData,
    category: &str,
    current_id: &str,
    answer: &str,
) -> Option<Step<'a>> {
    match try_next_step(data, category, current_id, answer) {
        Ok(step) => Some(step),
        Err(e) => {
            warn!("no next step: {}", e);
            None
        }
    }
}
