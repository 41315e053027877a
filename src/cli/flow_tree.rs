//! Tree rendering of a category's question flow.

use termtree::Tree;

use crate::domain::{FlowchartData, NextRef, QuestionNode, Target};

/// Flow of `category` from its first question; `None` if absent or empty.
///
/// Each question lists its answers; an answer leads to a nested question, a
/// recommendation or `end`. A question already on the current path is shown
/// as a back-reference instead of being expanded again.
pub fn flow_tree(data: &FlowchartData, category: &str) -> Option<Tree<String>> {
    let first = data.category(category)?.first()?;
    let mut path = Vec::new();
    Some(question_tree(data, category, first, &mut path))
}

fn question_tree(
    data: &FlowchartData,
    category: &str,
    node: &QuestionNode,
    path: &mut Vec<String>,
) -> Tree<String> {
    path.push(node.id.clone());
    let leaves: Vec<Tree<String>> = node
        .next
        .iter()
        .map(|(answer, next)| answer_tree(data, category, answer, next, path))
        .collect();
    path.pop();
    Tree::new(format!("{}: {}", node.id, node.text)).with_leaves(leaves)
}

fn answer_tree(
    data: &FlowchartData,
    category: &str,
    answer: &str,
    next: &NextRef,
    path: &mut Vec<String>,
) -> Tree<String> {
    let skipped = match next.ids().len() {
        0 | 1 => String::new(),
        n => format!(" (+{} not followed)", n - 1),
    };
    let Some(target) = next.primary() else {
        return Tree::new(format!("[{}] (no target)", answer));
    };

    match Target::classify(target) {
        Target::End => Tree::new(format!("[{}] end{}", answer, skipped)),
        Target::Recommendation(id) => {
            let text = data
                .recommendation(id)
                .map(|entry| entry.text.as_str())
                .unwrap_or("(missing)");
            Tree::new(format!("[{}] {}: {}{}", answer, id, text, skipped))
        }
        Target::Question(id) if path.iter().any(|seen| seen == id) => {
            Tree::new(format!("[{}] back to {}{}", answer, id, skipped))
        }
        Target::Question(id) => match data.find_node(category, id) {
            Some(node) => Tree::new(format!("[{}]{}", answer, skipped))
                .with_leaves([question_tree(data, category, node, path)]),
            None => Tree::new(format!("[{}] {} (missing){}", answer, id, skipped)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecommendationEntry;
    use indexmap::IndexMap;

    fn sample() -> FlowchartData {
        let mut categories = IndexMap::new();
        categories.insert(
            "loop".to_string(),
            vec![
                QuestionNode::new("q1", "First?")
                    .with_answer("yes", "q2")
                    .with_answer("no", "rec_a"),
                QuestionNode::new("q2", "Second?")
                    .with_answer("again", "q1")
                    .with_answer("stop", "end"),
            ],
        );
        let mut recommendations = IndexMap::new();
        recommendations.insert("rec_a".to_string(), RecommendationEntry::new("Do A"));
        FlowchartData {
            categories,
            recommendations,
        }
    }

    #[test]
    fn given_cycle_when_flow_tree_then_back_reference_ends_branch() {
        let tree = flow_tree(&sample(), "loop").expect("tree");
        let rendered = tree.to_string();
        assert!(rendered.contains("q1: First?"));
        assert!(rendered.contains("q2: Second?"));
        assert!(rendered.contains("[again] back to q1"));
        assert!(rendered.contains("[no] rec_a: Do A"));
        assert!(rendered.contains("[stop] end"));
    }

    #[test]
    fn given_unknown_category_when_flow_tree_then_none() {
        assert!(flow_tree(&sample(), "nope").is_none());
    }
}
