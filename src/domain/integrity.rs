//! Author-time dataset checks.
//!
//! The traversal engine trusts its data. These checks are for dataset
//! authors and tests: dangling references, duplicate ids and reference
//! cycles between questions.

use std::collections::HashMap;

use crate::domain::entities::{FlowchartData, QuestionNode, Target};

/// A `next` entry that points nowhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub category: String,
    pub node_id: String,
    pub answer: String,
    pub target: String,
}

/// A node id used more than once within its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    pub category: String,
    pub node_id: String,
}

/// A closed path of question ids; first and last element are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCycle {
    pub category: String,
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub dangling: Vec<DanglingReference>,
    pub duplicates: Vec<DuplicateId>,
    pub cycles: Vec<ReferenceCycle>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.duplicates.is_empty() && self.cycles.is_empty()
    }
}

/// Run every check over `data`.
pub fn check(data: &FlowchartData) -> IntegrityReport {
    IntegrityReport {
        dangling: find_dangling_references(data),
        duplicates: find_duplicate_ids(data),
        cycles: find_cycles(data),
    }
}

/// Every referenced id (sequence members included) that resolves to nothing.
pub fn find_dangling_references(data: &FlowchartData) -> Vec<DanglingReference> {
    let mut dangling = Vec::new();
    for (category, nodes) in &data.categories {
        for node in nodes {
            for (answer, next) in &node.next {
                for target in next.ids() {
                    let resolves = match Target::classify(target) {
                        Target::Recommendation(id) => data.recommendations.contains_key(id),
                        Target::End => true,
                        Target::Question(id) => nodes.iter().any(|n| n.id == id),
                    };
                    if !resolves {
                        dangling.push(DanglingReference {
                            category: category.clone(),
                            node_id: node.id.clone(),
                            answer: answer.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
    }
    dangling
}

pub fn find_duplicate_ids(data: &FlowchartData) -> Vec<DuplicateId> {
    let mut duplicates = Vec::new();
    for (category, nodes) in &data.categories {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for node in nodes {
            let count = seen.entry(node.id.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push(DuplicateId {
                    category: category.clone(),
                    node_id: node.id.clone(),
                });
            }
        }
    }
    duplicates
}

/// Cycles between questions, following every member of sequence branches.
pub fn find_cycles(data: &FlowchartData) -> Vec<ReferenceCycle> {
    let mut cycles = Vec::new();
    for (category, nodes) in &data.categories {
        for path in cycles_in(nodes) {
            cycles.push(ReferenceCycle {
                category: category.clone(),
                path,
            });
        }
    }
    cycles
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

fn cycles_in(nodes: &[QuestionNode]) -> Vec<Vec<String>> {
    let mut index: HashMap<&str, &QuestionNode> = HashMap::new();
    for node in nodes {
        index.entry(node.id.as_str()).or_insert(node);
    }

    let mut state: HashMap<&str, Visit> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut cycles = Vec::new();
    for node in nodes {
        if !state.contains_key(node.id.as_str()) {
            visit(&node.id, &index, &mut state, &mut stack, &mut cycles);
        }
    }
    cycles
}

fn visit<'a>(
    id: &'a str,
    index: &HashMap<&'a str, &'a QuestionNode>,
    state: &mut HashMap<&'a str, Visit>,
    stack: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    state.insert(id, Visit::InProgress);
    stack.push(id);

    if let Some(&node) = index.get(id) {
        for target in node.next.values().flat_map(|next| next.ids()) {
            let Target::Question(next_id) = Target::classify(target) else {
                continue;
            };
            if !index.contains_key(next_id) {
                continue;
            }
            match state.get(next_id).copied() {
                Some(Visit::InProgress) => {
                    let start = stack.iter().position(|s| *s == next_id).unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|s| s.to_string()).collect();
                    path.push(next_id.to_string());
                    cycles.push(path);
                }
                Some(Visit::Done) => {}
                None => visit(next_id, index, state, stack, cycles),
            }
        }
    }

    stack.pop();
    state.insert(id, Visit::Done);
}
