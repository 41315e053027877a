//! Observable working copy of the flowchart
//!
//! The store owns the single mutable copy of the dataset for a session.
//! Every applied mutation dispatches the new snapshot to all observers,
//! synchronously and in subscription order. Observers receive a shared
//! borrow, so they cannot mutate the store during dispatch.

use std::fmt;

use tracing::debug;

use crate::domain::{
    FlowchartData, NodePatch, QuestionNode, RecommendationEntry, RecommendationPatch,
    RECOMMENDATIONS_KEY,
};

/// What a mutation did.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The change was applied and observers were notified.
    Applied,
    /// The target category, node or recommendation does not exist.
    NotFound,
    /// The item to create already exists; nothing changed.
    AlreadyExists,
    /// The request is not allowed (e.g. a reserved category name).
    Rejected,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == MutationOutcome::Applied
    }
}

/// Handle returned by [`FlowchartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&FlowchartData)>;

pub struct FlowchartStore {
    data: FlowchartData,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for FlowchartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowchartStore")
            .field("categories", &self.data.categories.len())
            .field("recommendations", &self.data.recommendations.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl FlowchartStore {
    /// Wrap `data` as the working copy.
    pub fn new(data: FlowchartData) -> Self {
        Self {
            data,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Working copy made from a loaded dataset, leaving the dataset untouched.
    pub fn from_dataset(dataset: &FlowchartData) -> Self {
        Self::new(dataset.clone())
    }

    /// Read-only view of the current state.
    pub fn data(&self) -> &FlowchartData {
        &self.data
    }

    /// Independent copy of the current state, e.g. for export.
    pub fn snapshot(&self) -> FlowchartData {
        self.data.clone()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&FlowchartData) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.data);
        }
    }

    fn finish(&mut self, outcome: MutationOutcome) -> MutationOutcome {
        if outcome.is_applied() {
            self.notify();
        }
        outcome
    }

    /// Adopt `data` wholesale (import, load).
    pub fn replace(&mut self, data: FlowchartData) {
        debug!(
            "replace: {} categories, {} recommendations",
            data.categories.len(),
            data.recommendations.len()
        );
        self.data = data;
        self.notify();
    }

    /// Shallow-merge `patch` into the first node with `node_id`.
    pub fn update_node(&mut self, category: &str, node_id: &str, patch: NodePatch) -> MutationOutcome {
        let outcome = match self
            .data
            .categories
            .get_mut(category)
            .and_then(|nodes| nodes.iter_mut().find(|node| node.id == node_id))
        {
            Some(node) => {
                node.apply(patch);
                MutationOutcome::Applied
            }
            None => MutationOutcome::NotFound,
        };
        debug!("update_node: {}/{} -> {:?}", category, node_id, outcome);
        self.finish(outcome)
    }

    /// Append `node` to `category`. Id uniqueness is the caller's concern.
    pub fn add_node(&mut self, category: &str, node: QuestionNode) -> MutationOutcome {
        let outcome = match self.data.categories.get_mut(category) {
            Some(nodes) => {
                debug!("add_node: {}/{}", category, node.id);
                nodes.push(node);
                MutationOutcome::Applied
            }
            None => MutationOutcome::NotFound,
        };
        self.finish(outcome)
    }

    /// Remove every node with `node_id` and re-point references to it.
    pub fn delete_node(&mut self, category: &str, node_id: &str) -> MutationOutcome {
        let Some(nodes) = self.data.categories.get_mut(category) else {
            return MutationOutcome::NotFound;
        };
        let before = nodes.len();
        nodes.retain(|node| node.id != node_id);
        if nodes.len() == before {
            return MutationOutcome::NotFound;
        }
        let repaired = repair_references(nodes, node_id);
        debug!(
            "delete_node: {}/{} ({} references repaired)",
            category, node_id, repaired
        );
        self.finish(MutationOutcome::Applied)
    }

    /// Create an empty category.
    pub fn add_category(&mut self, name: &str) -> MutationOutcome {
        if name.trim().is_empty() || name == RECOMMENDATIONS_KEY {
            return MutationOutcome::Rejected;
        }
        if self.data.categories.contains_key(name) {
            return MutationOutcome::AlreadyExists;
        }
        debug!("add_category: {}", name);
        self.data.categories.insert(name.to_string(), Vec::new());
        self.finish(MutationOutcome::Applied)
    }

    /// Remove a category. References from other categories are not repaired.
    pub fn delete_category(&mut self, name: &str) -> MutationOutcome {
        if self.data.categories.shift_remove(name).is_none() {
            return MutationOutcome::NotFound;
        }
        debug!("delete_category: {}", name);
        self.finish(MutationOutcome::Applied)
    }

    /// Insert or replace a recommendation.
    pub fn add_recommendation(&mut self, id: &str, entry: RecommendationEntry) -> MutationOutcome {
        debug!("add_recommendation: {}", id);
        self.data.recommendations.insert(id.to_string(), entry);
        self.finish(MutationOutcome::Applied)
    }

    pub fn update_recommendation(&mut self, id: &str, patch: RecommendationPatch) -> MutationOutcome {
        let outcome = match self.data.recommendations.get_mut(id) {
            Some(entry) => {
                entry.apply(patch);
                MutationOutcome::Applied
            }
            None => MutationOutcome::NotFound,
        };
        debug!("update_recommendation: {} -> {:?}", id, outcome);
        self.finish(outcome)
    }

    /// Remove a recommendation and re-point references to it in every category.
    pub fn delete_recommendation(&mut self, id: &str) -> MutationOutcome {
        if self.data.recommendations.shift_remove(id).is_none() {
            return MutationOutcome::NotFound;
        }
        let repaired: usize = self
            .data
            .categories
            .values_mut()
            .map(|nodes| repair_references(nodes, id))
            .sum();
        debug!(
            "delete_recommendation: {} ({} references repaired)",
            id, repaired
        );
        self.finish(MutationOutcome::Applied)
    }
}

/// Apply [`crate::domain::NextRef::repair`] to every branch; returns the number changed.
fn repair_references(nodes: &mut [QuestionNode], removed: &str) -> usize {
    let mut repaired = 0;
    for node in nodes.iter_mut() {
        for next in node.next.values_mut() {
            if next.repair(removed) {
                repaired += 1;
            }
        }
    }
    repaired
}
