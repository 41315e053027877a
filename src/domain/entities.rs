//! Domain entities: the flowchart dataset

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved top-level key holding the recommendation entries.
pub const RECOMMENDATIONS_KEY: &str = "recommendations";

/// Prefix marking a reference as a recommendation id.
pub const RECOMMENDATION_PREFIX: &str = "rec_";

/// Reference terminating a path.
pub const END_MARKER: &str = "end";

/// Where an answer leads.
///
/// Either a single reference or an ordered sequence of references. For a
/// sequence the first element is authoritative; the rest are kept in the data
/// but not followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextRef {
    Single(String),
    Many(Vec<String>),
}

impl NextRef {
    /// The terminal `end` reference.
    pub fn end() -> Self {
        NextRef::Single(END_MARKER.to_string())
    }

    /// The reference the engine follows: the value itself, or the first
    /// element of a sequence. `None` for an empty sequence.
    pub fn primary(&self) -> Option<&str> {
        match self {
            NextRef::Single(id) => Some(id),
            NextRef::Many(ids) => ids.first().map(String::as_str),
        }
    }

    /// All referenced ids, in order.
    pub fn ids(&self) -> &[String] {
        match self {
            NextRef::Single(id) => std::slice::from_ref(id),
            NextRef::Many(ids) => ids,
        }
    }

    pub fn references(&self, id: &str) -> bool {
        self.ids().iter().any(|r| r == id)
    }

    /// Remove `removed` from this reference.
    ///
    /// A direct match becomes `end`. A sequence drops the id and collapses to
    /// `end` once empty. Returns whether the reference changed.
    pub fn repair(&mut self, removed: &str) -> bool {
        match self {
            NextRef::Single(id) => {
                if id == removed {
                    *self = NextRef::end();
                    true
                } else {
                    false
                }
            }
            NextRef::Many(ids) => {
                let before = ids.len();
                ids.retain(|id| id != removed);
                let changed = ids.len() != before;
                if ids.is_empty() {
                    *self = NextRef::end();
                    return true;
                }
                changed
            }
        }
    }
}

impl From<&str> for NextRef {
    fn from(id: &str) -> Self {
        NextRef::Single(id.to_string())
    }
}

impl From<String> for NextRef {
    fn from(id: String) -> Self {
        NextRef::Single(id)
    }
}

impl From<Vec<&str>> for NextRef {
    fn from(ids: Vec<&str>) -> Self {
        NextRef::Many(ids.into_iter().map(str::to_string).collect())
    }
}

/// Classification of a single reference id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Question(&'a str),
    Recommendation(&'a str),
    End,
}

impl<'a> Target<'a> {
    pub fn classify(id: &'a str) -> Self {
        if id.starts_with(RECOMMENDATION_PREFIX) {
            Target::Recommendation(id)
        } else if id == END_MARKER {
            Target::End
        } else {
            Target::Question(id)
        }
    }
}

/// A question within a category.
///
/// Fields not named here are preserved verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub next: IndexMap<String, NextRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionNode {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            next: IndexMap::new(),
            extra: Map::new(),
        }
    }

    /// Builder-style helper adding one answer branch.
    pub fn with_answer(mut self, answer: impl Into<String>, next: impl Into<NextRef>) -> Self {
        self.next.insert(answer.into(), next.into());
        self
    }

    /// Answer labels in authored order.
    pub fn answers(&self) -> impl Iterator<Item = &str> {
        self.next.keys().map(String::as_str)
    }

    /// Shallow merge: every field present in `patch` replaces the current one.
    pub fn apply(&mut self, patch: NodePatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(next) = patch.next {
            self.next = next;
        }
        self.extra.extend(patch.extra);
    }
}

/// Partial update for a [`QuestionNode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<IndexMap<String, NextRef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.next.is_none() && self.extra.is_empty()
    }
}

/// A terminal intervention suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecommendationEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            icon: None,
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Shallow merge, same rules as [`QuestionNode::apply`].
    pub fn apply(&mut self, patch: RecommendationPatch) {
        if let Some(icon) = patch.icon {
            self.icon = Some(icon);
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
        self.extra.extend(patch.extra);
    }
}

/// Partial update for a [`RecommendationEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The complete survey dataset.
///
/// Serializes as one JSON object: every category as a key mapping to its
/// question array, plus the reserved `recommendations` key. Keeping the two
/// in separate fields means category-wide iteration never sees the
/// recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowchartData {
    #[serde(flatten)]
    pub categories: IndexMap<String, Vec<QuestionNode>>,
    pub recommendations: IndexMap<String, RecommendationEntry>,
}

impl FlowchartData {
    pub fn category(&self, name: &str) -> Option<&[QuestionNode]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// First node with `id` in `category`.
    pub fn find_node(&self, category: &str, id: &str) -> Option<&QuestionNode> {
        self.category(category)?.iter().find(|node| node.id == id)
    }

    pub fn recommendation(&self, id: &str) -> Option<&RecommendationEntry> {
        self.recommendations.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}
