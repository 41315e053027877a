//! Survey session: one walk through a category, collecting recommendations.
//!
//! Reaching a recommendation records it and moves on to the question that
//! follows the current one in the category's sequence; `end` finishes the
//! walk.

use tracing::debug;

use crate::domain::entities::{FlowchartData, QuestionNode, RecommendationEntry};
use crate::domain::error::DomainError;
use crate::domain::traversal::{first_question, try_next_step, Step};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveySession {
    category: String,
    current: Option<String>,
    answers: Vec<AnswerRecord>,
    recommendations: Vec<String>,
}

impl SurveySession {
    /// Start at the first question of `category`.
    pub fn start(data: &FlowchartData, category: &str) -> Result<Self, DomainError> {
        let first = first_question(data, category)
            .ok_or_else(|| DomainError::CategoryNotFound(category.to_string()))?;
        debug!("survey start: {} at {}", category, first.id);
        Ok(Self {
            category: category.to_string(),
            current: Some(first.id.clone()),
            answers: Vec::new(),
            recommendations: Vec::new(),
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_question<'a>(&self, data: &'a FlowchartData) -> Option<&'a QuestionNode> {
        data.find_node(&self.category, self.current.as_deref()?)
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn recommendation_ids(&self) -> &[String] {
        &self.recommendations
    }

    /// Collected recommendations, in the order they were reached.
    ///
    /// Entries removed from `data` since they were reached are skipped.
    pub fn recommendations<'a>(
        &self,
        data: &'a FlowchartData,
    ) -> Vec<(&'a str, &'a RecommendationEntry)> {
        self.recommendations
            .iter()
            .filter_map(|id| data.recommendations.get_key_value(id.as_str()))
            .map(|(id, entry)| (id.as_str(), entry))
            .collect()
    }

    /// Answer the current question.
    ///
    /// On error the session is left unchanged. Answering a finished session
    /// reports [`Step::End`].
    pub fn answer<'a>(
        &mut self,
        data: &'a FlowchartData,
        answer: &str,
    ) -> Result<Step<'a>, DomainError> {
        let Some(current) = self.current.clone() else {
            return Ok(Step::End);
        };
        let step = try_next_step(data, &self.category, &current, answer)?;

        self.answers.push(AnswerRecord {
            question_id: current.clone(),
            answer: answer.to_string(),
        });

        self.current = match &step {
            Step::Question(node) => Some(node.id.clone()),
            Step::Recommendation(rec) => {
                if !self.recommendations.iter().any(|id| id == rec.id) {
                    self.recommendations.push(rec.id.to_string());
                }
                self.following(data, &current)
            }
            Step::End => None,
        };
        debug!(
            "survey {}: {} --{}--> {:?}",
            self.category, current, answer, self.current
        );
        Ok(step)
    }

    /// Id of the question after `id` in the category sequence.
    fn following(&self, data: &FlowchartData, id: &str) -> Option<String> {
        let nodes = data.category(&self.category)?;
        let pos = nodes.iter().position(|node| node.id == id)?;
        nodes.get(pos + 1).map(|node| node.id.clone())
    }
}
