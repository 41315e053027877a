//! Id generation for new nodes and recommendations.

use uuid::Uuid;

use crate::domain::entities::{END_MARKER, RECOMMENDATION_PREFIX};
use crate::domain::error::DomainError;

/// First letter of each dash-separated part: `water-supply` → `ws`.
pub fn category_prefix(category: &str) -> String {
    category
        .split('-')
        .filter_map(|part| part.chars().next())
        .collect()
}

/// Unique node id for `category`, e.g. `ws-3f9a1c02`.
pub fn generate_node_id(category: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", category_prefix(category), &suffix[..8])
}

/// Recommendation id derived from its text: `Install tank` → `rec_install_tank`.
///
/// Falls back to a random suffix when the text has no usable characters.
pub fn recommendation_id_from_text(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
        if slug.len() >= 32 {
            break;
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        let suffix = Uuid::new_v4().simple().to_string();
        return format!("{}{}", RECOMMENDATION_PREFIX, &suffix[..8]);
    }
    format!("{}{}", RECOMMENDATION_PREFIX, slug)
}

/// A question id must not be mistaken for a recommendation or the end marker.
pub fn validate_node_id(id: &str) -> Result<(), DomainError> {
    let reason = if id.trim().is_empty() {
        "must not be empty"
    } else if id == END_MARKER {
        "reserved for the end marker"
    } else if id.starts_with(RECOMMENDATION_PREFIX) {
        "prefix rec_ is reserved for recommendations"
    } else {
        return Ok(());
    };
    Err(DomainError::InvalidName {
        name: id.to_string(),
        reason: reason.to_string(),
    })
}

pub fn validate_recommendation_id(id: &str) -> Result<(), DomainError> {
    if id.len() > RECOMMENDATION_PREFIX.len() && id.starts_with(RECOMMENDATION_PREFIX) {
        return Ok(());
    }
    Err(DomainError::InvalidName {
        name: id.to_string(),
        reason: "must start with rec_".to_string(),
    })
}
