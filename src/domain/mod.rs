//! Domain layer: the flowchart model and its pure operations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod catalog;
pub mod entities;
pub mod error;
pub mod ids;
pub mod integrity;
pub mod survey;
pub mod traversal;

pub use entities::*;
pub use error::DomainError;
pub use survey::SurveySession;
pub use traversal::{first_question, next_step, resolve_target, try_next_step, Recommended, Step};
