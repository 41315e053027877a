//! Application layer: the working-copy store and its services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod services;
pub mod store;

pub use error::{ApplicationError, ApplicationResult, ImportError};
pub use error_ext::IoResultExt;
pub use store::{FlowchartStore, MutationOutcome, SubscriptionId};
