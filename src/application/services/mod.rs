//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, KeyValueStore, Clock)
//! but are themselves concrete structs, not traits.

pub mod interchange;
pub mod persistence;
pub mod report;

pub use interchange::{
    bundled_dataset, export_to_json_string, import_from_json_string, parse_flowchart_json,
    InterchangeService,
};
pub use persistence::PersistenceService;
pub use report::{ReportRenderer, ReportService, TextReportRenderer};
