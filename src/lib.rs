//! CRIBS school climate survey.
//!
//! A category of the survey is a flowchart of yes/no questions whose answers
//! lead to further questions, to recommendations, or to the end. The crate
//! walks those flowcharts, edits a working copy of them, and moves the copy
//! between JSON files and local storage.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
