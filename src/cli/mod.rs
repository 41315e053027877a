//! CLI layer: argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod flow_tree;
pub mod output;

pub use args::{Cli, Commands};
pub use commands::{execute_command, execute_with};
pub use error::{CliError, CliResult};
