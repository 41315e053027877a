//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::NextRef;

/// CRIBS school climate survey: walk the flowcharts, edit them, keep a working copy
#[derive(Parser, Debug)]
#[command(name = "cribs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List categories
    Categories,

    /// Add or delete categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Inspect and edit questions
    Node {
        #[command(subcommand)]
        command: NodeCommands,
    },

    /// Inspect and edit recommendations
    Rec {
        #[command(subcommand)]
        command: RecCommands,
    },

    /// Follow one answer from a question
    Step {
        /// Category key
        category: String,
        /// Current question id
        node: String,
        /// Answer label
        answer: String,
        /// Print the step as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take the survey for a category
    Survey {
        /// Category key
        category: String,
        /// Answers to give in order instead of prompting (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        answers: Option<Vec<String>>,
        /// School name for the report
        #[arg(short, long)]
        school: Option<String>,
        /// Write a report at the end
        #[arg(short, long)]
        report: bool,
        /// Directory for the report
        #[arg(long, value_hint = ValueHint::DirPath)]
        report_dir: Option<PathBuf>,
    },

    /// Export the working copy as JSON
    Export {
        /// Target directory (default: cwd)
        #[arg(long, value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "dir")]
        stdout: bool,
    },

    /// Replace the working copy with a JSON file
    Import {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Check the working copy for dangling references, duplicate ids and cycles
    Check,

    /// Discard the saved working copy
    Reset,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create an empty category
    Add { name: String },
    /// Delete a category and its questions
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum NodeCommands {
    /// List the questions of a category
    List { category: String },

    /// Print one question as JSON
    Show { category: String, id: String },

    /// Show the flow of a category as a tree
    Tree { category: String },

    /// Append a question
    Add {
        category: String,
        /// Question id (generated if omitted)
        #[arg(long)]
        id: Option<String>,
        /// Question text
        #[arg(short, long)]
        text: String,
        /// Branch as answer=target[,target...]; repeatable
        #[arg(short, long = "next", value_parser = parse_branch)]
        next: Vec<Branch>,
    },

    /// Change a question's text or branches
    Update {
        category: String,
        id: String,
        #[arg(short, long)]
        text: Option<String>,
        /// Set a branch as answer=target[,target...]; repeatable
        #[arg(short, long = "next", value_parser = parse_branch)]
        next: Vec<Branch>,
        /// Remove the branch for an answer; repeatable
        #[arg(long)]
        remove_answer: Vec<String>,
    },

    /// Delete a question; references to it become `end`
    Delete { category: String, id: String },
}

#[derive(Subcommand, Debug)]
pub enum RecCommands {
    /// List recommendations
    List,

    /// Add a recommendation
    Add {
        /// Recommendation id (derived from the text if omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        text: String,
        #[arg(short, long)]
        icon: Option<String>,
    },

    /// Change a recommendation's text or icon
    Update {
        id: String,
        #[arg(short, long)]
        text: Option<String>,
        #[arg(short, long)]
        icon: Option<String>,
    },

    /// Delete a recommendation; references to it become `end`
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}

/// One `answer=target[,target...]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub answer: String,
    pub next: NextRef,
}

/// Parse `answer=target[,target...]`.
pub fn parse_branch(s: &str) -> Result<Branch, String> {
    let (answer, targets) = s
        .split_once('=')
        .ok_or_else(|| format!("expected answer=target, got '{}'", s))?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(format!("empty answer in '{}'", s));
    }
    let mut targets: Vec<String> = targets
        .split(',')
        .map(|t| t.trim().to_string())
        .collect();
    if targets.iter().any(String::is_empty) {
        return Err(format!("empty target in '{}'", s));
    }
    let next = if targets.len() == 1 {
        NextRef::Single(targets.remove(0))
    } else {
        NextRef::Many(targets)
    };
    Ok(Branch {
        answer: answer.to_string(),
        next,
    })
}
