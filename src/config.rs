//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cribs/cribs.toml`
//! 3. Local config: file passed with `--config`
//! 4. Environment variables: `CRIBS_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::interchange::DEFAULT_EXPORT_FILE_NAME;
use crate::application::services::persistence::DEFAULT_STORAGE_KEY;
use crate::application::ApplicationError;
use crate::util::path::expand_env_vars;

/// Raw settings for intermediate parsing.
///
/// Every field is optional so a layer only overrides what it names.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub dataset: Option<PathBuf>,
    pub storage_key: Option<String>,
    pub export_file_name: Option<String>,
    pub report_dir: Option<PathBuf>,
    pub school_name: Option<String>,
}

/// Unified configuration for cribs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Data directory; the working copy lives in `data_dir/storage`
    pub data_dir: PathBuf,
    /// Dataset replacing the bundled one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    /// Key of the working-copy slot
    pub storage_key: String,
    /// File name used by `export`
    pub export_file_name: String,
    /// Directory reports are written to
    pub report_dir: PathBuf,
    /// School named on reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            dataset: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            report_dir: PathBuf::from("."),
            school_name: None,
        }
    }
}

/// Platform data directory, `~/.cribs` when none is known.
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "cribs")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.cribs"))
}

/// Get the XDG config directory for cribs.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cribs").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cribs.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Directory of the file-backed key-value store.
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
        self.report_dir = expand_path(&self.report_dir);
        self.dataset = self.dataset.as_deref().map(expand_path);
    }

    /// Overlay wins wherever it names a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            dataset: overlay.dataset.clone().or_else(|| self.dataset.clone()),
            storage_key: overlay
                .storage_key
                .clone()
                .unwrap_or_else(|| self.storage_key.clone()),
            export_file_name: overlay
                .export_file_name
                .clone()
                .unwrap_or_else(|| self.export_file_name.clone()),
            report_dir: overlay
                .report_dir
                .clone()
                .unwrap_or_else(|| self.report_dir.clone()),
            school_name: overlay
                .school_name
                .clone()
                .or_else(|| self.school_name.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file given on the command line
    ///
    /// A missing global file is skipped; a missing local file is an error.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(local_path) = local {
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply CRIBS_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("CRIBS").separator("__"))
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            data_dir: config.get_string("data_dir").ok().map(PathBuf::from),
            dataset: config.get_string("dataset").ok().map(PathBuf::from),
            storage_key: config.get_string("storage_key").ok(),
            export_file_name: config.get_string("export_file_name").ok(),
            report_dir: config.get_string("report_dir").ok().map(PathBuf::from),
            school_name: config.get_string("school_name").ok(),
        };

        Ok(settings.merge_with(&raw))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cribs configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/cribs/cribs.toml
#   Local:  file passed with --config
#   Env:    CRIBS_* environment variables (e.g. CRIBS_SCHOOL_NAME)

# Data directory; the saved working copy lives in data_dir/storage
# data_dir = "~/.local/share/cribs"

# Flowchart dataset to start from instead of the bundled one
# dataset = "~/cribs/flowchart_data.json"

# Key of the saved working copy
# storage_key = "flowchartData"

# File name written by `cribs export`
# export_file_name = "flowchart_data.json"

# Directory survey reports are written to
# report_dir = "."

# School named on survey reports
# school_name = "Green Valley Primary"
"#
        .to_string()
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_vars(path.to_string_lossy().as_ref()))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
