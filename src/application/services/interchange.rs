//! JSON interchange: export, validated import and dataset loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::error::ImportError;
use crate::application::store::FlowchartStore;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{FlowchartData, RECOMMENDATIONS_KEY};
use crate::infrastructure::traits::FileSystem;

/// Dataset compiled into the binary.
pub const BUNDLED_DATASET: &str = include_str!("../../../data/flowchart_data.json");

/// Default export file name.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "flowchart_data.json";

/// Pretty JSON with 2-space indentation.
pub fn export_to_json_string(data: &FlowchartData) -> ApplicationResult<String> {
    serde_json::to_string_pretty(data).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize flowchart".to_string(),
        source: Box::new(e),
    })
}

/// Parse and validate flowchart JSON.
///
/// The value must be an object with at least one key besides
/// `recommendations` mapping to an array, and `recommendations` must be an
/// object.
pub fn parse_flowchart_json(text: &str) -> Result<FlowchartData, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
    let Value::Object(map) = &value else {
        return Err(ImportError::NotAnObject);
    };

    let has_categories = map
        .iter()
        .any(|(key, value)| key != RECOMMENDATIONS_KEY && value.is_array());
    if !has_categories {
        return Err(ImportError::MissingCategories);
    }
    if !map.get(RECOMMENDATIONS_KEY).is_some_and(Value::is_object) {
        return Err(ImportError::MissingRecommendations);
    }

    serde_json::from_value(value).map_err(ImportError::Schema)
}

/// Total variant of [`parse_flowchart_json`]: rejections are logged and yield `None`.
pub fn import_from_json_string(text: &str) -> Option<FlowchartData> {
    match parse_flowchart_json(text) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("error importing flowchart data: {}", e);
            None
        }
    }
}

/// The bundled dataset.
pub fn bundled_dataset() -> ApplicationResult<FlowchartData> {
    Ok(parse_flowchart_json(BUNDLED_DATASET)?)
}

/// File-level import/export.
pub struct InterchangeService {
    fs: Arc<dyn FileSystem>,
    file_name: String,
}

impl InterchangeService {
    pub fn new(fs: Arc<dyn FileSystem>, file_name: impl Into<String>) -> Self {
        Self {
            fs,
            file_name: file_name.into(),
        }
    }

    /// Where [`Self::export_to_json_file`] writes inside `dir`.
    pub fn export_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }

    /// Write `data` as JSON into `dir` and return the text written.
    pub fn export_to_json_file(&self, data: &FlowchartData, dir: &Path) -> ApplicationResult<String> {
        let json = export_to_json_string(data)?;
        let path = self.export_path(dir);
        self.fs
            .ensure_parent(&path)
            .with_path_context("create export directory", &path)?;
        self.fs
            .write(&path, &json)
            .with_path_context("write export file", &path)?;
        info!("exported flowchart to {}", path.display());
        Ok(json)
    }

    /// Export the store's current snapshot.
    pub fn export_flowchart(&self, store: &FlowchartStore, dir: &Path) -> ApplicationResult<String> {
        self.export_to_json_file(store.data(), dir)
    }

    /// Read and validate a JSON file.
    pub fn import_file(&self, path: &Path) -> ApplicationResult<FlowchartData> {
        debug!("import_file: {}", path.display());
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read import file", path)?;
        Ok(parse_flowchart_json(&text)?)
    }

    /// Replace the store's state with `text` if it validates.
    ///
    /// Returns `false` and leaves the store unchanged otherwise.
    pub fn import_flowchart(&self, store: &mut FlowchartStore, text: &str) -> bool {
        match import_from_json_string(text) {
            Some(data) => {
                store.replace(data);
                true
            }
            None => false,
        }
    }

    /// The dataset a session starts from: `path` if given, else the bundled one.
    pub fn load_dataset(&self, path: Option<&Path>) -> ApplicationResult<FlowchartData> {
        match path {
            Some(path) => {
                debug!("load_dataset: {}", path.display());
                self.import_file(path)
            }
            None => bundled_dataset(),
        }
    }
}
