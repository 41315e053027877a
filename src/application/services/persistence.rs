//! Durable working copy in the local key-value slot.
//!
//! Public operations report success as `bool` and never propagate errors;
//! failures are logged. The `try_*` variants expose the cause.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::services::interchange::{export_to_json_string, parse_flowchart_json};
use crate::application::store::FlowchartStore;
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::FlowchartData;
use crate::infrastructure::traits::KeyValueStore;

/// Default key of the working-copy slot.
pub const DEFAULT_STORAGE_KEY: &str = "flowchartData";

pub struct PersistenceService {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl PersistenceService {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn try_save(&self, data: &FlowchartData) -> ApplicationResult<()> {
        let json = export_to_json_string(data)?;
        self.kv.set(&self.key, &json).with_storage_key(&self.key)
    }

    /// Save the store's current snapshot.
    pub fn save_flowchart(&self, store: &FlowchartStore) -> bool {
        match self.try_save(store.data()) {
            Ok(()) => {
                info!("flowchart saved under '{}'", self.key);
                true
            }
            Err(e) => {
                warn!("failed to save flowchart: {}", e);
                false
            }
        }
    }

    /// The saved working copy, `None` if nothing was saved.
    pub fn try_load(&self) -> ApplicationResult<Option<FlowchartData>> {
        let Some(text) = self.kv.get(&self.key).with_storage_key(&self.key)? else {
            return Ok(None);
        };
        Ok(Some(parse_flowchart_json(&text)?))
    }

    /// Replace the store's state with the saved copy.
    ///
    /// Returns `false` when nothing was saved or the saved copy is unusable;
    /// the store is left unchanged in both cases.
    pub fn load_flowchart(&self, store: &mut FlowchartStore) -> bool {
        match self.try_load() {
            Ok(Some(data)) => {
                store.replace(data);
                debug!("flowchart loaded from '{}'", self.key);
                true
            }
            Ok(None) => {
                debug!("no saved flowchart under '{}'", self.key);
                false
            }
            Err(e) => {
                warn!("failed to load flowchart: {}", e);
                false
            }
        }
    }

    /// Drop the saved copy. Returns `false` if the slot could not be cleared.
    pub fn clear_saved(&self) -> bool {
        match self.kv.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to clear saved flowchart: {}", e);
                false
            }
        }
    }
}
