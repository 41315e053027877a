//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{
    InterchangeService, PersistenceService, ReportRenderer, ReportService,
};
use crate::application::{ApplicationResult, FlowchartStore};
use crate::config::Settings;
use crate::infrastructure::traits::{
    Clock, FileKeyValueStore, FileSystem, KeyValueStore, RealFileSystem, Selector, SkimSelector,
    SystemClock,
};

/// Container holding settings and the I/O collaborators services are built from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Local key-value slots for the working copy
    pub kv: Arc<dyn KeyValueStore>,

    /// Time source for reports
    pub clock: Arc<dyn Clock>,

    /// Interactive answer selection
    pub selector: Arc<dyn Selector>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let kv = Arc::new(FileKeyValueStore::new(settings.storage_dir(), fs.clone()));
        Self::with_deps(
            settings,
            fs,
            kv,
            Arc::new(SystemClock),
            Arc::new(SkimSelector),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            kv,
            clock,
            selector,
        }
    }

    pub fn interchange(&self) -> InterchangeService {
        InterchangeService::new(self.fs.clone(), self.settings.export_file_name.clone())
    }

    pub fn persistence(&self) -> PersistenceService {
        PersistenceService::new(self.kv.clone(), self.settings.storage_key.clone())
    }

    pub fn report(&self, renderer: Arc<dyn ReportRenderer>) -> ReportService {
        ReportService::new(self.fs.clone(), self.clock.clone(), renderer)
    }

    /// Session start: wrap the dataset, then adopt the saved working copy if any.
    pub fn open_store(&self) -> ApplicationResult<FlowchartStore> {
        let dataset = self
            .interchange()
            .load_dataset(self.settings.dataset.as_deref())?;
        let mut store = FlowchartStore::from_dataset(&dataset);
        if self.persistence().load_flowchart(&mut store) {
            debug!("open_store: using saved working copy");
        } else {
            debug!("open_store: using dataset");
        }
        Ok(store)
    }
}
