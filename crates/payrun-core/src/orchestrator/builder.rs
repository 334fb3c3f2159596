//! Builder for creating and configuring Orchestrator instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use jiff::Zoned;
use log::{debug, info};
use tokio::task;

use super::Orchestrator;
use crate::{
    db::Database,
    error::{CycleError, Result},
    handler::{ActionHandlers, NoReporting, Reporting},
    registry::{month_label, StepRegistry},
    store::{KeyValueStore, StepStateStore},
};

/// Builder for creating and configuring Orchestrator instances.
pub struct CycleBuilder {
    database_path: Option<PathBuf>,
    store: Option<Box<dyn KeyValueStore>>,
    registry: Option<StepRegistry>,
    month: Option<String>,
    handlers: ActionHandlers,
    reporting: Option<Arc<dyn Reporting>>,
}

impl CycleBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            store: None,
            registry: None,
            month: None,
            handlers: ActionHandlers::new(),
            reporting: None,
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses the XDG Base Directory layout:
    /// `$XDG_DATA_HOME/payrun/payrun.db` or `~/.local/share/payrun/payrun.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Uses `store` for persistence instead of the SQLite database.
    pub fn with_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Replaces the payroll catalog with a custom step sequence.
    pub fn with_registry(mut self, registry: StepRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Month used when the store holds no selection yet. Defaults to the
    /// current month.
    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    pub fn with_handlers(mut self, handlers: ActionHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_reporting(mut self, reporting: impl Reporting + 'static) -> Self {
        self.reporting = Some(Arc::new(reporting));
        self
    }

    /// Builds the configured orchestrator and applies any pending
    /// verification hand-off.
    ///
    /// # Errors
    ///
    /// Returns `CycleError::MissingHandler` if a registry step has no handler
    /// Returns `CycleError::FileSystem` if the database path is invalid
    /// Returns `CycleError::Database` if database initialization fails
    pub async fn build(self) -> Result<Orchestrator> {
        let month = self
            .month
            .unwrap_or_else(|| month_label(Zoned::now().date()));
        let registry = self
            .registry
            .unwrap_or_else(|| StepRegistry::payroll(&month));
        self.handlers.validate(&registry)?;

        let backend = match self.store {
            Some(store) => store,
            None => Box::new(Self::open_database(self.database_path).await?),
        };

        let store = StepStateStore::load(registry, backend, &month);
        let reporting = self
            .reporting
            .unwrap_or_else(|| Arc::new(NoReporting));
        let orchestrator = Orchestrator::new(store, self.handlers, reporting);

        if let Some(outcome) = orchestrator.consume_handoff() {
            debug!("Applied pending verification hand-off: {outcome:?}");
        }
        info!(
            "Payroll cycle ready for {}",
            orchestrator.session().store.selected_month()
        );
        Ok(orchestrator)
    }

    async fn open_database(path: Option<PathBuf>) -> Result<Database> {
        let db_path = match path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CycleError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Opening cycle database at {}", db_path.display());
        task::spawn_blocking(move || Database::new(&db_path))
            .await
            .map_err(|e| CycleError::Configuration {
                message: format!("Task join error: {e}"),
            })?
    }

    /// Returns the default database path following the XDG Base Directory
    /// layout.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("payrun")
            .place_data_file("payrun.db")
            .map_err(|e| CycleError::XdgDirectory(e.to_string()))
    }
}

impl Default for CycleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
