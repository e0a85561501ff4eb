use std::path::PathBuf;
use std::sync::Arc;

use netmeter_core::UsageSource;
use netmeter_db::Db;
use reconcile::CancelToken;

use crate::config::{self, TrackerConfig};
use crate::error::{AppError, Result};
use crate::services::{AppServices, BootstrapSummary};
use crate::startup::AppPaths;

/// Paths and settings needed to run the tracker.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub tracker: TrackerConfig,
}

/// Application state shared by callers (presentation layer, CLI).
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db_path: PathBuf, tracker: TrackerConfig, source: Arc<dyn UsageSource>) -> Self {
        let config = AppConfig { db_path, tracker };
        let services = AppServices::new(&config, source);
        Self { config, services }
    }

    /// Loads (or writes) the config file under `paths` and builds the state.
    pub fn from_paths(paths: &AppPaths, source: Arc<dyn UsageSource>) -> Result<Self> {
        let loaded = config::load_or_create(&paths.config_path)?;
        if loaded.created {
            tracing::info!(path = %loaded.path.display(), "wrote default config");
        }
        Ok(Self::new(paths.db_path.clone(), loaded.config, source))
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    /// Migrates the database and runs the one-time history backfill.
    pub fn initialize(&self, cancel: &CancelToken) -> Result<BootstrapSummary> {
        self.setup_db()
            .map_err(|err| AppError::Message(format!("initialize db: {}", err)))?;
        self.services.bootstrap.run_if_needed(cancel)
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }
}

pub fn setup_db(path: &std::path::Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
