mod bootstrap;
mod settings;
mod usage;

use std::sync::Arc;

use netmeter_core::{SystemClock, UsageSource};
use netmeter_db::{Db, SharedDb};
use reconcile::UsageReconciler;

use crate::app::AppConfig;
use crate::error::Result;

pub use bootstrap::{BootstrapService, BootstrapSummary};
pub use settings::{BootstrapStatus, SettingsService};
pub use usage::UsageService;

type SharedConfig = Arc<AppConfig>;
type SharedSource = Arc<dyn UsageSource>;
type Engine = UsageReconciler<SharedSource, SharedDb, SystemClock>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub usage: UsageService,
    pub bootstrap: BootstrapService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(config: &AppConfig, source: SharedSource) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            usage: UsageService::new(shared.clone(), source.clone()),
            bootstrap: BootstrapService::new(shared.clone(), source),
            settings: SettingsService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}

fn open_engine(config: &SharedConfig, source: &SharedSource) -> Result<Engine> {
    let store = SharedDb::new(open_db(config)?);
    Ok(UsageReconciler::new(source.clone(), store).parallel(config.tracker.parallel_backfill))
}
