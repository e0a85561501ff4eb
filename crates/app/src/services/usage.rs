use netmeter_core::{Entity, Transport, UsageRecord};
use reconcile::Lookup;

use crate::error::Result;
use crate::services::{Engine, SharedConfig, SharedSource, open_db, open_engine};

#[derive(Clone)]
pub struct UsageService {
    config: SharedConfig,
    source: SharedSource,
}

impl UsageService {
    pub(super) fn new(config: SharedConfig, source: SharedSource) -> Self {
        Self { config, source }
    }

    fn engine(&self) -> Result<Engine> {
        open_engine(&self.config, &self.source)
    }

    pub fn usage_at(
        &self,
        transport: Transport,
        entity: Entity,
        timestamp_ms: i64,
    ) -> Result<Lookup> {
        Ok(self.engine()?.get_or_compute(transport, entity, timestamp_ms)?)
    }

    pub fn current_usage(&self, transport: Transport) -> Result<Vec<Lookup>> {
        Ok(self.engine()?.current_usage(transport)?)
    }

    pub fn history(&self) -> Result<Vec<UsageRecord>> {
        Ok(self.engine()?.list_history()?)
    }

    pub fn history_for(&self, transport: Transport, entity: Entity) -> Result<Vec<UsageRecord>> {
        let db = open_db(&self.config)?;
        Ok(db.list_usage_for(transport, entity)?)
    }

    pub fn clear_history(&self) -> Result<usize> {
        let cleared = self.engine()?.clear_history()?;
        tracing::info!(cleared, "usage history cleared");
        Ok(cleared)
    }
}
