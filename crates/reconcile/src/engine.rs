use std::collections::BTreeMap;

use netmeter_core::{
    BucketWindow, ByteCounts, Clock, Entity, SourceError, SystemClock, Transport,
    UNKNOWN_APP_NAME, UsageKey, UsageRecord, UsageSource, UsageStore,
};
use tracing::{debug, warn};

use crate::types::{Lookup, LookupOrigin, Result};

/// Serves bucketed usage from the store, falling back to the source for
/// misses and for windows that are still in progress.
pub struct UsageReconciler<S, C, K> {
    pub(crate) source: S,
    pub(crate) store: C,
    pub(crate) clock: K,
    pub(crate) parallel: bool,
}

impl<S, C> UsageReconciler<S, C, SystemClock>
where
    S: UsageSource,
    C: UsageStore,
{
    pub fn new(source: S, store: C) -> Self {
        Self::with_clock(source, store, SystemClock)
    }
}

impl<S, C, K> UsageReconciler<S, C, K>
where
    S: UsageSource,
    C: UsageStore,
    K: Clock,
{
    pub fn with_clock(source: S, store: C, clock: K) -> Self {
        Self {
            source,
            store,
            clock,
            parallel: true,
        }
    }

    /// Walk apps concurrently during backfill (default) or one after another.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// Usage of `entity` over the bucket containing `timestamp_ms`.
    pub fn get_or_compute(
        &self,
        transport: Transport,
        entity: Entity,
        timestamp_ms: i64,
    ) -> Result<Lookup> {
        let window = BucketWindow::containing(timestamp_ms);
        self.lookup(transport, entity, window, None)
    }

    /// In-progress bucket for every installed app.
    pub fn current_usage(&self, transport: Transport) -> Result<Vec<Lookup>> {
        let apps = match self.source.entities() {
            Ok(apps) => apps,
            Err(err) => {
                warn!(%transport, error = %err, "app enumeration failed");
                return Ok(Vec::new());
            }
        };
        let window = BucketWindow::containing(self.clock.now_ms());
        apps.keys()
            .map(|uid| self.lookup(transport, Entity::App(*uid), window, Some(&apps)))
            .collect()
    }

    pub fn list_history(&self) -> Result<Vec<UsageRecord>> {
        Ok(self.store.list_all()?)
    }

    pub fn clear_history(&self) -> Result<usize> {
        Ok(self.store.clear_all()?)
    }

    fn lookup(
        &self,
        transport: Transport,
        entity: Entity,
        window: BucketWindow,
        names: Option<&BTreeMap<u32, String>>,
    ) -> Result<Lookup> {
        let cacheable = window.is_completed(self.clock.now_ms());
        let key = UsageKey {
            transport,
            entity,
            window,
        };
        if cacheable && let Some(record) = self.store.find(&key)? {
            debug!(%transport, uid = entity.uid(), window_start = window.start, "cache hit");
            return Ok(Lookup {
                record,
                origin: LookupOrigin::Cache,
            });
        }

        let queried = self.query_window(transport, entity, window);
        let display_name = self.display_name(entity, names);
        let (counts, origin) = match queried {
            Ok(counts) if cacheable => (counts, LookupOrigin::Source),
            Ok(counts) => (counts, LookupOrigin::InProgress),
            Err(err) => {
                warn!(
                    %transport,
                    uid = entity.uid(),
                    window_start = window.start,
                    error = %err,
                    "usage query failed; reporting zero bytes"
                );
                (ByteCounts::default(), LookupOrigin::Degraded(err))
            }
        };
        let record = UsageRecord::new(transport, entity, display_name, window, counts);
        if origin == LookupOrigin::Source {
            self.store.insert(&record)?;
        }
        Ok(Lookup { record, origin })
    }

    fn query_window(
        &self,
        transport: Transport,
        entity: Entity,
        window: BucketWindow,
    ) -> std::result::Result<ByteCounts, SourceError> {
        match entity {
            Entity::Device => self.source.device_usage(transport, window),
            Entity::App(uid) => self.source.app_usage(transport, uid, window),
        }
    }

    fn display_name(&self, entity: Entity, names: Option<&BTreeMap<u32, String>>) -> String {
        let Entity::App(uid) = entity else {
            return String::new();
        };
        if let Some(name) = names.and_then(|names| names.get(&uid)) {
            return name.clone();
        }
        match self.source.entities() {
            Ok(mut apps) => apps
                .remove(&uid)
                .unwrap_or_else(|| UNKNOWN_APP_NAME.to_string()),
            Err(err) => {
                debug!(uid, error = %err, "app name lookup failed");
                UNKNOWN_APP_NAME.to_string()
            }
        }
    }
}
