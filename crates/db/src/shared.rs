use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use netmeter_core::{StoreError, UsageKey, UsageRecord, UsageStore};

use crate::Db;
use crate::error::{DbError, Result};

/// A [`Db`] behind a mutex so it can serve as the engine's [`UsageStore`].
pub struct SharedDb {
    db: Mutex<Db>,
}

impl SharedDb {
    pub fn new(db: Db) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Opens and migrates the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut db = Db::open(path)?;
        db.migrate()?;
        Ok(Self::new(db))
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Db>> {
        self.db.lock().map_err(|_| DbError::Poisoned)
    }
}

impl UsageStore for SharedDb {
    fn find(&self, key: &UsageKey) -> std::result::Result<Option<UsageRecord>, StoreError> {
        let db = self.lock().map_err(StoreError::new)?;
        db.find_usage(key).map_err(StoreError::new)
    }

    fn insert(&self, record: &UsageRecord) -> std::result::Result<(), StoreError> {
        let db = self.lock().map_err(StoreError::new)?;
        db.upsert_usage(record).map_err(StoreError::new)
    }

    fn list_all(&self) -> std::result::Result<Vec<UsageRecord>, StoreError> {
        let db = self.lock().map_err(StoreError::new)?;
        db.list_usage().map_err(StoreError::new)
    }

    fn clear_all(&self) -> std::result::Result<usize, StoreError> {
        let db = self.lock().map_err(StoreError::new)?;
        db.clear_usage().map_err(StoreError::new)
    }
}
