use std::error::Error as StdError;
use std::sync::Arc;

use crate::{UsageKey, UsageRecord};

/// Failure of the persistence layer behind a [`UsageStore`].
#[derive(Debug, thiserror::Error)]
#[error("usage store error: {0}")]
pub struct StoreError(#[source] Box<dyn StdError + Send + Sync + 'static>);

impl StoreError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }
}

/// Keyed cache of completed usage buckets.
///
/// `insert` must behave as an upsert: concurrent writers racing on one key are
/// expected and must leave a single row with the written values.
pub trait UsageStore: Send + Sync {
    /// A miss is `Ok(None)`.
    fn find(&self, key: &UsageKey) -> Result<Option<UsageRecord>, StoreError>;

    fn insert(&self, record: &UsageRecord) -> Result<(), StoreError>;

    /// Every record, newest window first.
    fn list_all(&self) -> Result<Vec<UsageRecord>, StoreError>;

    /// Removes every record and returns how many were deleted.
    fn clear_all(&self) -> Result<usize, StoreError>;
}

impl<T: UsageStore + ?Sized> UsageStore for Arc<T> {
    fn find(&self, key: &UsageKey) -> Result<Option<UsageRecord>, StoreError> {
        (**self).find(key)
    }

    fn insert(&self, record: &UsageRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn list_all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        (**self).list_all()
    }

    fn clear_all(&self) -> Result<usize, StoreError> {
        (**self).clear_all()
    }
}

impl<T: UsageStore + ?Sized> UsageStore for &T {
    fn find(&self, key: &UsageKey) -> Result<Option<UsageRecord>, StoreError> {
        (**self).find(key)
    }

    fn insert(&self, record: &UsageRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn list_all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        (**self).list_all()
    }

    fn clear_all(&self) -> Result<usize, StoreError> {
        (**self).clear_all()
    }
}
