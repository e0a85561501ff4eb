use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{BucketWindow, ByteCounts, Transport};

/// Failures reported by an OS usage-statistics adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("usage service unavailable: {0}")]
    Unavailable(String),
    #[error("app {0} not found")]
    UnknownApp(u32),
}

/// Byte counters and installed-app metadata from the operating system.
pub trait UsageSource: Send + Sync {
    fn device_usage(
        &self,
        transport: Transport,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError>;

    fn app_usage(
        &self,
        transport: Transport,
        uid: u32,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError>;

    /// Point-in-time snapshot of installed apps, uid to display name.
    fn entities(&self) -> Result<BTreeMap<u32, String>, SourceError>;

    /// First install time in milliseconds, `None` when the platform does not know.
    fn install_timestamp(&self, uid: u32) -> Result<Option<i64>, SourceError>;
}

impl<T: UsageSource + ?Sized> UsageSource for Arc<T> {
    fn device_usage(
        &self,
        transport: Transport,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError> {
        (**self).device_usage(transport, window)
    }

    fn app_usage(
        &self,
        transport: Transport,
        uid: u32,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError> {
        (**self).app_usage(transport, uid, window)
    }

    fn entities(&self) -> Result<BTreeMap<u32, String>, SourceError> {
        (**self).entities()
    }

    fn install_timestamp(&self, uid: u32) -> Result<Option<i64>, SourceError> {
        (**self).install_timestamp(uid)
    }
}

impl<T: UsageSource + ?Sized> UsageSource for &T {
    fn device_usage(
        &self,
        transport: Transport,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError> {
        (**self).device_usage(transport, window)
    }

    fn app_usage(
        &self,
        transport: Transport,
        uid: u32,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError> {
        (**self).app_usage(transport, uid, window)
    }

    fn entities(&self) -> Result<BTreeMap<u32, String>, SourceError> {
        (**self).entities()
    }

    fn install_timestamp(&self, uid: u32) -> Result<Option<i64>, SourceError> {
        (**self).install_timestamp(uid)
    }
}

/// Source for hosts without access to OS statistics; every query is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl UsageSource for OfflineSource {
    fn device_usage(&self, _: Transport, _: BucketWindow) -> Result<ByteCounts, SourceError> {
        Err(SourceError::Unavailable("offline".to_string()))
    }

    fn app_usage(&self, _: Transport, _: u32, _: BucketWindow) -> Result<ByteCounts, SourceError> {
        Err(SourceError::Unavailable("offline".to_string()))
    }

    fn entities(&self) -> Result<BTreeMap<u32, String>, SourceError> {
        Err(SourceError::Unavailable("offline".to_string()))
    }

    fn install_timestamp(&self, _: u32) -> Result<Option<i64>, SourceError> {
        Err(SourceError::Unavailable("offline".to_string()))
    }
}
