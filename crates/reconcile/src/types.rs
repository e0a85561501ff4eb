use netmeter_core::{SourceError, StoreError, Transport, UsageRecord};
use serde::Serialize;

/// Where the record returned by a lookup came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOrigin {
    /// Completed window served from the store.
    Cache,
    /// Completed window computed from the source and persisted.
    Source,
    /// Window still in progress (or in the future); computed and not persisted.
    InProgress,
    /// The source failed; zero bytes were reported and nothing was persisted.
    Degraded(SourceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub record: UsageRecord,
    pub origin: LookupOrigin,
}

impl Lookup {
    pub fn is_cached(&self) -> bool {
        matches!(self.origin, LookupOrigin::Cache)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// App enumeration failed, nothing could be walked.
    Source,
    /// A store lookup or insert failed; the entity's walk stopped there.
    Store,
}

/// Non-fatal problem recorded during a backfill run.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillIssue {
    pub uid: Option<u32>,
    pub window_start: Option<i64>,
    pub kind: IssueKind,
    pub message: String,
}

/// Summary returned after a backfill run.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillReport {
    pub transport: Transport,
    pub entities: usize,
    pub windows_visited: u64,
    pub windows_cached: u64,
    pub records_inserted: u64,
    pub empty_windows: u64,
    pub source_failures: u64,
    pub cancelled: bool,
    pub issues: Vec<BackfillIssue>,
}

impl BackfillReport {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            entities: 0,
            windows_visited: 0,
            windows_cached: 0,
            records_inserted: 0,
            empty_windows: 0,
            source_failures: 0,
            cancelled: false,
            issues: Vec::new(),
        }
    }

    /// The run reached every app's floor: not cancelled, no enumeration or store failure.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.issues.is_empty()
    }

    pub(crate) fn merge(&mut self, other: BackfillReport) {
        self.entities += other.entities;
        self.windows_visited += other.windows_visited;
        self.windows_cached += other.windows_cached;
        self.records_inserted += other.records_inserted;
        self.empty_windows += other.empty_windows;
        self.source_failures += other.source_failures;
        self.cancelled |= other.cancelled;
        self.issues.extend(other.issues);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
