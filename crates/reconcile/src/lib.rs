mod backfill;
mod cancel;
mod engine;
mod types;

pub use cancel::CancelToken;
pub use engine::UsageReconciler;
pub use types::{
    BackfillIssue, BackfillReport, IssueKind, Lookup, LookupOrigin, ReconcileError, Result,
};
