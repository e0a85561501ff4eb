use netmeter_core::Transport;
use reconcile::{BackfillReport, CancelToken};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::services::{SharedConfig, SharedSource, open_engine};

/// Outcome of a bootstrap pass over the configured transports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapSummary {
    pub reports: Vec<BackfillReport>,
    pub skipped: Vec<Transport>,
}

impl BootstrapSummary {
    pub fn records_inserted(&self) -> u64 {
        self.reports.iter().map(|report| report.records_inserted).sum()
    }
}

#[derive(Clone)]
pub struct BootstrapService {
    config: SharedConfig,
    source: SharedSource,
}

impl BootstrapService {
    pub(super) fn new(config: SharedConfig, source: SharedSource) -> Self {
        Self { config, source }
    }

    /// Backfills each configured transport that has not been bootstrapped yet.
    ///
    /// The flag is only set after a complete run, so an interrupted or failed
    /// bootstrap resumes on the next start; already-cached windows are skipped.
    pub fn run_if_needed(&self, cancel: &CancelToken) -> Result<BootstrapSummary> {
        let engine = open_engine(&self.config, &self.source)?;
        let mut summary = BootstrapSummary::default();
        for transport in &self.config.tracker.bootstrap_transports {
            let transport = *transport;
            if engine.store().lock()?.is_bootstrapped(transport)? {
                summary.skipped.push(transport);
                continue;
            }
            let report = engine.backfill_all(transport, cancel);
            if report.is_complete() {
                engine.store().lock()?.set_bootstrapped(transport, true)?;
                info!(%transport, inserted = report.records_inserted, "bootstrap complete");
            } else {
                warn!(
                    %transport,
                    cancelled = report.cancelled,
                    issues = report.issues.len(),
                    "bootstrap incomplete; will retry on next start"
                );
            }
            let cancelled = report.cancelled;
            summary.reports.push(report);
            if cancelled {
                break;
            }
        }
        Ok(summary)
    }
}
