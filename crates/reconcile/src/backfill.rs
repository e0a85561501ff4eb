use std::time::Instant;

use netmeter_core::{
    BucketWindow, Clock, Entity, Transport, UsageKey, UsageRecord, UsageSource, UsageStore,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::engine::UsageReconciler;
use crate::types::{BackfillIssue, BackfillReport, IssueKind};

impl<S, C, K> UsageReconciler<S, C, K>
where
    S: UsageSource,
    C: UsageStore,
    K: Clock,
{
    /// Fills every completed bucket, back to each app's install time, for
    /// every installed app. Safe to re-run: cached buckets are skipped.
    pub fn backfill_all(&self, transport: Transport, cancel: &CancelToken) -> BackfillReport {
        let started = Instant::now();
        let mut report = BackfillReport::new(transport);
        let apps = match self.source.entities() {
            Ok(apps) => apps,
            Err(err) => {
                warn!(%transport, error = %err, "app enumeration failed; nothing to backfill");
                report.issues.push(BackfillIssue {
                    uid: None,
                    window_start: None,
                    kind: IssueKind::Source,
                    message: err.to_string(),
                });
                return report;
            }
        };
        let last_completed_end = self.last_completed_end();

        let walks = if self.parallel {
            apps.par_iter()
                .map(|(uid, name)| {
                    self.walk_app(transport, *uid, name, last_completed_end, cancel)
                })
                .collect::<Vec<_>>()
        } else {
            apps.iter()
                .map(|(uid, name)| {
                    self.walk_app(transport, *uid, name, last_completed_end, cancel)
                })
                .collect::<Vec<_>>()
        };
        for walk in walks {
            report.merge(walk);
        }

        info!(
            %transport,
            apps = report.entities,
            visited = report.windows_visited,
            cached = report.windows_cached,
            inserted = report.records_inserted,
            empty = report.empty_windows,
            source_failures = report.source_failures,
            issues = report.issues.len(),
            cancelled = report.cancelled,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "backfill finished"
        );
        report
    }

    /// Backfill for a single app, e.g. one installed after the initial run.
    pub fn backfill_entity(
        &self,
        transport: Transport,
        uid: u32,
        name: &str,
        cancel: &CancelToken,
    ) -> BackfillReport {
        let last_completed_end = self.last_completed_end();
        let mut report = BackfillReport::new(transport);
        report.merge(self.walk_app(transport, uid, name, last_completed_end, cancel));
        report
    }

    fn last_completed_end(&self) -> i64 {
        BucketWindow::containing(self.clock.now_ms()).start - 1
    }

    /// Walks one app's buckets newest to oldest, stopping below its install time.
    fn walk_app(
        &self,
        transport: Transport,
        uid: u32,
        name: &str,
        last_completed_end: i64,
        cancel: &CancelToken,
    ) -> BackfillReport {
        let mut walk = BackfillReport::new(transport);
        walk.entities = 1;
        let floor = self.install_floor(uid);
        let entity = Entity::App(uid);
        let mut cursor = last_completed_end;

        loop {
            if cancel.is_cancelled() {
                walk.cancelled = true;
                break;
            }
            let window = BucketWindow::containing(cursor);
            if window.end < floor {
                break;
            }
            walk.windows_visited += 1;
            cursor = window.start.saturating_sub(1);

            let key = UsageKey {
                transport,
                entity,
                window,
            };
            match self.store.find(&key) {
                Ok(Some(_)) => {
                    walk.windows_cached += 1;
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    walk.issues.push(store_issue(uid, window, &err));
                    break;
                }
            }

            let counts = match self.source.app_usage(transport, uid, window) {
                Ok(counts) => counts,
                Err(err) => {
                    warn!(
                        %transport,
                        uid,
                        window_start = window.start,
                        error = %err,
                        "usage query failed; skipping window"
                    );
                    walk.source_failures += 1;
                    continue;
                }
            };
            if counts.is_empty() {
                walk.empty_windows += 1;
                continue;
            }
            let record = UsageRecord::new(transport, entity, name, window, counts);
            if let Err(err) = self.store.insert(&record) {
                walk.issues.push(store_issue(uid, window, &err));
                break;
            }
            walk.records_inserted += 1;
        }

        debug!(
            %transport,
            uid,
            floor,
            visited = walk.windows_visited,
            inserted = walk.records_inserted,
            "app backfill walk done"
        );
        walk
    }

    /// Install time to stop at; unknown or unresolvable apps scan back to the epoch.
    fn install_floor(&self, uid: u32) -> i64 {
        match self.source.install_timestamp(uid) {
            Ok(Some(ts)) => ts.max(0),
            Ok(None) => 0,
            Err(err) => {
                debug!(uid, error = %err, "install time unavailable; scanning to epoch");
                0
            }
        }
    }
}

fn store_issue(uid: u32, window: BucketWindow, err: &impl std::fmt::Display) -> BackfillIssue {
    warn!(uid, window_start = window.start, error = %err, "store failure; stopping app walk");
    BackfillIssue {
        uid: Some(uid),
        window_start: Some(window.start),
        kind: IssueKind::Store,
        message: err.to_string(),
    }
}
