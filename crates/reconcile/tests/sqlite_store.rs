mod support;

use netmeter_core::{Entity, FixedClock, Transport};
use netmeter_db::SharedDb;
use reconcile::{CancelToken, LookupOrigin, UsageReconciler};
use support::{BUCKET_MS, FakeSource};

#[test]
fn cached_lookup_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("usage.sqlite");
    let source = FakeSource::constant(4_096, 512).with_app(10_001, "Maps", Some(0));

    {
        let store = SharedDb::open(&db_path).expect("open store");
        let engine = UsageReconciler::with_clock(&source, store, FixedClock(10_800_050));
        let lookup = engine
            .get_or_compute(Transport::Wifi, Entity::App(10_001), 10_799_999)
            .expect("first lookup");
        assert_eq!(lookup.origin, LookupOrigin::Source);
    }

    let store = SharedDb::open(&db_path).expect("reopen store");
    let engine = UsageReconciler::with_clock(&source, store, FixedClock(10_800_050));
    let lookup = engine
        .get_or_compute(Transport::Wifi, Entity::App(10_001), 0)
        .expect("cached lookup");
    assert_eq!(lookup.origin, LookupOrigin::Cache);
    assert_eq!(lookup.record.rx_bytes, 4_096);
    assert_eq!(lookup.record.display_name, "Maps");
    assert_eq!(source.usage_calls(), 1);
}

#[test]
fn backfill_into_sqlite_is_idempotent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("usage.sqlite");
    let source = FakeSource::constant(10, 1)
        .with_app(1, "Browser", Some(0))
        .with_app(2, "Music", Some(2 * BUCKET_MS));
    let store = SharedDb::open(&db_path).expect("open store");
    let engine = UsageReconciler::with_clock(&source, store, FixedClock(4 * BUCKET_MS + 1));

    let first = engine.backfill_all(Transport::Cellular, &CancelToken::new());
    let second = engine.backfill_all(Transport::Cellular, &CancelToken::new());

    assert_eq!(first.records_inserted, 6);
    assert_eq!(second.records_inserted, 0);
    assert_eq!(second.windows_cached, 6);
    assert_eq!(source.usage_calls(), 6);

    let history = engine.list_history().expect("history");
    assert_eq!(history.len(), 6);
    assert!(
        history
            .windows(2)
            .all(|pair| pair[0].window.start >= pair[1].window.start)
    );
    let count = engine.store().lock().expect("lock").count_usage().expect("count");
    assert_eq!(count, 6);
}
