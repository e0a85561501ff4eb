#![allow(dead_code)]

use std::path::PathBuf;

use netmeter_core::{BucketWindow, ByteCounts, Entity, Transport, UsageRecord};
use netmeter_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn make_record(
    transport: Transport,
    entity: Entity,
    timestamp_ms: i64,
    rx_bytes: u64,
    tx_bytes: u64,
) -> UsageRecord {
    let name = match entity {
        Entity::Device => String::new(),
        Entity::App(uid) => format!("app-{uid}"),
    };
    UsageRecord::new(
        transport,
        entity,
        name,
        BucketWindow::containing(timestamp_ms),
        ByteCounts::new(rx_bytes, tx_bytes),
    )
}
