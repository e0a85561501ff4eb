#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use netmeter_core::{
    BucketWindow, ByteCounts, Entity, SourceError, StoreError, Transport, UsageKey, UsageRecord,
    UsageSource, UsageStore,
};

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const BUCKET_MS: i64 = 3 * HOUR_MS;

type UsageFn = dyn Fn(Transport, Entity, BucketWindow) -> ByteCounts + Send + Sync;

/// Scripted usage source that counts every query it serves.
pub struct FakeSource {
    apps: Mutex<BTreeMap<u32, String>>,
    installs: HashMap<u32, i64>,
    usage: Box<UsageFn>,
    failing_windows: Mutex<Vec<(u32, i64)>>,
    failing_uids: Mutex<Vec<u32>>,
    enumeration_fails: AtomicBool,
    device_fails: AtomicBool,
    usage_calls: AtomicUsize,
    queried: Mutex<Vec<(Transport, Entity, BucketWindow)>>,
}

impl FakeSource {
    pub fn new(
        usage: impl Fn(Transport, Entity, BucketWindow) -> ByteCounts + Send + Sync + 'static,
    ) -> Self {
        Self {
            apps: Mutex::new(BTreeMap::new()),
            installs: HashMap::new(),
            usage: Box::new(usage),
            failing_windows: Mutex::new(Vec::new()),
            failing_uids: Mutex::new(Vec::new()),
            enumeration_fails: AtomicBool::new(false),
            device_fails: AtomicBool::new(false),
            usage_calls: AtomicUsize::new(0),
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Every window reports the same counts.
    pub fn constant(rx_bytes: u64, tx_bytes: u64) -> Self {
        Self::new(move |_, _, _| ByteCounts::new(rx_bytes, tx_bytes))
    }

    pub fn with_app(mut self, uid: u32, name: &str, installed_at: Option<i64>) -> Self {
        self.apps
            .get_mut()
            .expect("apps lock")
            .insert(uid, name.to_string());
        if let Some(ts) = installed_at {
            self.installs.insert(uid, ts);
        }
        self
    }

    pub fn uninstall(&self, uid: u32) {
        self.apps.lock().expect("apps lock").remove(&uid);
    }

    pub fn fail_window(&self, uid: u32, window_start: i64) {
        self.failing_windows
            .lock()
            .expect("failing lock")
            .push((uid, window_start));
    }

    pub fn fail_app(&self, uid: u32) {
        self.failing_uids.lock().expect("failing lock").push(uid);
    }

    pub fn fail_enumeration(&self) {
        self.enumeration_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_device(&self) {
        self.device_fails.store(true, Ordering::SeqCst);
    }

    pub fn usage_calls(&self) -> usize {
        self.usage_calls.load(Ordering::SeqCst)
    }

    pub fn queried_windows(&self, uid: u32) -> Vec<BucketWindow> {
        self.queried
            .lock()
            .expect("queried lock")
            .iter()
            .filter(|(_, entity, _)| *entity == Entity::App(uid))
            .map(|(_, _, window)| *window)
            .collect()
    }

    fn record_query(&self, transport: Transport, entity: Entity, window: BucketWindow) {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        self.queried
            .lock()
            .expect("queried lock")
            .push((transport, entity, window));
    }
}

impl UsageSource for FakeSource {
    fn device_usage(
        &self,
        transport: Transport,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError> {
        self.record_query(transport, Entity::Device, window);
        if self.device_fails.load(Ordering::SeqCst) {
            return Err(SourceError::PermissionDenied("READ_PHONE_STATE".to_string()));
        }
        Ok((self.usage)(transport, Entity::Device, window))
    }

    fn app_usage(
        &self,
        transport: Transport,
        uid: u32,
        window: BucketWindow,
    ) -> Result<ByteCounts, SourceError> {
        self.record_query(transport, Entity::App(uid), window);
        if self.failing_uids.lock().expect("failing lock").contains(&uid)
            || self
                .failing_windows
                .lock()
                .expect("failing lock")
                .contains(&(uid, window.start))
        {
            return Err(SourceError::Unavailable("stats service down".to_string()));
        }
        Ok((self.usage)(transport, Entity::App(uid), window))
    }

    fn entities(&self) -> Result<BTreeMap<u32, String>, SourceError> {
        if self.enumeration_fails.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("package manager".to_string()));
        }
        Ok(self.apps.lock().expect("apps lock").clone())
    }

    fn install_timestamp(&self, uid: u32) -> Result<Option<i64>, SourceError> {
        if !self.apps.lock().expect("apps lock").contains_key(&uid) {
            return Err(SourceError::UnknownApp(uid));
        }
        Ok(self.installs.get(&uid).copied())
    }
}

/// In-memory store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<UsageKey, UsageRecord>>,
    failing_uid: Mutex<Option<u32>>,
    fail_inserts: AtomicBool,
    failing_insert_uid: Mutex<Option<u32>>,
    inserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, record: UsageRecord) {
        self.rows
            .lock()
            .expect("rows lock")
            .insert(record.key(), record);
    }

    pub fn fail_lookups_for(&self, uid: u32) {
        *self.failing_uid.lock().expect("failing lock") = Some(uid);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts_for(&self, uid: u32) {
        *self.failing_insert_uid.lock().expect("failing lock") = Some(uid);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("rows lock").len()
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn records_for(&self, uid: u32) -> Vec<UsageRecord> {
        self.rows
            .lock()
            .expect("rows lock")
            .values()
            .filter(|record| record.entity == Entity::App(uid))
            .cloned()
            .collect()
    }
}

impl UsageStore for MemoryStore {
    fn find(&self, key: &UsageKey) -> Result<Option<UsageRecord>, StoreError> {
        let failing = *self.failing_uid.lock().expect("failing lock");
        if matches!(key.entity, Entity::App(uid) if Some(uid) == failing) {
            return Err(StoreError::new("disk I/O error"));
        }
        Ok(self.rows.lock().expect("rows lock").get(key).cloned())
    }

    fn insert(&self, record: &UsageRecord) -> Result<(), StoreError> {
        let failing = *self.failing_insert_uid.lock().expect("failing lock");
        if self.fail_inserts.load(Ordering::SeqCst)
            || matches!(record.entity, Entity::App(uid) if Some(uid) == failing)
        {
            return Err(StoreError::new("database is locked"));
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .expect("rows lock")
            .insert(record.key(), record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<UsageRecord>, StoreError> {
        let mut records: Vec<UsageRecord> =
            self.rows.lock().expect("rows lock").values().cloned().collect();
        records.sort_by(|a, b| b.window.start.cmp(&a.window.start));
        Ok(records)
    }

    fn clear_all(&self) -> Result<usize, StoreError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let count = rows.len();
        rows.clear();
        Ok(count)
    }
}
