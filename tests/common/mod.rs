#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use koperasi_core::{
    config::ConfigManager,
    core::{FixedClock, Koperasi, SequentialIds},
    domain::{Member, MemberProfile},
    storage::JsonSnapshotStore,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Fresh koperasi on a manually driven clock starting 2024-01-02.
pub fn koperasi() -> (Koperasi, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::on(date(2024, 1, 2)));
    let koperasi = Koperasi::new(clock.clone(), Arc::new(SequentialIds::new()));
    (koperasi, clock)
}

pub fn register(koperasi: &Koperasi, name: &str) -> Member {
    koperasi
        .register_member(MemberProfile::new(name))
        .expect("register member")
}

/// Creates isolated storage and config managers backed by a unique directory.
pub fn setup_test_env() -> (JsonSnapshotStore, ConfigManager) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let store = JsonSnapshotStore::new(Some(base.clone()), Some(3)).expect("create snapshot store");
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    (store, config_manager)
}

/// Assets − liabilities − equity − (revenue − expense).
pub fn equation_residual(koperasi: &Koperasi) -> i64 {
    let sheet = koperasi.balance_sheet();
    sheet.total_assets - sheet.total_liabilities - sheet.total_equity - sheet.current_earnings
}
