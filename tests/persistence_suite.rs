mod common;

use std::sync::Arc;

use common::{date, koperasi, register, setup_test_env};
use koperasi_core::{
    config::{Config, IdStyle},
    core::{FixedClock, Koperasi, SNAPSHOT_SCHEMA_VERSION},
    domain::{InterestBasis, LoanStatus},
    storage::{load_snapshot_from_path, save_snapshot_to_path, SnapshotStore},
    KoperasiError,
};
use rust_decimal_macros::dec;

#[test]
fn snapshot_roundtrip_through_store_preserves_state() {
    let (store, config_manager) = setup_test_env();
    let config = config_manager.load().unwrap();
    let (koperasi, _clock) = koperasi();
    let member = register(&koperasi, "Siti Aminah");
    koperasi.deposit(&member.id, 2_000_000, "Setoran").unwrap();
    let loan = koperasi.apply_loan(&member.id, 3_000_000, dec!(12), 3).unwrap();
    koperasi.decide_loan(&loan.id, true).unwrap();
    koperasi.disburse_loan(&loan.id).unwrap();
    koperasi.record_repayment(&loan.id, 1_030_000).unwrap();

    store.save("utama", &koperasi.snapshot()).unwrap();
    let loaded = store.load("utama").unwrap();
    let restored = Koperasi::restore(
        loaded,
        &config,
        Arc::new(FixedClock::on(date(2024, 2, 1))),
    )
    .unwrap();

    assert_eq!(restored.balances(), koperasi.balances());
    assert_eq!(restored.members(), koperasi.members());
    assert_eq!(restored.loans(), koperasi.loans());
    assert_eq!(restored.journal(), koperasi.journal());
    assert_eq!(restored.transactions(), koperasi.transactions());

    // Operations continue where the original stopped.
    let receipt = restored.record_repayment(&loan.id, 1_020_000).unwrap();
    assert_eq!(receipt.entry.id, "JE0004");
    assert_eq!(receipt.loan.status, LoanStatus::Active);
}

#[test]
fn tampered_snapshot_is_rejected() {
    let (_store, config_manager) = setup_test_env();
    let config = config_manager.load().unwrap();
    let (koperasi, _clock) = koperasi();
    let member = register(&koperasi, "Budi Santoso");
    koperasi.deposit(&member.id, 500_000, "Setoran").unwrap();

    let mut snapshot = koperasi.snapshot();
    snapshot.accounts[0].balance += 1;
    let err = Koperasi::restore(
        snapshot,
        &config,
        Arc::new(FixedClock::on(date(2024, 2, 1))),
    )
    .err()
    .expect("tampered balances must fail");
    assert!(matches!(err, KoperasiError::Storage(_)));
}

#[test]
fn newer_schema_versions_are_refused() {
    let (store, _config) = setup_test_env();
    let (koperasi, _clock) = koperasi();
    let mut snapshot = koperasi.snapshot();
    snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;
    let path = store.snapshot_path("masa_depan");
    save_snapshot_to_path(&snapshot, &path).unwrap();

    assert!(matches!(
        load_snapshot_from_path(&path),
        Err(KoperasiError::Storage(_))
    ));
    assert!(store.load("masa_depan").is_err());
}

#[test]
fn config_drives_ids_and_interest_basis() {
    let (_store, config_manager) = setup_test_env();
    let mut config = Config::default();
    config.id_style = IdStyle::Uuid;
    config.interest_basis = InterestBasis::OriginalPrincipal;
    config_manager.save(&config).unwrap();

    let loaded = config_manager.load().unwrap();
    let koperasi = Koperasi::from_config(
        &loaded,
        Arc::new(FixedClock::on(date(2024, 3, 1))),
    )
    .unwrap();
    let member = register(&koperasi, "Budi Santoso");
    assert!(member.id.starts_with("MEM-"));

    let loan = koperasi.apply_loan(&member.id, 12_000_000, dec!(12), 12).unwrap();
    assert_eq!(loan.interest_basis, InterestBasis::OriginalPrincipal);
    koperasi.decide_loan(&loan.id, true).unwrap();
    let schedule = koperasi.loan_schedule(&loan.id).unwrap();
    assert_eq!(schedule.len(), 12);
    assert!(schedule.iter().all(|row| row.interest == 120_000));
}

#[test]
fn posting_rules_must_exist_in_chart() {
    let mut config = Config::default();
    config.posting.interest_income = "499".into();
    let result = Koperasi::from_config(&config, Arc::new(FixedClock::on(date(2024, 3, 1))));
    assert!(matches!(result.err(), Some(KoperasiError::Config(_))));
}
