mod common;

use common::{koperasi, register};
use koperasi_core::{
    domain::{MemberStatus, SavingsKind, TransactionType},
    ledger::chart::{KAS_BANK, SIMPANAN_POKOK, SIMPANAN_SUKARELA, SIMPANAN_WAJIB},
    KoperasiError,
};
use rust_decimal_macros::dec;

#[test]
fn savings_kinds_post_to_their_accounts() {
    let (koperasi, _clock) = koperasi();
    let member = register(&koperasi, "Budi Santoso");
    koperasi
        .deposit_kind(&member.id, SavingsKind::Pokok, 100_000, "Simpanan Pokok")
        .unwrap();
    koperasi
        .deposit_kind(&member.id, SavingsKind::Wajib, 50_000, "Simpanan Wajib")
        .unwrap();
    let receipt = koperasi.deposit(&member.id, 25_000, "Simpanan Sukarela").unwrap();

    assert_eq!(receipt.member.balance, 175_000);
    assert_eq!(receipt.transaction.savings_kind, Some(SavingsKind::Sukarela));
    assert_eq!(receipt.transaction.journal_entry_id, receipt.entry.id);
    assert_eq!(koperasi.account(SIMPANAN_POKOK).unwrap().balance, 100_000);
    assert_eq!(koperasi.account(SIMPANAN_WAJIB).unwrap().balance, 50_000);
    assert_eq!(koperasi.account(SIMPANAN_SUKARELA).unwrap().balance, 25_000);
    assert_eq!(koperasi.account(KAS_BANK).unwrap().balance, 175_000);
}

#[test]
fn withdrawal_above_balance_is_refused() {
    let (koperasi, _clock) = koperasi();
    let member = register(&koperasi, "Budi Santoso");
    koperasi.deposit(&member.id, 300_000, "Setoran").unwrap();

    let err = koperasi.withdraw(&member.id, 300_001, "Tarik").unwrap_err();
    assert_eq!(
        err,
        KoperasiError::InsufficientFunds {
            member_id: member.id.clone(),
            requested: 300_001,
            available: 300_000,
        }
    );
    assert_eq!(koperasi.member(&member.id).unwrap().balance, 300_000);

    let receipt = koperasi.withdraw(&member.id, 300_000, "Tarik").unwrap();
    assert_eq!(receipt.member.balance, 0);
    assert_eq!(receipt.transaction.transaction_type, TransactionType::Withdrawal);
    assert_eq!(koperasi.account(KAS_BANK).unwrap().balance, 0);
}

#[test]
fn locked_in_savings_are_not_withdrawable() {
    let (koperasi, _clock) = koperasi();
    let member = register(&koperasi, "Siti Aminah");
    koperasi
        .deposit_kind(&member.id, SavingsKind::Pokok, 1_000_000, "Simpanan Pokok")
        .unwrap();
    assert!(matches!(
        koperasi.withdraw(&member.id, 1, "Tarik"),
        Err(KoperasiError::InsufficientFunds { available: 0, .. })
    ));
}

#[test]
fn inactive_members_cannot_deposit_but_may_withdraw() {
    let (koperasi, _clock) = koperasi();
    let member = register(&koperasi, "Budi Santoso");
    koperasi.deposit(&member.id, 80_000, "Setoran").unwrap();
    let updated = koperasi
        .set_member_status(&member.id, MemberStatus::Inactive)
        .unwrap();
    assert!(!updated.is_active());

    assert!(matches!(
        koperasi.deposit(&member.id, 10_000, "Setoran"),
        Err(KoperasiError::InvalidEvent(_))
    ));
    koperasi.withdraw(&member.id, 80_000, "Tutup rekening").unwrap();
    assert_eq!(koperasi.member(&member.id).unwrap().balance, 0);
}

#[test]
fn history_links_every_record_to_the_journal() {
    let (koperasi, _clock) = koperasi();
    let budi = register(&koperasi, "Budi Santoso");
    let siti = register(&koperasi, "Siti Aminah");
    koperasi.deposit(&budi.id, 1_000_000, "Setoran Awal").unwrap();
    koperasi.deposit(&siti.id, 12_500_000, "Setoran").unwrap();
    let loan = koperasi.apply_loan(&budi.id, 500_000, dec!(12), 5).unwrap();
    koperasi.decide_loan(&loan.id, true).unwrap();
    koperasi.disburse_loan(&loan.id).unwrap();
    koperasi.record_repayment(&loan.id, 105_000).unwrap();

    let history = koperasi.member_transactions(&budi.id).unwrap();
    let kinds: Vec<_> = history.iter().map(|trx| trx.transaction_type).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionType::Deposit,
            TransactionType::LoanDisbursement,
            TransactionType::LoanRepayment
        ]
    );
    assert_eq!(history[2].loan_id.as_deref(), Some(loan.id.as_str()));
    for trx in koperasi.transactions() {
        assert!(koperasi.ledger().entry(&trx.journal_entry_id).is_some());
    }
    assert_eq!(koperasi.member(&budi.id).unwrap().balance, 1_000_000);
    assert!(matches!(
        koperasi.member_transactions("MEM404"),
        Err(KoperasiError::NotFound { .. })
    ));
}
