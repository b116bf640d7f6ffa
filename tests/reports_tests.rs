mod common;

use common::{koperasi, register};
use koperasi_core::{
    domain::{AccountType, SavingsKind},
    ledger::chart::{KAS_BANK, PIUTANG_PINJAMAN},
};
use rust_decimal_macros::dec;

fn busy_koperasi() -> koperasi_core::Koperasi {
    let (koperasi, _clock) = koperasi();
    let budi = register(&koperasi, "Budi Santoso");
    let siti = register(&koperasi, "Siti Aminah");
    koperasi
        .deposit_kind(&siti.id, SavingsKind::Pokok, 10_000_000, "Simpanan Pokok")
        .unwrap();
    koperasi
        .deposit_kind(&siti.id, SavingsKind::Wajib, 2_500_000, "Simpanan Wajib")
        .unwrap();
    koperasi.deposit(&budi.id, 1_500_000, "Simpanan Sukarela").unwrap();
    let loan = koperasi.apply_loan(&budi.id, 6_000_000, dec!(12), 6).unwrap();
    koperasi.decide_loan(&loan.id, true).unwrap();
    koperasi.disburse_loan(&loan.id).unwrap();
    // Installment 1_060_000: 60_000 interest, 1_000_000 principal.
    koperasi.record_repayment(&loan.id, 1_060_000).unwrap();
    koperasi.record_expense(200_000, "Sewa kantor").unwrap();
    koperasi.apply_loan(&siti.id, 1_000_000, dec!(10), 12).unwrap();
    koperasi
}

#[test]
fn trial_balance_lists_every_account_on_its_normal_side() {
    let koperasi = busy_koperasi();
    let trial = koperasi.trial_balance();
    assert_eq!(trial.lines.len(), 7);
    assert!(trial.is_balanced());
    let cash = trial.lines.iter().find(|line| line.code == KAS_BANK).unwrap();
    // 14_000_000 in, 6_000_000 out, 1_060_000 in, 200_000 out.
    assert_eq!((cash.debit, cash.credit), (8_860_000, 0));
    let revenue = trial
        .lines
        .iter()
        .find(|line| line.account_type == AccountType::Revenue)
        .unwrap();
    assert_eq!((revenue.debit, revenue.credit), (0, 60_000));
    assert_eq!(koperasi.balances().get(PIUTANG_PINJAMAN), Some(&5_000_000));
}

#[test]
fn statements_reconcile() {
    let koperasi = busy_koperasi();
    let income = koperasi.income_statement();
    assert_eq!(income.total_revenue, 60_000);
    assert_eq!(income.total_expense, 200_000);
    assert_eq!(income.net_income, -140_000);

    let sheet = koperasi.balance_sheet();
    assert_eq!(sheet.total_assets, 13_860_000);
    assert_eq!(sheet.total_liabilities, 1_500_000);
    assert_eq!(sheet.total_equity, 12_500_000);
    assert_eq!(sheet.current_earnings, -140_000);
    assert!(sheet.is_balanced());
}

#[test]
fn dashboard_summarizes_members_and_loans() {
    let koperasi = busy_koperasi();
    let summary = koperasi.dashboard_summary();
    assert_eq!(summary.member_count, 2);
    assert_eq!(summary.active_member_count, 2);
    assert_eq!(summary.total_member_savings, 14_000_000);
    assert_eq!(summary.active_loan_count, 1);
    assert_eq!(summary.pending_loan_count, 1);
    assert_eq!(summary.outstanding_loan_principal, 5_000_000);
    assert_eq!(summary.cash_balance, 8_860_000);
    assert_eq!(summary.total_assets, 13_860_000);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["outstanding_loan_principal"], 5_000_000);
}
