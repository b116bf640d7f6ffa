mod common;

use std::thread;

use common::{equation_residual, koperasi, register};
use koperasi_core::{domain::LoanStatus, KoperasiError};
use rust_decimal_macros::dec;

#[test]
fn concurrent_repayments_cannot_jointly_overpay() {
    for _ in 0..20 {
        let (koperasi, _clock) = koperasi();
        let member = register(&koperasi, "Siti Aminah");
        let loan = koperasi
            .apply_loan(&member.id, 1_000_000, dec!(12), 2)
            .unwrap();
        koperasi.decide_loan(&loan.id, true).unwrap();
        koperasi.disburse_loan(&loan.id).unwrap();

        // Each payment fits on its own (payable 1_010_000); together they overpay.
        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| koperasi.record_repayment(&loan.id, 800_000)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("repayment thread"))
                .collect()
        });

        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(succeeded, 1);
        let failure = results
            .iter()
            .find_map(|result| result.as_ref().err())
            .expect("one repayment fails");
        // After 800_000 (10_000 interest, 790_000 principal) only 212_100 is payable.
        assert_eq!(
            failure,
            &KoperasiError::Overpayment {
                loan_id: loan.id.clone(),
                requested: 800_000,
                payable: 212_100,
            }
        );
        let loan = koperasi.loan(&loan.id).unwrap();
        assert_eq!(loan.remaining_balance, 210_000);
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(koperasi.journal().len(), 2);
    }
}

#[test]
fn parallel_deposits_on_different_members_stay_consistent() {
    let (koperasi, _clock) = koperasi();
    let members: Vec<_> = (0..4)
        .map(|idx| register(&koperasi, &format!("Anggota {idx}")))
        .collect();

    thread::scope(|scope| {
        for member in &members {
            let koperasi = &koperasi;
            scope.spawn(move || {
                for _ in 0..50 {
                    koperasi.deposit(&member.id, 1_000, "Setoran").unwrap();
                    koperasi.record_expense(10, "Biaya admin").unwrap();
                }
            });
        }
    });

    for member in &members {
        assert_eq!(koperasi.member(&member.id).unwrap().balance, 50_000);
    }
    let summary = koperasi.dashboard_summary();
    assert_eq!(summary.total_member_savings, 200_000);
    assert_eq!(summary.cash_balance, 200_000 - 2_000);
    assert_eq!(koperasi.journal().len(), 400);
    assert_eq!(koperasi.transactions().len(), 200);
    assert_eq!(equation_residual(&koperasi), 0);
    koperasi.ledger().verify_against_journal().unwrap();
}
