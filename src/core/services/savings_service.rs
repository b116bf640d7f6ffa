use tracing::info;

use crate::core::ids::IdKind;
use crate::domain::{Amount, Member, SavingsKind, SavingsTransaction, TransactionType};
use crate::errors::{KoperasiError, KoperasiResult};

use super::{BusinessEvent, Posting, PostingContext};

/// Deposits and withdrawals on a member whose lock the caller holds.
pub struct SavingsService;

impl SavingsService {
    pub fn deposit(
        ctx: &PostingContext<'_>,
        member: &mut Member,
        kind: SavingsKind,
        amount: Amount,
        description: &str,
    ) -> KoperasiResult<Posting> {
        if !member.is_active() {
            return Err(KoperasiError::invalid(format!(
                "member `{}` is inactive and cannot receive deposits",
                member.id
            )));
        }
        if amount <= 0 {
            return Err(KoperasiError::invalid(format!(
                "deposit amount must be positive, got {amount}"
            )));
        }
        let change = member.savings_change(kind, amount)?;
        let event = BusinessEvent::Deposit {
            member_id: member.id.clone(),
            kind,
            amount,
        };
        let entry = ctx.post(&event, description)?;
        member.apply_savings(change);
        let transaction = Self::record(
            ctx,
            member,
            TransactionType::Deposit,
            kind,
            amount,
            description,
            &entry.id,
        );
        info!(member_id = %member.id, ?kind, amount, balance = member.balance, "deposit posted");
        Ok(Posting { entry, transaction })
    }

    /// Withdraws voluntary savings; other kinds are locked in.
    pub fn withdraw(
        ctx: &PostingContext<'_>,
        member: &mut Member,
        amount: Amount,
        description: &str,
    ) -> KoperasiResult<Posting> {
        if amount <= 0 {
            return Err(KoperasiError::invalid(format!(
                "withdrawal amount must be positive, got {amount}"
            )));
        }
        let available = member.withdrawable();
        if amount > available {
            return Err(KoperasiError::InsufficientFunds {
                member_id: member.id.clone(),
                requested: amount,
                available,
            });
        }
        let kind = SavingsKind::WITHDRAWABLE;
        let change = member.savings_change(kind, -amount)?;
        let event = BusinessEvent::Withdrawal {
            member_id: member.id.clone(),
            kind,
            amount,
        };
        let entry = ctx.post(&event, description)?;
        member.apply_savings(change);
        let transaction = Self::record(
            ctx,
            member,
            TransactionType::Withdrawal,
            kind,
            amount,
            description,
            &entry.id,
        );
        info!(member_id = %member.id, amount, balance = member.balance, "withdrawal posted");
        Ok(Posting { entry, transaction })
    }

    fn record(
        ctx: &PostingContext<'_>,
        member: &Member,
        transaction_type: TransactionType,
        kind: SavingsKind,
        amount: Amount,
        description: &str,
        journal_entry_id: &str,
    ) -> SavingsTransaction {
        SavingsTransaction {
            id: ctx.next_id(IdKind::SavingsTransaction),
            member_id: member.id.clone(),
            transaction_type,
            amount,
            date: ctx.today(),
            description: description.to_string(),
            journal_entry_id: journal_entry_id.to_string(),
            savings_kind: Some(kind),
            loan_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::testing::Fixture;
    use crate::domain::{MemberProfile, MemberStatus};
    use crate::ledger::chart::*;
    use chrono::NaiveDate;

    fn member() -> Member {
        Member::new(
            "MEM001",
            MemberProfile::new("Budi Santoso"),
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
        )
    }

    #[test]
    fn deposit_updates_member_and_ledger() {
        let fixture = Fixture::new();
        let mut member = member();
        let posting = SavingsService::deposit(
            &fixture.ctx(),
            &mut member,
            SavingsKind::Pokok,
            100_000,
            "Simpanan Pokok",
        )
        .unwrap();
        assert_eq!(member.balance, 100_000);
        assert_eq!(member.savings.pokok, 100_000);
        assert_eq!(posting.transaction.journal_entry_id, posting.entry.id);
        assert_eq!(posting.transaction.id, "TRX001");
        assert_eq!(fixture.ledger.balance(SIMPANAN_POKOK).unwrap(), 100_000);
        assert_eq!(fixture.ledger.balance(KAS_BANK).unwrap(), 100_000);
    }

    #[test]
    fn withdraw_over_voluntary_balance_fails_without_side_effects() {
        let fixture = Fixture::new();
        let mut member = member();
        let ctx = fixture.ctx();
        SavingsService::deposit(&ctx, &mut member, SavingsKind::Wajib, 500_000, "Wajib").unwrap();
        SavingsService::deposit(&ctx, &mut member, SavingsKind::Sukarela, 200_000, "Sukarela")
            .unwrap();
        let before = member.clone();
        let err = SavingsService::withdraw(&ctx, &mut member, 300_000, "Tarik").unwrap_err();
        assert_eq!(
            err,
            KoperasiError::InsufficientFunds {
                member_id: "MEM001".into(),
                requested: 300_000,
                available: 200_000
            }
        );
        assert_eq!(member, before);
        assert_eq!(fixture.ledger.journal_len(), 2);

        SavingsService::withdraw(&ctx, &mut member, 200_000, "Tarik").unwrap();
        assert_eq!(member.balance, 500_000);
        assert_eq!(fixture.ledger.balance(SIMPANAN_SUKARELA).unwrap(), 0);
    }

    #[test]
    fn inactive_member_cannot_deposit() {
        let fixture = Fixture::new();
        let mut member = member();
        member.status = MemberStatus::Inactive;
        let err = SavingsService::deposit(
            &fixture.ctx(),
            &mut member,
            SavingsKind::Sukarela,
            10_000,
            "Setoran",
        )
        .unwrap_err();
        assert!(matches!(err, KoperasiError::InvalidEvent(_)));
        assert_eq!(fixture.ledger.journal_len(), 0);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let fixture = Fixture::new();
        let mut member = member();
        let ctx = fixture.ctx();
        assert!(matches!(
            SavingsService::deposit(&ctx, &mut member, SavingsKind::Sukarela, 0, "x"),
            Err(KoperasiError::InvalidEvent(_))
        ));
        assert!(matches!(
            SavingsService::withdraw(&ctx, &mut member, -1, "x"),
            Err(KoperasiError::InvalidEvent(_))
        ));
        assert_eq!(member.balance, 0);
    }

    #[test]
    fn savings_overflow_is_rejected_before_posting() {
        let fixture = Fixture::new();
        let mut member = member();
        member.savings.pokok = Amount::MAX;
        member.balance = Amount::MAX;
        let err = SavingsService::deposit(
            &fixture.ctx(),
            &mut member,
            SavingsKind::Sukarela,
            1,
            "Setoran",
        )
        .unwrap_err();
        assert!(matches!(err, KoperasiError::InvalidEvent(_)));
        assert_eq!(member.savings.sukarela, 0);
        assert_eq!(fixture.ledger.journal_len(), 0);
        assert_eq!(fixture.ledger.balance(KAS_BANK).unwrap(), 0);
    }
}
