use tracing::info;

use crate::core::ids::IdKind;
use crate::domain::{
    Amount, Loan, LoanAction, LoanTerms, Member, SavingsTransaction, TransactionType,
};
use crate::errors::{KoperasiError, KoperasiResult};

use super::{AmortizationService, BusinessEvent, Posting, PostingContext, RepaymentSplit};

/// Lifecycle transitions on a loan whose lock the caller holds. Every
/// transition is checked before any ledger posting, so an illegal action
/// leaves both the loan and the ledger untouched.
pub struct LoanService;

impl LoanService {
    pub fn apply(
        ctx: &PostingContext<'_>,
        member: &Member,
        terms: LoanTerms,
    ) -> KoperasiResult<Loan> {
        if !member.is_active() {
            return Err(KoperasiError::invalid(format!(
                "member `{}` is inactive and cannot apply for loans",
                member.id
            )));
        }
        terms.validate()?;
        let loan = Loan::new(ctx.next_id(IdKind::Loan), &member.id, terms, ctx.today());
        info!(
            loan_id = %loan.id,
            member_id = %member.id,
            principal = loan.principal,
            "loan application received"
        );
        Ok(loan)
    }

    pub fn approve(ctx: &PostingContext<'_>, loan: &mut Loan) -> KoperasiResult<()> {
        loan.check(LoanAction::Approve)?;
        let installment = AmortizationService::monthly_installment(&loan.terms())?;
        loan.approve(ctx.today(), installment)?;
        info!(loan_id = %loan.id, installment, "loan approved");
        Ok(())
    }

    pub fn reject(loan: &mut Loan) -> KoperasiResult<()> {
        loan.reject()?;
        info!(loan_id = %loan.id, "loan rejected");
        Ok(())
    }

    pub fn disburse(ctx: &PostingContext<'_>, loan: &mut Loan) -> KoperasiResult<Posting> {
        loan.check(LoanAction::Disburse)?;
        let description = format!("Pencairan Pinjaman {}", loan.id);
        let event = BusinessEvent::LoanDisbursement {
            loan_id: loan.id.clone(),
            principal: loan.principal,
        };
        let entry = ctx.post(&event, &description)?;
        loan.activate(ctx.today())?;
        let transaction = Self::record(
            ctx,
            loan,
            TransactionType::LoanDisbursement,
            loan.principal,
            description,
            &entry.id,
        );
        info!(loan_id = %loan.id, entry_id = %entry.id, "loan disbursed");
        Ok(Posting { entry, transaction })
    }

    pub fn repay(
        ctx: &PostingContext<'_>,
        loan: &mut Loan,
        amount: Amount,
    ) -> KoperasiResult<(RepaymentSplit, Posting)> {
        loan.check(LoanAction::Repay)?;
        let split = AmortizationService::split_repayment(loan, amount)?;
        let description = format!("Angsuran Pinjaman {}", loan.id);
        let event = BusinessEvent::LoanRepayment {
            loan_id: loan.id.clone(),
            principal: split.principal,
            interest: split.interest,
        };
        let entry = ctx.post(&event, &description)?;
        AmortizationService::apply_split(loan, split, ctx.today())?;
        let transaction = Self::record(
            ctx,
            loan,
            TransactionType::LoanRepayment,
            amount,
            description,
            &entry.id,
        );
        info!(
            loan_id = %loan.id,
            principal = split.principal,
            interest = split.interest,
            remaining = loan.remaining_balance,
            status = ?loan.status,
            "loan repayment posted"
        );
        Ok((split, Posting { entry, transaction }))
    }

    fn record(
        ctx: &PostingContext<'_>,
        loan: &Loan,
        transaction_type: TransactionType,
        amount: Amount,
        description: String,
        journal_entry_id: &str,
    ) -> SavingsTransaction {
        SavingsTransaction {
            id: ctx.next_id(IdKind::SavingsTransaction),
            member_id: loan.member_id.clone(),
            transaction_type,
            amount,
            date: ctx.today(),
            description,
            journal_entry_id: journal_entry_id.to_string(),
            savings_kind: None,
            loan_id: Some(loan.id.clone()),
        }
    }
}
