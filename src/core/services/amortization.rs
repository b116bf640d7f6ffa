//! Installment, interest split and schedule arithmetic for member loans.
//!
//! All intermediate values are `Decimal`; results are rounded half away from
//! zero to whole currency units.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::{Amount, InterestBasis, Loan, LoanAction, LoanTerms};
use crate::errors::{KoperasiError, KoperasiResult};

const PERCENT_PER_MONTH_DIVISOR: u32 = 1_200;

/// How one repayment divides between interest and principal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RepaymentSplit {
    pub principal: Amount,
    pub interest: Amount,
}

impl RepaymentSplit {
    pub fn total(&self) -> Amount {
        self.principal + self.interest
    }
}

/// One row of a repayment plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Installment {
    pub period: u32,
    pub payment: Amount,
    pub interest: Amount,
    pub principal: Amount,
    pub remaining_after: Amount,
}

/// Simulator figures for prospective loan terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanQuote {
    pub monthly_interest: Amount,
    pub monthly_principal: Amount,
    pub monthly_installment: Amount,
    pub total_payable: Amount,
}

pub struct AmortizationService;

impl AmortizationService {
    /// `principal / tenure + principal * rate / 100 / 12`, rounded once.
    pub fn monthly_installment(terms: &LoanTerms) -> KoperasiResult<Amount> {
        terms.validate()?;
        let principal = Decimal::from(terms.principal);
        let raw = (principal / Decimal::from(terms.tenure_months))
            .checked_add(monthly_interest_on(principal, terms.interest_rate)?)
            .ok_or_else(|| KoperasiError::invalid("installment overflow"))?;
        to_amount(raw)
    }

    /// Interest charged for the period in which a payment arrives.
    pub fn interest_due(loan: &Loan) -> KoperasiResult<Amount> {
        Self::interest_on(loan, loan.remaining_balance)
    }

    fn interest_on(loan: &Loan, remaining: Amount) -> KoperasiResult<Amount> {
        let basis = match loan.interest_basis {
            InterestBasis::RemainingBalance => remaining,
            InterestBasis::OriginalPrincipal => loan.principal,
        };
        to_amount(monthly_interest_on(Decimal::from(basis), loan.interest_rate)?)
    }

    /// Splits `payment` without touching the loan. Interest is settled first.
    pub fn split_repayment(loan: &Loan, payment: Amount) -> KoperasiResult<RepaymentSplit> {
        if payment <= 0 {
            return Err(KoperasiError::invalid(format!(
                "repayment amount must be positive, got {payment}"
            )));
        }
        let interest_due = Self::interest_due(loan)?;
        let payable = loan
            .remaining_balance
            .checked_add(interest_due)
            .ok_or_else(|| KoperasiError::invalid("payable amount overflow"))?;
        if payment > payable {
            return Err(KoperasiError::Overpayment {
                loan_id: loan.id.clone(),
                requested: payment,
                payable,
            });
        }
        let interest = interest_due.min(payment);
        Ok(RepaymentSplit {
            principal: payment - interest,
            interest,
        })
    }

    /// Books an already computed split onto the loan, settling it at zero.
    pub(crate) fn apply_split(
        loan: &mut Loan,
        split: RepaymentSplit,
        date: NaiveDate,
    ) -> KoperasiResult<()> {
        loan.check(LoanAction::Repay)?;
        let remaining = loan.remaining_balance - split.principal;
        let interest_paid = loan
            .total_interest_paid
            .checked_add(split.interest)
            .ok_or_else(|| KoperasiError::invalid("interest paid overflow"))?;
        loan.remaining_balance = remaining;
        loan.total_interest_paid = interest_paid;
        if loan.remaining_balance == 0 {
            loan.settle(date)?;
        }
        Ok(())
    }

    /// Validates, splits and applies one repayment to an active loan.
    pub fn apply_repayment(
        loan: &mut Loan,
        payment: Amount,
        date: NaiveDate,
    ) -> KoperasiResult<RepaymentSplit> {
        loan.check(LoanAction::Repay)?;
        let split = Self::split_repayment(loan, payment)?;
        Self::apply_split(loan, split, date)?;
        Ok(split)
    }

    /// Plan from the loan's current balance. The final row absorbs rounding
    /// so the balance lands on exactly zero.
    pub fn schedule(loan: &Loan) -> KoperasiResult<Vec<Installment>> {
        let installment = if loan.monthly_installment > 0 {
            loan.monthly_installment
        } else {
            Self::monthly_installment(&loan.terms())?
        };
        let mut rows = Vec::new();
        let mut remaining = loan.remaining_balance;
        let mut period: u32 = 0;
        while remaining > 0 {
            period += 1;
            let interest = Self::interest_on(loan, remaining)?;
            let mut principal = (installment - interest).max(0).min(remaining);
            if period >= loan.tenure_months || principal == 0 {
                principal = remaining;
            }
            remaining -= principal;
            let payment = principal
                .checked_add(interest)
                .ok_or_else(|| KoperasiError::invalid("installment overflow"))?;
            rows.push(Installment {
                period,
                payment,
                interest,
                principal,
                remaining_after: remaining,
            });
        }
        Ok(rows)
    }

    pub fn quote(terms: &LoanTerms) -> KoperasiResult<LoanQuote> {
        let monthly_installment = Self::monthly_installment(terms)?;
        let principal = Decimal::from(terms.principal);
        let monthly_interest = to_amount(monthly_interest_on(principal, terms.interest_rate)?)?;
        let monthly_principal = to_amount(principal / Decimal::from(terms.tenure_months))?;
        let total_payable = monthly_installment
            .checked_mul(Amount::from(terms.tenure_months))
            .ok_or_else(|| KoperasiError::invalid("total payable overflow"))?;
        Ok(LoanQuote {
            monthly_interest,
            monthly_principal,
            monthly_installment,
            total_payable,
        })
    }
}

fn monthly_interest_on(basis: Decimal, annual_rate: Decimal) -> KoperasiResult<Decimal> {
    basis
        .checked_mul(annual_rate)
        .and_then(|value| value.checked_div(Decimal::from(PERCENT_PER_MONTH_DIVISOR)))
        .ok_or_else(|| {
            KoperasiError::invalid(format!("interest on {basis} at {annual_rate}% overflows"))
        })
}

fn to_amount(value: Decimal) -> KoperasiResult<Amount> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| KoperasiError::invalid(format!("amount {value} out of range")))
}
