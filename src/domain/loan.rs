use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::common::*;
use crate::errors::{KoperasiError, KoperasiResult};

/// Highest annual interest rate, in percent, a loan may carry.
pub const MAX_INTEREST_RATE: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    PaidOff,
}

/// Operations that move a loan through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Approve,
    Reject,
    Disburse,
    Repay,
    Settle,
}

impl LoanAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
            LoanAction::Disburse => "disburse",
            LoanAction::Repay => "repay",
            LoanAction::Settle => "settle",
        }
    }
}

impl LoanStatus {
    /// Transition table; `None` marks an illegal action for the current state.
    pub fn next(self, action: LoanAction) -> Option<LoanStatus> {
        match (self, action) {
            (LoanStatus::Pending, LoanAction::Approve) => Some(LoanStatus::Approved),
            (LoanStatus::Pending, LoanAction::Reject) => Some(LoanStatus::Rejected),
            (LoanStatus::Approved, LoanAction::Disburse) => Some(LoanStatus::Active),
            (LoanStatus::Active, LoanAction::Repay) => Some(LoanStatus::Active),
            (LoanStatus::Active, LoanAction::Settle) => Some(LoanStatus::PaidOff),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::PaidOff)
    }

    /// Loans in these states still tie up the member.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            LoanStatus::Pending | LoanStatus::Approved | LoanStatus::Active
        )
    }
}

/// Balance on which a period's interest is charged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterestBasis {
    /// Interest on the balance still outstanding when the payment arrives.
    #[default]
    RemainingBalance,
    /// Classic flat rate: interest on the original principal every period.
    OriginalPrincipal,
}

/// A member's loan together with its amortization state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Loan {
    pub id: String,
    pub member_id: String,
    pub principal: Amount,
    /// Annual percentage, e.g. `12` for 12 % a year.
    pub interest_rate: Decimal,
    pub tenure_months: u32,
    #[serde(default)]
    pub interest_basis: InterestBasis,
    pub status: LoanStatus,
    pub applied_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_off_date: Option<NaiveDate>,
    pub monthly_installment: Amount,
    pub remaining_balance: Amount,
    #[serde(default)]
    pub total_interest_paid: Amount,
}

impl Loan {
    pub fn new(
        id: impl Into<String>,
        member_id: impl Into<String>,
        terms: LoanTerms,
        applied_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            member_id: member_id.into(),
            principal: terms.principal,
            interest_rate: terms.interest_rate,
            tenure_months: terms.tenure_months,
            interest_basis: terms.interest_basis,
            status: LoanStatus::Pending,
            applied_date,
            approved_date: None,
            disbursed_date: None,
            paid_off_date: None,
            monthly_installment: 0,
            remaining_balance: terms.principal,
            total_interest_paid: 0,
        }
    }

    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.principal,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            interest_basis: self.interest_basis,
        }
    }

    /// Checks that `action` is legal from the current state without mutating.
    pub fn check(&self, action: LoanAction) -> KoperasiResult<LoanStatus> {
        self.status
            .next(action)
            .ok_or_else(|| KoperasiError::InvalidTransition {
                loan_id: self.id.clone(),
                from: self.status,
                action: action.as_str(),
            })
    }

    pub(crate) fn approve(&mut self, date: NaiveDate, installment: Amount) -> KoperasiResult<()> {
        self.status = self.check(LoanAction::Approve)?;
        self.approved_date = Some(date);
        self.monthly_installment = installment;
        Ok(())
    }

    pub(crate) fn reject(&mut self) -> KoperasiResult<()> {
        self.status = self.check(LoanAction::Reject)?;
        Ok(())
    }

    pub(crate) fn activate(&mut self, date: NaiveDate) -> KoperasiResult<()> {
        self.status = self.check(LoanAction::Disburse)?;
        self.disbursed_date = Some(date);
        self.remaining_balance = self.principal;
        Ok(())
    }

    pub(crate) fn settle(&mut self, date: NaiveDate) -> KoperasiResult<()> {
        self.status = self.check(LoanAction::Settle)?;
        self.paid_off_date = Some(date);
        Ok(())
    }
}

impl Identifiable for Loan {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The contractual inputs of a loan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanTerms {
    pub principal: Amount,
    pub interest_rate: Decimal,
    pub tenure_months: u32,
    #[serde(default)]
    pub interest_basis: InterestBasis,
}

impl LoanTerms {
    pub fn new(principal: Amount, interest_rate: Decimal, tenure_months: u32) -> Self {
        Self {
            principal,
            interest_rate,
            tenure_months,
            interest_basis: InterestBasis::default(),
        }
    }

    pub fn with_basis(mut self, basis: InterestBasis) -> Self {
        self.interest_basis = basis;
        self
    }

    pub fn validate(&self) -> KoperasiResult<()> {
        if self.principal <= 0 {
            return Err(KoperasiError::invalid("loan principal must be positive"));
        }
        if self.tenure_months == 0 {
            return Err(KoperasiError::invalid("loan tenure must be at least one month"));
        }
        if self.interest_rate.is_sign_negative() {
            return Err(KoperasiError::invalid("interest rate must not be negative"));
        }
        if self.interest_rate > Decimal::from(MAX_INTEREST_RATE) {
            return Err(KoperasiError::invalid(format!(
                "interest rate {}% exceeds {MAX_INTEREST_RATE}% a year",
                self.interest_rate
            )));
        }
        Ok(())
    }
}
