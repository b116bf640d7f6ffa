//! Translates business events into balanced journal entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Amount, EntrySource, JournalEntry, JournalLine, SavingsKind};
use crate::errors::{KoperasiError, KoperasiResult};
use crate::ledger::{chart, Ledger};

/// Account codes each business event posts to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PostingRules {
    pub cash: String,
    pub loan_receivable: String,
    pub interest_income: String,
    pub operating_expense: String,
    pub voluntary_savings: String,
    pub principal_savings: String,
    pub mandatory_savings: String,
}

impl Default for PostingRules {
    fn default() -> Self {
        Self {
            cash: chart::KAS_BANK.into(),
            loan_receivable: chart::PIUTANG_PINJAMAN.into(),
            interest_income: chart::PENDAPATAN_BUNGA.into(),
            operating_expense: chart::BEBAN_OPERASIONAL.into(),
            voluntary_savings: chart::SIMPANAN_SUKARELA.into(),
            principal_savings: chart::SIMPANAN_POKOK.into(),
            mandatory_savings: chart::SIMPANAN_WAJIB.into(),
        }
    }
}

impl PostingRules {
    pub fn savings_account(&self, kind: SavingsKind) -> &str {
        match kind {
            SavingsKind::Pokok => &self.principal_savings,
            SavingsKind::Wajib => &self.mandatory_savings,
            SavingsKind::Sukarela => &self.voluntary_savings,
        }
    }

    fn codes(&self) -> [&str; 7] {
        [
            &self.cash,
            &self.loan_receivable,
            &self.interest_income,
            &self.operating_expense,
            &self.voluntary_savings,
            &self.principal_savings,
            &self.mandatory_savings,
        ]
    }

    /// Every configured code must exist in the ledger's chart, and no two
    /// roles may share an account.
    pub fn ensure_chart_covers(&self, ledger: &Ledger) -> KoperasiResult<()> {
        let codes = self.codes();
        if let Some(code) = codes.iter().find(|code| !ledger.contains_account(code)) {
            return Err(KoperasiError::Config(format!(
                "posting rules reference account `{code}` missing from the chart"
            )));
        }
        for (idx, code) in codes.iter().enumerate() {
            if codes[..idx].contains(code) {
                return Err(KoperasiError::Config(format!(
                    "posting rules use account `{code}` for more than one role"
                )));
            }
        }
        Ok(())
    }
}

/// A financial event the koperasi books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusinessEvent {
    Deposit {
        member_id: String,
        kind: SavingsKind,
        amount: Amount,
    },
    Withdrawal {
        member_id: String,
        kind: SavingsKind,
        amount: Amount,
    },
    LoanDisbursement {
        loan_id: String,
        principal: Amount,
    },
    LoanRepayment {
        loan_id: String,
        principal: Amount,
        interest: Amount,
    },
    OperatingExpense {
        amount: Amount,
    },
}

impl BusinessEvent {
    pub fn source(&self) -> EntrySource {
        match self {
            BusinessEvent::Deposit { .. } => EntrySource::Deposit,
            BusinessEvent::Withdrawal { .. } => EntrySource::Withdrawal,
            BusinessEvent::LoanDisbursement { .. } => EntrySource::LoanDisbursement,
            BusinessEvent::LoanRepayment { .. } => EntrySource::LoanRepayment,
            BusinessEvent::OperatingExpense { .. } => EntrySource::OperatingExpense,
        }
    }
}

/// Lookup the engine uses to check that an event's member or loan exists.
pub trait EntityDirectory {
    fn has_member(&self, member_id: &str) -> bool;
    fn has_loan(&self, loan_id: &str) -> bool;
}

/// Builds and posts journal entries from [`BusinessEvent`]s using fixed [`PostingRules`].
#[derive(Debug, Clone, Default)]
pub struct JournalEngine {
    rules: PostingRules,
}

impl JournalEngine {
    pub fn new(rules: PostingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PostingRules {
        &self.rules
    }

    /// Debit/credit lines for `event`; always balanced.
    pub fn lines_for(&self, event: &BusinessEvent) -> KoperasiResult<Vec<JournalLine>> {
        let rules = &self.rules;
        let lines = match event {
            BusinessEvent::Deposit { kind, amount, .. } => {
                ensure_positive(*amount, "deposit")?;
                vec![
                    JournalLine::debit(&rules.cash, *amount),
                    JournalLine::credit(rules.savings_account(*kind), *amount),
                ]
            }
            BusinessEvent::Withdrawal { kind, amount, .. } => {
                ensure_positive(*amount, "withdrawal")?;
                vec![
                    JournalLine::debit(rules.savings_account(*kind), *amount),
                    JournalLine::credit(&rules.cash, *amount),
                ]
            }
            BusinessEvent::LoanDisbursement { principal, .. } => {
                ensure_positive(*principal, "disbursement")?;
                vec![
                    JournalLine::debit(&rules.loan_receivable, *principal),
                    JournalLine::credit(&rules.cash, *principal),
                ]
            }
            BusinessEvent::LoanRepayment {
                principal,
                interest,
                ..
            } => {
                if *principal < 0 || *interest < 0 {
                    return Err(KoperasiError::invalid(
                        "repayment portions must not be negative",
                    ));
                }
                let total = principal
                    .checked_add(*interest)
                    .ok_or_else(|| KoperasiError::invalid("repayment amount overflow"))?;
                ensure_positive(total, "repayment")?;
                let mut lines = vec![JournalLine::debit(&rules.cash, total)];
                if *principal > 0 {
                    lines.push(JournalLine::credit(&rules.loan_receivable, *principal));
                }
                if *interest > 0 {
                    lines.push(JournalLine::credit(&rules.interest_income, *interest));
                }
                lines
            }
            BusinessEvent::OperatingExpense { amount } => {
                ensure_positive(*amount, "expense")?;
                vec![
                    JournalLine::debit(&rules.operating_expense, *amount),
                    JournalLine::credit(&rules.cash, *amount),
                ]
            }
        };
        Ok(lines)
    }

    /// Checks that the event's member or loan exists and returns its lines.
    pub fn prepare(
        &self,
        event: &BusinessEvent,
        directory: &dyn EntityDirectory,
    ) -> KoperasiResult<Vec<JournalLine>> {
        match event {
            BusinessEvent::Deposit { member_id, .. } | BusinessEvent::Withdrawal { member_id, .. } => {
                if !directory.has_member(member_id) {
                    return Err(KoperasiError::invalid(format!(
                        "member `{member_id}` not found"
                    )));
                }
            }
            BusinessEvent::LoanDisbursement { loan_id, .. }
            | BusinessEvent::LoanRepayment { loan_id, .. } => {
                if !directory.has_loan(loan_id) {
                    return Err(KoperasiError::invalid(format!("loan `{loan_id}` not found")));
                }
            }
            BusinessEvent::OperatingExpense { .. } => {}
        }
        self.lines_for(event)
    }

    pub fn build_entry(
        &self,
        event: &BusinessEvent,
        directory: &dyn EntityDirectory,
        id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> KoperasiResult<JournalEntry> {
        let lines = self.prepare(event, directory)?;
        Ok(JournalEntry::new(id, date, description, event.source(), lines))
    }

    /// Posts `event` to `ledger`. `next_id` is only called once the entry
    /// is certain to post.
    pub fn record(
        &self,
        ledger: &Ledger,
        directory: &dyn EntityDirectory,
        event: &BusinessEvent,
        next_id: impl FnOnce() -> String,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> KoperasiResult<JournalEntry> {
        let entry = self.build_entry(event, directory, String::new(), date, description)?;
        let posted = ledger.post_entry(entry, next_id)?;
        info!(
            entry_id = %posted.id,
            source = ?posted.source,
            amount = posted.total_debit(),
            "business event booked"
        );
        Ok(posted)
    }
}

fn ensure_positive(amount: Amount, what: &str) -> KoperasiResult<()> {
    if amount <= 0 {
        return Err(KoperasiError::invalid(format!(
            "{what} amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
