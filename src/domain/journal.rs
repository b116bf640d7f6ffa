use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::common::*;

/// One debit or credit line of a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalLine {
    pub account_code: String,
    pub debit: Amount,
    pub credit: Amount,
}

impl JournalLine {
    pub fn debit(account_code: impl Into<String>, amount: Amount) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: 0,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: Amount) -> Self {
        Self {
            account_code: account_code.into(),
            debit: 0,
            credit: amount,
        }
    }

    /// Returns the same line with its sides swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            account_code: self.account_code.clone(),
            debit: self.credit,
            credit: self.debit,
        }
    }

    /// A well-formed line carries exactly one non-zero, non-negative side.
    pub fn is_well_formed(&self) -> bool {
        self.debit >= 0 && self.credit >= 0 && ((self.debit == 0) != (self.credit == 0))
    }
}

/// The business event that produced a journal entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntrySource {
    Deposit,
    Withdrawal,
    LoanDisbursement,
    LoanRepayment,
    OperatingExpense,
    Reversal,
}

impl EntrySource {
    /// Entries linked to a member or loan subledger cannot be reversed on their own.
    pub fn is_subledger_event(self) -> bool {
        matches!(
            self,
            EntrySource::Deposit
                | EntrySource::Withdrawal
                | EntrySource::LoanDisbursement
                | EntrySource::LoanRepayment
        )
    }
}

/// Immutable, balanced double-entry record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub source: EntrySource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverses: Option<String>,
    pub details: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        source: EntrySource,
        details: Vec<JournalLine>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            description: description.into(),
            source,
            reverses: None,
            details,
        }
    }

    pub fn total_debit(&self) -> Amount {
        self.details.iter().map(|line| line.debit).sum()
    }

    pub fn total_credit(&self) -> Amount {
        self.details.iter().map(|line| line.credit).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Builds the entry that cancels this one.
    pub fn reversal(&self, id: impl Into<String>, date: NaiveDate, reason: &str) -> Self {
        Self {
            id: id.into(),
            date,
            description: format!("Reversal of {}: {}", self.id, reason),
            source: EntrySource::Reversal,
            reverses: Some(self.id.clone()),
            details: self.details.iter().map(JournalLine::mirrored).collect(),
        }
    }
}

impl Identifiable for JournalEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn line_shape_rules() {
        assert!(JournalLine::debit("111", 10).is_well_formed());
        assert!(!JournalLine::debit("111", 0).is_well_formed());
        assert!(!JournalLine::credit("111", -5).is_well_formed());
        let both = JournalLine {
            account_code: "111".into(),
            debit: 3,
            credit: 3,
        };
        assert!(!both.is_well_formed());
    }

    #[test]
    fn reversal_swaps_sides_and_links_original() {
        let entry = JournalEntry::new(
            "JE0001",
            date(),
            "Office supplies",
            EntrySource::OperatingExpense,
            vec![JournalLine::debit("511", 50), JournalLine::credit("111", 50)],
        );
        let reversal = entry.reversal("JE0002", date(), "entered twice");
        assert_eq!(reversal.reverses.as_deref(), Some("JE0001"));
        assert_eq!(reversal.details[0], JournalLine::credit("511", 50));
        assert_eq!(reversal.details[1], JournalLine::debit("111", 50));
        assert!(reversal.is_balanced());
    }
}
