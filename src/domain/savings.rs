use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::common::*;

/// Savings products a member can hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SavingsKind {
    /// One-off membership capital.
    Pokok,
    /// Periodic mandatory contribution.
    Wajib,
    /// Voluntary savings, the only kind a member may withdraw at will.
    #[default]
    Sukarela,
}

impl SavingsKind {
    pub const WITHDRAWABLE: SavingsKind = SavingsKind::Sukarela;
    pub const ALL: [SavingsKind; 3] = [SavingsKind::Pokok, SavingsKind::Wajib, SavingsKind::Sukarela];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    LoanDisbursement,
    LoanRepayment,
}

/// Member-facing record of a posted money movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsTransaction {
    pub id: String,
    pub member_id: String,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub date: NaiveDate,
    pub description: String,
    pub journal_entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_kind: Option<SavingsKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<String>,
}

impl Identifiable for SavingsTransaction {
    fn id(&self) -> &str {
        &self.id
    }
}
