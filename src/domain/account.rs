use serde::{Deserialize, Serialize};

use crate::domain::common::*;

/// A chart-of-accounts entry together with its running balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Amount,
}

impl Account {
    /// Creates an account with a zero balance.
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            balance: 0,
        }
    }
}

impl Identifiable for Account {
    fn id(&self) -> &str {
        &self.code
    }
}

/// Enumerates the five account classes of the chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// The side of a journal line that increases an account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NormalSide {
    Debit,
    Credit,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
    ];

    pub fn normal_side(self) -> NormalSide {
        match self {
            AccountType::Asset | AccountType::Expense => NormalSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalSide::Credit
            }
        }
    }

    /// Net change a debit/credit pair makes to an account of this type.
    pub fn signed_delta(self, debit: Amount, credit: Amount) -> Amount {
        match self.normal_side() {
            NormalSide::Debit => debit - credit,
            NormalSide::Credit => credit - debit,
        }
    }
}
