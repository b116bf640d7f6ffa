use thiserror::Error;

use crate::domain::loan::LoanStatus;

/// Result alias used throughout the financial core.
pub type KoperasiResult<T> = Result<T, KoperasiError>;

/// Error type that captures every failure the financial core can report.
///
/// All variants are local validation failures; none are retried by the core.
/// A failed operation never leaves the ledger, a member or a loan partially
/// updated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KoperasiError {
    #[error("Unbalanced journal entry: debits {debit} != credits {credit}")]
    UnbalancedEntry { debit: i64, credit: i64 },
    #[error("Unknown account code: {0}")]
    UnknownAccount(String),
    #[error("Insufficient funds for member {member_id}: requested {requested}, available {available}")]
    InsufficientFunds {
        member_id: String,
        requested: i64,
        available: i64,
    },
    #[error("Overpayment on loan {loan_id}: paid {requested}, at most {payable} is due")]
    Overpayment {
        loan_id: String,
        requested: i64,
        payable: i64,
    },
    #[error("Cannot {action} loan {loan_id} while it is {from:?}")]
    InvalidTransition {
        loan_id: String,
        from: LoanStatus,
        action: &'static str,
    },
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Storage(String),
}

impl KoperasiError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        KoperasiError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        KoperasiError::InvalidEvent(message.into())
    }
}

impl From<std::io::Error> for KoperasiError {
    fn from(err: std::io::Error) -> Self {
        KoperasiError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for KoperasiError {
    fn from(err: serde_json::Error) -> Self {
        KoperasiError::Storage(err.to_string())
    }
}
