//! Domain models for the koperasi: chart accounts, journal entries, members,
//! savings records and loans.

pub mod account;
pub mod common;
pub mod journal;
pub mod loan;
pub mod member;
pub mod savings;

pub use account::{Account, AccountType, NormalSide};
pub use common::{Amount, Identifiable};
pub use journal::{EntrySource, JournalEntry, JournalLine};
pub use loan::{InterestBasis, Loan, LoanAction, LoanStatus, LoanTerms};
pub use member::{Member, MemberProfile, MemberStatus, SavingsBreakdown};
pub use savings::{SavingsKind, SavingsTransaction, TransactionType};
