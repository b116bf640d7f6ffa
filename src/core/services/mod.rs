pub mod amortization;
pub mod journal_service;
pub mod loan_service;
pub mod report_service;
pub mod savings_service;

pub use amortization::{AmortizationService, Installment, LoanQuote, RepaymentSplit};
pub use journal_service::{BusinessEvent, EntityDirectory, JournalEngine, PostingRules};
pub use loan_service::LoanService;
pub use report_service::{
    BalanceSheet, DashboardSummary, IncomeStatement, ReportService, StatementLine, TrialBalance,
    TrialBalanceLine,
};
pub use savings_service::SavingsService;

use chrono::NaiveDate;

use crate::core::ids::{IdGenerator, IdKind};
use crate::core::time::Clock;
use crate::domain::{JournalEntry, SavingsTransaction};
use crate::errors::KoperasiResult;
use crate::ledger::Ledger;

/// Collaborators a service needs to book an event.
#[derive(Clone, Copy)]
pub struct PostingContext<'a> {
    pub ledger: &'a Ledger,
    pub engine: &'a JournalEngine,
    pub directory: &'a dyn EntityDirectory,
    pub clock: &'a dyn Clock,
    pub ids: &'a dyn IdGenerator,
}

impl<'a> PostingContext<'a> {
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn next_id(&self, kind: IdKind) -> String {
        self.ids.next_id(kind)
    }

    /// Posts `event` dated today. A journal id is drawn only for entries
    /// that actually post.
    pub fn post(&self, event: &BusinessEvent, description: &str) -> KoperasiResult<JournalEntry> {
        self.engine.record(
            self.ledger,
            self.directory,
            event,
            || self.next_id(IdKind::JournalEntry),
            self.today(),
            description,
        )
    }
}

/// A journal entry together with the member-facing record that links to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub entry: JournalEntry,
    pub transaction: SavingsTransaction,
}
