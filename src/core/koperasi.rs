//! The koperasi aggregate: members, loans, the savings log and the ledger
//! behind one explicit state container.
//!
//! Each member and loan sits behind its own mutex, so operations on
//! different entities run in parallel while operations on the same entity
//! serialize. Lock order is entity, then ledger accounts (ascending code),
//! then the journal, then the savings log. Collection locks are only held
//! long enough to clone an entity handle.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, IdStyle};
use crate::core::ids::{highest_sequence, IdGenerator, IdKind, SequentialIds, UuidIds};
use crate::core::services::{
    AmortizationService, BalanceSheet, BusinessEvent, DashboardSummary, EntityDirectory,
    IncomeStatement, Installment, JournalEngine, LoanQuote, LoanService, Posting, PostingContext,
    PostingRules, RepaymentSplit, ReportService, SavingsService, TrialBalance,
};
use crate::core::time::Clock;
use crate::domain::{
    Account, Amount, Identifiable, InterestBasis, JournalEntry, Loan, LoanStatus, LoanTerms,
    Member, MemberProfile, MemberStatus, SavingsKind, SavingsTransaction,
};
use crate::errors::{KoperasiError, KoperasiResult};
use crate::ledger::Ledger;

/// Bumped whenever [`KoperasiSnapshot`] changes shape.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Outcome of a deposit or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsReceipt {
    pub member: Member,
    pub transaction: SavingsTransaction,
    pub entry: JournalEntry,
}

/// Outcome of a loan repayment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepaymentReceipt {
    pub loan: Loan,
    pub entry: JournalEntry,
    pub split: RepaymentSplit,
}

/// Complete persisted state of a [`Koperasi`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KoperasiSnapshot {
    pub schema_version: u32,
    pub taken_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub journal: Vec<JournalEntry>,
    pub members: Vec<Member>,
    pub loans: Vec<Loan>,
    pub transactions: Vec<SavingsTransaction>,
}

type Handles<T> = RwLock<BTreeMap<String, Arc<Mutex<T>>>>;

pub struct Koperasi {
    ledger: Ledger,
    engine: JournalEngine,
    interest_basis: InterestBasis,
    members: Handles<Member>,
    loans: Handles<Loan>,
    savings_log: Mutex<Vec<SavingsTransaction>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Koperasi {
    /// Empty koperasi over the default chart and posting rules.
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self::assemble(
            Ledger::default(),
            JournalEngine::default(),
            InterestBasis::default(),
            clock,
            ids,
        )
    }

    /// Empty koperasi configured from `config`.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> KoperasiResult<Self> {
        config.validate()?;
        let ids: Arc<dyn IdGenerator> = match config.id_style {
            IdStyle::Sequential => Arc::new(SequentialIds::new()),
            IdStyle::Uuid => Arc::new(UuidIds),
        };
        let ledger = Ledger::default();
        config.posting.ensure_chart_covers(&ledger)?;
        Ok(Self::assemble(
            ledger,
            JournalEngine::new(config.posting.clone()),
            config.interest_basis,
            clock,
            ids,
        ))
    }

    fn assemble(
        ledger: Ledger,
        engine: JournalEngine,
        interest_basis: InterestBasis,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            ledger,
            engine,
            interest_basis,
            members: RwLock::new(BTreeMap::new()),
            loans: RwLock::new(BTreeMap::new()),
            savings_log: Mutex::new(Vec::new()),
            clock,
            ids,
        }
    }

    fn ctx(&self) -> PostingContext<'_> {
        PostingContext {
            ledger: &self.ledger,
            engine: &self.engine,
            directory: self,
            clock: self.clock.as_ref(),
            ids: self.ids.as_ref(),
        }
    }

    fn member_handle(&self, member_id: &str) -> KoperasiResult<Arc<Mutex<Member>>> {
        self.members
            .read()
            .get(member_id)
            .cloned()
            .ok_or_else(|| KoperasiError::not_found("Member", member_id))
    }

    fn loan_handle(&self, loan_id: &str) -> KoperasiResult<Arc<Mutex<Loan>>> {
        self.loans
            .read()
            .get(loan_id)
            .cloned()
            .ok_or_else(|| KoperasiError::not_found("Loan", loan_id))
    }

    fn append_log(&self, transaction: SavingsTransaction) {
        self.savings_log.lock().push(transaction);
    }

    // ---- members -------------------------------------------------------

    pub fn register_member(&self, profile: MemberProfile) -> KoperasiResult<Member> {
        if profile.name.trim().is_empty() {
            return Err(KoperasiError::invalid("member name must not be empty"));
        }
        let member = Member::new(
            self.ids.next_id(IdKind::Member),
            profile,
            self.clock.today(),
        );
        let mut members = self.members.write();
        if members.contains_key(&member.id) {
            return Err(KoperasiError::invalid(format!(
                "member id `{}` already in use",
                member.id
            )));
        }
        members.insert(member.id.clone(), Arc::new(Mutex::new(member.clone())));
        info!(member_id = %member.id, name = %member.name, "member registered");
        Ok(member)
    }

    pub fn set_member_status(
        &self,
        member_id: &str,
        status: MemberStatus,
    ) -> KoperasiResult<Member> {
        let handle = self.member_handle(member_id)?;
        let mut member = handle.lock();
        member.status = status;
        info!(member_id, ?status, "member status changed");
        Ok(member.clone())
    }

    pub fn member(&self, member_id: &str) -> KoperasiResult<Member> {
        Ok(self.member_handle(member_id)?.lock().clone())
    }

    pub fn members(&self) -> Vec<Member> {
        let handles: Vec<_> = self.members.read().values().cloned().collect();
        handles.iter().map(|handle| handle.lock().clone()).collect()
    }

    // ---- savings -------------------------------------------------------

    /// Voluntary deposit.
    pub fn deposit(
        &self,
        member_id: &str,
        amount: Amount,
        description: &str,
    ) -> KoperasiResult<SavingsReceipt> {
        self.deposit_kind(member_id, SavingsKind::default(), amount, description)
    }

    pub fn deposit_kind(
        &self,
        member_id: &str,
        kind: SavingsKind,
        amount: Amount,
        description: &str,
    ) -> KoperasiResult<SavingsReceipt> {
        let handle = self.member_handle(member_id)?;
        let mut member = handle.lock();
        let posting = SavingsService::deposit(&self.ctx(), &mut member, kind, amount, description)?;
        Ok(self.savings_receipt(&member, posting))
    }

    pub fn withdraw(
        &self,
        member_id: &str,
        amount: Amount,
        description: &str,
    ) -> KoperasiResult<SavingsReceipt> {
        let handle = self.member_handle(member_id)?;
        let mut member = handle.lock();
        let posting = SavingsService::withdraw(&self.ctx(), &mut member, amount, description)?;
        Ok(self.savings_receipt(&member, posting))
    }

    fn savings_receipt(&self, member: &Member, posting: Posting) -> SavingsReceipt {
        self.append_log(posting.transaction.clone());
        SavingsReceipt {
            member: member.clone(),
            transaction: posting.transaction,
            entry: posting.entry,
        }
    }

    pub fn transactions(&self) -> Vec<SavingsTransaction> {
        self.savings_log.lock().clone()
    }

    pub fn member_transactions(&self, member_id: &str) -> KoperasiResult<Vec<SavingsTransaction>> {
        self.member_handle(member_id)?;
        Ok(self
            .savings_log
            .lock()
            .iter()
            .filter(|transaction| transaction.member_id == member_id)
            .cloned()
            .collect())
    }

    // ---- loans ---------------------------------------------------------

    /// Applies with the configured interest basis.
    pub fn apply_loan(
        &self,
        member_id: &str,
        principal: Amount,
        interest_rate: Decimal,
        tenure_months: u32,
    ) -> KoperasiResult<Loan> {
        let terms = LoanTerms::new(principal, interest_rate, tenure_months)
            .with_basis(self.interest_basis);
        self.apply_loan_with_terms(member_id, terms)
    }

    pub fn apply_loan_with_terms(&self, member_id: &str, terms: LoanTerms) -> KoperasiResult<Loan> {
        let handle = self.member_handle(member_id)?;
        let member = handle.lock();
        let loan = LoanService::apply(&self.ctx(), &member, terms)?;
        let mut loans = self.loans.write();
        if loans.contains_key(&loan.id) {
            return Err(KoperasiError::invalid(format!(
                "loan id `{}` already in use",
                loan.id
            )));
        }
        loans.insert(loan.id.clone(), Arc::new(Mutex::new(loan.clone())));
        Ok(loan)
    }

    pub fn decide_loan(&self, loan_id: &str, approve: bool) -> KoperasiResult<Loan> {
        let handle = self.loan_handle(loan_id)?;
        let mut loan = handle.lock();
        if approve {
            LoanService::approve(&self.ctx(), &mut loan)?;
        } else {
            LoanService::reject(&mut loan)?;
        }
        Ok(loan.clone())
    }

    pub fn disburse_loan(&self, loan_id: &str) -> KoperasiResult<JournalEntry> {
        let handle = self.loan_handle(loan_id)?;
        let mut loan = handle.lock();
        let posting = LoanService::disburse(&self.ctx(), &mut loan)?;
        self.append_log(posting.transaction);
        Ok(posting.entry)
    }

    pub fn record_repayment(&self, loan_id: &str, amount: Amount) -> KoperasiResult<RepaymentReceipt> {
        let handle = self.loan_handle(loan_id)?;
        let mut loan = handle.lock();
        let (split, posting) = LoanService::repay(&self.ctx(), &mut loan, amount)?;
        self.append_log(posting.transaction);
        Ok(RepaymentReceipt {
            loan: loan.clone(),
            entry: posting.entry,
            split,
        })
    }

    pub fn loan(&self, loan_id: &str) -> KoperasiResult<Loan> {
        Ok(self.loan_handle(loan_id)?.lock().clone())
    }

    pub fn loans(&self) -> Vec<Loan> {
        let handles: Vec<_> = self.loans.read().values().cloned().collect();
        handles.iter().map(|handle| handle.lock().clone()).collect()
    }

    pub fn loans_by_status(&self, status: LoanStatus) -> Vec<Loan> {
        self.loans()
            .into_iter()
            .filter(|loan| loan.status == status)
            .collect()
    }

    pub fn member_loans(&self, member_id: &str) -> KoperasiResult<Vec<Loan>> {
        self.member_handle(member_id)?;
        Ok(self
            .loans()
            .into_iter()
            .filter(|loan| loan.member_id == member_id)
            .collect())
    }

    pub fn loan_schedule(&self, loan_id: &str) -> KoperasiResult<Vec<Installment>> {
        let loan = self.loan(loan_id)?;
        AmortizationService::schedule(&loan)
    }

    /// Simulator figures for prospective terms; nothing is recorded.
    pub fn quote(
        &self,
        principal: Amount,
        interest_rate: Decimal,
        tenure_months: u32,
    ) -> KoperasiResult<LoanQuote> {
        AmortizationService::quote(
            &LoanTerms::new(principal, interest_rate, tenure_months)
                .with_basis(self.interest_basis),
        )
    }

    // ---- bookkeeping ---------------------------------------------------

    pub fn record_expense(&self, amount: Amount, description: &str) -> KoperasiResult<JournalEntry> {
        self.ctx()
            .post(&BusinessEvent::OperatingExpense { amount }, description)
    }

    /// Reverses a manual entry. Entries behind a member or loan record are
    /// refused so subledgers never drift from the ledger.
    pub fn reverse_entry(&self, entry_id: &str, reason: &str) -> KoperasiResult<JournalEntry> {
        let original = self
            .ledger
            .entry(entry_id)
            .ok_or_else(|| KoperasiError::not_found("Journal entry", entry_id))?;
        if original.source.is_subledger_event() {
            return Err(KoperasiError::invalid(format!(
                "journal entry `{entry_id}` belongs to a {:?} and cannot be reversed on its own",
                original.source
            )));
        }
        let reversal = self.ledger.reverse_entry(
            entry_id,
            || self.ids.next_id(IdKind::JournalEntry),
            self.clock.today(),
            reason,
        )?;
        info!(entry_id, reversal_id = %reversal.id, "journal entry reversed");
        Ok(reversal)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.ledger.journal()
    }

    pub fn account(&self, code: &str) -> KoperasiResult<Account> {
        self.ledger
            .account(code)
            .ok_or_else(|| KoperasiError::UnknownAccount(code.to_string()))
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.accounts()
    }

    // ---- reports -------------------------------------------------------

    pub fn balances(&self) -> BTreeMap<String, Amount> {
        self.ledger
            .accounts()
            .into_iter()
            .map(|account| (account.code, account.balance))
            .collect()
    }

    pub fn trial_balance(&self) -> TrialBalance {
        ReportService::trial_balance(&self.ledger.accounts())
    }

    pub fn income_statement(&self) -> IncomeStatement {
        ReportService::income_statement(&self.ledger.accounts())
    }

    pub fn balance_sheet(&self) -> BalanceSheet {
        ReportService::balance_sheet(&self.ledger.accounts())
    }

    pub fn dashboard_summary(&self) -> DashboardSummary {
        let members = self.members();
        let loans = self.loans();
        ReportService::dashboard(
            &self.ledger.accounts(),
            &members,
            &loans,
            &self.engine.rules().cash,
        )
    }

    // ---- persistence ---------------------------------------------------

    /// Captures a consistent copy of the whole state. Every entity lock is
    /// held while the ledger is read, so no operation lands half-way.
    pub fn snapshot(&self) -> KoperasiSnapshot {
        let member_handles: Vec<_> = self.members.read().values().cloned().collect();
        let loan_handles: Vec<_> = self.loans.read().values().cloned().collect();
        let members: Vec<_> = member_handles.iter().map(|handle| handle.lock()).collect();
        let loans: Vec<_> = loan_handles.iter().map(|handle| handle.lock()).collect();
        let (accounts, journal) = self.ledger.snapshot();
        let transactions = self.savings_log.lock().clone();
        KoperasiSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            taken_at: self.clock.now(),
            accounts,
            journal,
            members: members.iter().map(|member| (**member).clone()).collect(),
            loans: loans.iter().map(|loan| (**loan).clone()).collect(),
            transactions,
        }
    }

    /// Rebuilds a koperasi, re-verifying balances against the journal and
    /// every record's journal link. Sequential ids continue after the
    /// highest restored id.
    pub fn restore(
        snapshot: KoperasiSnapshot,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> KoperasiResult<Self> {
        config.validate()?;
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(KoperasiError::Storage(format!(
                "snapshot schema {} is newer than supported {}",
                snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }
        let ledger = Ledger::restore(snapshot.accounts, snapshot.journal)?;
        config.posting.ensure_chart_covers(&ledger)?;
        check_subledgers(
            &ledger,
            &config.posting,
            &snapshot.members,
            &snapshot.loans,
            &snapshot.transactions,
        )?;

        let ids: Arc<dyn IdGenerator> = match config.id_style {
            IdStyle::Sequential => {
                let journal = ledger.journal();
                let counters = HashMap::from([
                    (IdKind::Member, highest_of(IdKind::Member, &snapshot.members)),
                    (IdKind::Loan, highest_of(IdKind::Loan, &snapshot.loans)),
                    (
                        IdKind::SavingsTransaction,
                        highest_of(IdKind::SavingsTransaction, &snapshot.transactions),
                    ),
                    (IdKind::JournalEntry, highest_of(IdKind::JournalEntry, &journal)),
                ]);
                Arc::new(SequentialIds::resume(counters))
            }
            IdStyle::Uuid => Arc::new(UuidIds),
        };

        let koperasi = Self::assemble(
            ledger,
            JournalEngine::new(config.posting.clone()),
            config.interest_basis,
            clock,
            ids,
        );
        {
            let mut members = koperasi.members.write();
            for member in snapshot.members {
                members.insert(member.id.clone(), Arc::new(Mutex::new(member)));
            }
            let mut loans = koperasi.loans.write();
            for loan in snapshot.loans {
                loans.insert(loan.id.clone(), Arc::new(Mutex::new(loan)));
            }
        }
        *koperasi.savings_log.lock() = snapshot.transactions;
        info!(
            members = koperasi.members.read().len(),
            loans = koperasi.loans.read().len(),
            entries = koperasi.ledger.journal_len(),
            "koperasi restored"
        );
        Ok(koperasi)
    }
}

impl EntityDirectory for Koperasi {
    fn has_member(&self, member_id: &str) -> bool {
        self.members.read().contains_key(member_id)
    }

    fn has_loan(&self, loan_id: &str) -> bool {
        self.loans.read().contains_key(loan_id)
    }
}

fn highest_of<T: Identifiable>(kind: IdKind, records: &[T]) -> u64 {
    highest_sequence(kind, records.iter().map(Identifiable::id))
}

/// Cross-checks restored records against the ledger: member savings must
/// add up to the savings accounts and active loans to the receivable.
fn check_subledgers(
    ledger: &Ledger,
    rules: &PostingRules,
    members: &[Member],
    loans: &[Loan],
    transactions: &[SavingsTransaction],
) -> KoperasiResult<()> {
    let corrupt = |message: String| KoperasiError::Storage(message);
    let mut expected: BTreeMap<String, Amount> = SavingsKind::ALL
        .iter()
        .map(|kind| (rules.savings_account(*kind).to_string(), 0))
        .collect();
    expected.insert(rules.loan_receivable.clone(), 0);
    let mut accumulate = |code: &str, amount: Amount| -> KoperasiResult<()> {
        let slot = expected.entry(code.to_string()).or_insert(0);
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| corrupt(format!("subledger total for `{code}` overflows")))?;
        Ok(())
    };

    for member in members {
        if Some(member.balance) != member.savings.total() {
            return Err(corrupt(format!(
                "member `{}` balance {} differs from its savings {:?}",
                member.id, member.balance, member.savings
            )));
        }
        for kind in SavingsKind::ALL {
            accumulate(rules.savings_account(kind), member.savings.get(kind))?;
        }
    }
    for loan in loans {
        if loan.remaining_balance < 0 || loan.remaining_balance > loan.principal {
            return Err(corrupt(format!(
                "loan `{}` remaining balance {} is outside 0..={}",
                loan.id, loan.remaining_balance, loan.principal
            )));
        }
        if !members.iter().any(|member| member.id == loan.member_id) {
            return Err(corrupt(format!(
                "loan `{}` references unknown member `{}`",
                loan.id, loan.member_id
            )));
        }
        if loan.status == LoanStatus::Active {
            accumulate(&rules.loan_receivable, loan.remaining_balance)?;
        }
    }
    for transaction in transactions {
        if ledger.entry(&transaction.journal_entry_id).is_none() {
            return Err(corrupt(format!(
                "transaction `{}` links missing journal entry `{}`",
                transaction.id, transaction.journal_entry_id
            )));
        }
    }
    for (code, total) in expected {
        let balance = ledger.balance(&code)?;
        if balance != total {
            return Err(corrupt(format!(
                "account `{code}` holds {balance} but member records add up to {total}"
            )));
        }
    }
    Ok(())
}
