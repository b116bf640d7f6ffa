//! Chart-of-accounts store and append-only journal.
//!
//! The ledger is the only place account balances change. Postings lock the
//! accounts they touch in ascending code order, so entries over disjoint
//! accounts run concurrently while overlapping entries serialize.

pub mod chart;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use crate::domain::{Account, AccountType, Amount, EntrySource, JournalEntry};
use crate::errors::{KoperasiError, KoperasiResult};

pub use chart::default_chart;

#[derive(Debug, Default)]
struct JournalLog {
    entries: Vec<JournalEntry>,
    by_id: HashMap<String, usize>,
    reversed: HashSet<String>,
}

impl JournalLog {
    fn admit(&self, entry: &JournalEntry) -> KoperasiResult<()> {
        self.check_reversal(entry)?;
        self.check_unique(entry)
    }

    fn check_unique(&self, entry: &JournalEntry) -> KoperasiResult<()> {
        if self.by_id.contains_key(&entry.id) {
            return Err(KoperasiError::invalid(format!(
                "journal entry `{}` already posted",
                entry.id
            )));
        }
        Ok(())
    }

    fn check_reversal(&self, entry: &JournalEntry) -> KoperasiResult<()> {
        if let Some(original_id) = entry.reverses.as_deref() {
            let original = self
                .by_id
                .get(original_id)
                .map(|idx| &self.entries[*idx])
                .ok_or_else(|| KoperasiError::not_found("Journal entry", original_id))?;
            if original.source == EntrySource::Reversal {
                return Err(KoperasiError::invalid(format!(
                    "journal entry `{original_id}` is itself a reversal"
                )));
            }
            if self.reversed.contains(original_id) {
                return Err(KoperasiError::invalid(format!(
                    "journal entry `{original_id}` was already reversed"
                )));
            }
        }
        Ok(())
    }

    fn push(&mut self, entry: JournalEntry) {
        if let Some(original_id) = entry.reverses.clone() {
            self.reversed.insert(original_id);
        }
        self.by_id.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
    }
}

/// Holds account balances by code and the journal that produced them.
#[derive(Debug)]
pub struct Ledger {
    accounts: BTreeMap<String, Mutex<Account>>,
    journal: RwLock<JournalLog>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::build(default_chart())
    }
}

impl Ledger {
    /// Creates a ledger over the supplied chart. Codes must be unique.
    pub fn with_chart(chart: Vec<Account>) -> KoperasiResult<Self> {
        let mut seen = HashSet::new();
        for account in &chart {
            if !seen.insert(account.code.as_str()) {
                return Err(KoperasiError::Config(format!(
                    "duplicate account code `{}` in chart",
                    account.code
                )));
            }
        }
        Ok(Self::build(chart))
    }

    fn build(chart: Vec<Account>) -> Self {
        let accounts = chart
            .into_iter()
            .map(|account| (account.code.clone(), Mutex::new(account)))
            .collect();
        Self {
            accounts,
            journal: RwLock::new(JournalLog::default()),
        }
    }

    /// Rebuilds a ledger from persisted state, checking balances against the journal.
    pub fn restore(accounts: Vec<Account>, journal: Vec<JournalEntry>) -> KoperasiResult<Self> {
        let ledger = Self::with_chart(accounts)?;
        {
            let mut log = ledger.journal.write();
            for entry in journal {
                log.admit(&entry)?;
                log.push(entry);
            }
        }
        ledger.verify_against_journal()?;
        Ok(ledger)
    }

    /// Validates and applies a balanced entry; all lines apply or none do.
    /// The id comes from `next_id`, which is only called once the entry is
    /// known to post, so rejected entries never consume an id and ids follow
    /// journal order.
    pub(crate) fn post_entry(
        &self,
        mut entry: JournalEntry,
        next_id: impl FnOnce() -> String,
    ) -> KoperasiResult<JournalEntry> {
        let mut guards = self.lock_movements(&entry)?;

        let mut log = self.journal.write();
        log.check_reversal(&entry)?;
        entry.id = next_id();
        log.check_unique(&entry)?;
        for (account, next) in guards.iter_mut() {
            account.balance = *next;
        }
        debug!(
            entry_id = %entry.id,
            source = ?entry.source,
            lines = entry.details.len(),
            amount = entry.total_debit(),
            "journal entry posted"
        );
        log.push(entry.clone());
        Ok(entry)
    }

    /// Posts the mirror image of `entry_id`, cancelling its effect.
    pub(crate) fn reverse_entry(
        &self,
        entry_id: &str,
        next_id: impl FnOnce() -> String,
        date: NaiveDate,
        reason: &str,
    ) -> KoperasiResult<JournalEntry> {
        let original = self
            .entry(entry_id)
            .ok_or_else(|| KoperasiError::not_found("Journal entry", entry_id))?;
        self.post_entry(original.reversal(String::new(), date, reason), next_id)
    }

    /// Locks the touched accounts in ascending code order and computes
    /// their balances after `entry`.
    fn lock_movements(
        &self,
        entry: &JournalEntry,
    ) -> KoperasiResult<Vec<(MutexGuard<'_, Account>, Amount)>> {
        let movements = self.validate(entry)?;
        let mut guards = Vec::with_capacity(movements.len());
        for (code, (debit, credit)) in &movements {
            let slot = self
                .accounts
                .get(*code)
                .ok_or_else(|| KoperasiError::UnknownAccount(code.to_string()))?;
            let account = slot.lock();
            let delta = account.account_type.signed_delta(*debit, *credit);
            let next = account
                .balance
                .checked_add(delta)
                .ok_or_else(|| KoperasiError::invalid(format!("balance overflow on `{code}`")))?;
            guards.push((account, next));
        }
        Ok(guards)
    }

    fn validate<'e>(&self, entry: &'e JournalEntry) -> KoperasiResult<BTreeMap<&'e str, (Amount, Amount)>> {
        if entry.details.is_empty() {
            return Err(KoperasiError::invalid(format!(
                "journal entry `{}` has no lines",
                entry.id
            )));
        }
        let mut total_debit: Amount = 0;
        let mut total_credit: Amount = 0;
        let mut movements: BTreeMap<&str, (Amount, Amount)> = BTreeMap::new();
        for (idx, line) in entry.details.iter().enumerate() {
            if !line.is_well_formed() {
                return Err(KoperasiError::invalid(format!(
                    "line {} of `{}` must carry exactly one positive debit or credit",
                    idx + 1,
                    entry.id
                )));
            }
            let overflow = || KoperasiError::invalid(format!("amount overflow in `{}`", entry.id));
            total_debit = total_debit.checked_add(line.debit).ok_or_else(overflow)?;
            total_credit = total_credit.checked_add(line.credit).ok_or_else(overflow)?;
            let slot = movements.entry(line.account_code.as_str()).or_insert((0, 0));
            slot.0 += line.debit;
            slot.1 += line.credit;
        }
        if total_debit != total_credit {
            return Err(KoperasiError::UnbalancedEntry {
                debit: total_debit,
                credit: total_credit,
            });
        }
        if let Some(code) = movements
            .keys()
            .find(|code| !self.accounts.contains_key(**code))
        {
            return Err(KoperasiError::UnknownAccount(code.to_string()));
        }
        Ok(movements)
    }

    pub fn balance(&self, code: &str) -> KoperasiResult<Amount> {
        self.accounts
            .get(code)
            .map(|slot| slot.lock().balance)
            .ok_or_else(|| KoperasiError::UnknownAccount(code.to_string()))
    }

    pub fn account(&self, code: &str) -> Option<Account> {
        self.accounts.get(code).map(|slot| slot.lock().clone())
    }

    pub fn contains_account(&self, code: &str) -> bool {
        self.accounts.contains_key(code)
    }

    /// Consistent snapshot of every account, ordered by code.
    pub fn accounts(&self) -> Vec<Account> {
        let guards: Vec<_> = self.accounts.values().map(|slot| slot.lock()).collect();
        guards.iter().map(|account| (**account).clone()).collect()
    }

    pub fn accounts_by_type(&self, account_type: AccountType) -> Vec<Account> {
        self.accounts()
            .into_iter()
            .filter(|account| account.account_type == account_type)
            .collect()
    }

    /// Accounts and journal captured together, with no posting in between.
    pub fn snapshot(&self) -> (Vec<Account>, Vec<JournalEntry>) {
        let guards: Vec<_> = self.accounts.values().map(|slot| slot.lock()).collect();
        let log = self.journal.read();
        let accounts = guards.iter().map(|account| (**account).clone()).collect();
        (accounts, log.entries.clone())
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.read().entries.clone()
    }

    pub fn journal_len(&self) -> usize {
        self.journal.read().entries.len()
    }

    pub fn entry(&self, id: &str) -> Option<JournalEntry> {
        let log = self.journal.read();
        log.by_id.get(id).map(|idx| log.entries[*idx].clone())
    }

    pub fn is_reversed(&self, id: &str) -> bool {
        self.journal.read().reversed.contains(id)
    }

    /// Replays the journal from zero and compares against stored balances.
    pub fn verify_against_journal(&self) -> KoperasiResult<()> {
        let accounts = self.accounts();
        let log = self.journal.read();
        let mut expected: HashMap<&str, Amount> = HashMap::new();
        let types: HashMap<&str, AccountType> = accounts
            .iter()
            .map(|account| (account.code.as_str(), account.account_type))
            .collect();
        for entry in &log.entries {
            if !entry.is_balanced() {
                return Err(KoperasiError::Storage(format!(
                    "journal entry `{}` is unbalanced",
                    entry.id
                )));
            }
            for line in &entry.details {
                let account_type = types
                    .get(line.account_code.as_str())
                    .ok_or_else(|| KoperasiError::UnknownAccount(line.account_code.clone()))?;
                *expected.entry(line.account_code.as_str()).or_insert(0) +=
                    account_type.signed_delta(line.debit, line.credit);
            }
        }
        for account in &accounts {
            let replayed = expected.get(account.code.as_str()).copied().unwrap_or(0);
            if replayed != account.balance {
                return Err(KoperasiError::Storage(format!(
                    "account `{}` holds {} but the journal replays to {}",
                    account.code, account.balance, replayed
                )));
            }
        }
        Ok(())
    }
}
