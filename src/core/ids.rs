use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of records that receive generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdKind {
    Member,
    Loan,
    SavingsTransaction,
    JournalEntry,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            IdKind::Member => "MEM",
            IdKind::Loan => "LOAN",
            IdKind::SavingsTransaction => "TRX",
            IdKind::JournalEntry => "JE",
        }
    }

    fn width(self) -> usize {
        match self {
            IdKind::JournalEntry => 4,
            _ => 3,
        }
    }
}

/// Source of unique identifiers for new records.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, kind: IdKind) -> String;
}

/// Human-readable counters such as `MEM001` or `JE0042`.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counters: Mutex<HashMap<IdKind, u64>>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues numbering after counters recovered from persisted records.
    pub fn resume(counters: HashMap<IdKind, u64>) -> Self {
        Self {
            counters: Mutex::new(counters),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, kind: IdKind) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}{:0width$}", kind.prefix(), *counter, width = kind.width())
    }
}

/// Random v4 UUIDs, prefixed by kind for readability.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self, kind: IdKind) -> String {
        format!("{}-{}", kind.prefix(), Uuid::new_v4())
    }
}

/// Highest numeric suffix among `ids` carrying the prefix of `kind`.
pub fn highest_sequence<'a>(kind: IdKind, ids: impl IntoIterator<Item = &'a str>) -> u64 {
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(kind.prefix()))
        .filter_map(|digits| digits.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_pad_per_kind() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id(IdKind::Member), "MEM001");
        assert_eq!(ids.next_id(IdKind::Member), "MEM002");
        assert_eq!(ids.next_id(IdKind::Loan), "LOAN001");
        assert_eq!(ids.next_id(IdKind::JournalEntry), "JE0001");
    }

    #[test]
    fn resume_continues_after_highest() {
        let highest = highest_sequence(IdKind::Member, ["MEM001", "MEM017", "LOAN003"]);
        assert_eq!(highest, 17);
        let ids = SequentialIds::resume(HashMap::from([(IdKind::Member, highest)]));
        assert_eq!(ids.next_id(IdKind::Member), "MEM018");
    }

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidIds;
        assert_ne!(
            ids.next_id(IdKind::SavingsTransaction),
            ids.next_id(IdKind::SavingsTransaction)
        );
    }
}
