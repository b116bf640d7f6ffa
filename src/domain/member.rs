use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::common::*;
use crate::domain::savings::SavingsKind;
use crate::errors::{KoperasiError, KoperasiResult};

/// Identity and contact fields supplied at registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl MemberProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

/// Savings held by one member, split by savings product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsBreakdown {
    pub pokok: Amount,
    pub wajib: Amount,
    pub sukarela: Amount,
}

impl SavingsBreakdown {
    pub fn get(&self, kind: SavingsKind) -> Amount {
        match kind {
            SavingsKind::Pokok => self.pokok,
            SavingsKind::Wajib => self.wajib,
            SavingsKind::Sukarela => self.sukarela,
        }
    }

    fn slot_mut(&mut self, kind: SavingsKind) -> &mut Amount {
        match kind {
            SavingsKind::Pokok => &mut self.pokok,
            SavingsKind::Wajib => &mut self.wajib,
            SavingsKind::Sukarela => &mut self.sukarela,
        }
    }

    /// Sum over all kinds; `None` if it does not fit in an [`Amount`].
    pub fn total(&self) -> Option<Amount> {
        self.pokok.checked_add(self.wajib)?.checked_add(self.sukarela)
    }
}

/// Member savings after a pending deposit or withdrawal, computed before
/// the journal entry posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SavingsChange {
    savings: SavingsBreakdown,
    balance: Amount,
}

/// A registered koperasi member.
///
/// `balance` is a cache of the member's savings; it only changes when a
/// deposit or withdrawal is posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub joined_date: NaiveDate,
    pub balance: Amount,
    #[serde(default)]
    pub savings: SavingsBreakdown,
    pub status: MemberStatus,
}

impl Member {
    pub fn new(id: impl Into<String>, profile: MemberProfile, joined_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            address: profile.address,
            joined_date,
            balance: 0,
            savings: SavingsBreakdown::default(),
            status: MemberStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Amount the member may currently withdraw.
    pub fn withdrawable(&self) -> Amount {
        self.savings.get(SavingsKind::WITHDRAWABLE)
    }

    /// Checks that moving `delta` into `kind` keeps every figure in range.
    pub(crate) fn savings_change(
        &self,
        kind: SavingsKind,
        delta: Amount,
    ) -> KoperasiResult<SavingsChange> {
        let overflow = || {
            KoperasiError::invalid(format!("savings of member `{}` would overflow", self.id))
        };
        let mut savings = self.savings;
        let slot = savings.slot_mut(kind);
        *slot = slot.checked_add(delta).ok_or_else(overflow)?;
        if *slot < 0 {
            return Err(KoperasiError::invalid(format!(
                "{kind:?} savings of member `{}` cannot go negative",
                self.id
            )));
        }
        let balance = savings.total().ok_or_else(overflow)?;
        Ok(SavingsChange { savings, balance })
    }

    pub(crate) fn apply_savings(&mut self, change: SavingsChange) {
        self.savings = change.savings;
        self.balance = change.balance;
    }
}

impl Identifiable for Member {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Member {
        Member::new(
            "MEM001",
            MemberProfile::new("Siti Aminah"),
            NaiveDate::from_ymd_opt(2023, 3, 20).unwrap(),
        )
    }

    #[test]
    fn savings_change_applies_to_one_kind() {
        let mut member = member();
        let change = member.savings_change(SavingsKind::Wajib, 2_500_000).unwrap();
        member.apply_savings(change);
        assert_eq!(member.savings.wajib, 2_500_000);
        assert_eq!(member.balance, 2_500_000);
        assert!(member.savings_change(SavingsKind::Sukarela, -1).is_err());
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let mut member = member();
        member.savings.pokok = Amount::MAX;
        member.balance = Amount::MAX;
        let err = member
            .savings_change(SavingsKind::Sukarela, 1)
            .expect_err("total overflows");
        assert!(matches!(err, KoperasiError::InvalidEvent(_)));
        assert_eq!(member.savings.sukarela, 0);
        assert_eq!(member.savings.total(), Some(Amount::MAX));
    }
}
