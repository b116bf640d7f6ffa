#![doc(test(attr(deny(warnings))))]

//! Koperasi Core is the financial core of a savings-and-loan cooperative:
//! members and their savings, the loan lifecycle with amortization, and a
//! double-entry ledger with the reports built on it.
//!
//! ```
//! use std::sync::Arc;
//!
//! use koperasi_core::core::{Koperasi, SequentialIds, SystemClock};
//! use koperasi_core::domain::MemberProfile;
//!
//! let koperasi = Koperasi::new(Arc::new(SystemClock), Arc::new(SequentialIds::new()));
//! let member = koperasi.register_member(MemberProfile::new("Budi Santoso")).unwrap();
//! koperasi.deposit(&member.id, 250_000, "Setoran awal").unwrap();
//! assert!(koperasi.trial_balance().is_balanced());
//! ```

pub mod advisory;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use crate::core::Koperasi;
pub use crate::errors::{KoperasiError, KoperasiResult};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!(
            build = %utils::build_info::current().banner(),
            "Koperasi Core tracing initialized."
        );
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
