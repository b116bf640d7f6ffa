pub mod ids;
pub mod koperasi;
pub mod services;
pub mod time;
pub mod utils;

pub use ids::{IdGenerator, IdKind, SequentialIds, UuidIds};
pub use koperasi::{
    Koperasi, KoperasiSnapshot, RepaymentReceipt, SavingsReceipt, SNAPSHOT_SCHEMA_VERSION,
};
pub use time::{Clock, FixedClock, SystemClock};
