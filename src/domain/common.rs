/// Money expressed in the currency's smallest unit (whole Rupiah).
pub type Amount = i64;

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> &str;
}

// Re-export common dependencies so consumers can rely on this module.
pub use chrono;
pub use rust_decimal;
pub use serde;
