use once_cell::sync::Lazy;

use crate::domain::account::{Account, AccountType};

pub const KAS_BANK: &str = "111";
pub const PIUTANG_PINJAMAN: &str = "112";
pub const SIMPANAN_SUKARELA: &str = "211";
pub const SIMPANAN_POKOK: &str = "311";
pub const SIMPANAN_WAJIB: &str = "312";
pub const PENDAPATAN_BUNGA: &str = "411";
pub const BEBAN_OPERASIONAL: &str = "511";

static DEFAULT_CHART: Lazy<Vec<Account>> = Lazy::new(|| {
    vec![
        Account::new(KAS_BANK, "Kas/Bank", AccountType::Asset),
        Account::new(PIUTANG_PINJAMAN, "Piutang Pinjaman", AccountType::Asset),
        Account::new(SIMPANAN_SUKARELA, "Simpanan Sukarela", AccountType::Liability),
        Account::new(SIMPANAN_POKOK, "Simpanan Pokok", AccountType::Equity),
        Account::new(SIMPANAN_WAJIB, "Simpanan Wajib", AccountType::Equity),
        Account::new(
            PENDAPATAN_BUNGA,
            "Pendapatan Bunga Pinjaman",
            AccountType::Revenue,
        ),
        Account::new(BEBAN_OPERASIONAL, "Beban Operasional", AccountType::Expense),
    ]
});

/// The koperasi's fixed chart of accounts, every balance starting at zero.
pub fn default_chart() -> Vec<Account> {
    DEFAULT_CHART.clone()
}
