use std::{env, process, sync::Arc};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use koperasi_core::{
    config::ConfigManager,
    core::{FixedClock, Koperasi, SystemClock},
    domain::{MemberProfile, SavingsKind},
    init,
    storage::{JsonSnapshotStore, SnapshotStore},
    utils::build_info,
    KoperasiError, KoperasiResult,
};

const USAGE: &str = "usage: koperasi_core_cli [demo [--save NAME] | report NAME | version]";

fn main() {
    init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let outcome = match args.as_slice() {
        [] | ["demo"] => demo(None),
        ["demo", "--save", name] => demo(Some(name)),
        ["report", name] => report(name),
        ["version"] => {
            println!("{}", build_info::current().banner());
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    if let Err(err) = outcome {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn date(year: i32, month: u32, day: u32) -> KoperasiResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| KoperasiError::InvalidEvent(format!("invalid date {year}-{month}-{day}")))
}

/// Replays the sample members, savings and loan of a small koperasi.
fn sample_koperasi(clock: Arc<FixedClock>) -> KoperasiResult<Koperasi> {
    let config = ConfigManager::new()?.load()?;
    let koperasi = Koperasi::from_config(&config, clock.clone())?;
    let on = |year, month, day| -> KoperasiResult<()> {
        clock.set(date(year, month, day)?.and_hms_opt(9, 0, 0).unwrap_or_default().and_utc());
        Ok(())
    };

    on(2023, 1, 15)?;
    let budi = koperasi.register_member(
        MemberProfile::new("Budi Santoso")
            .with_email("budi@example.com")
            .with_phone("08123456789")
            .with_address("Jakarta Selatan"),
    )?;
    on(2023, 3, 20)?;
    let siti = koperasi.register_member(
        MemberProfile::new("Siti Aminah")
            .with_email("siti@example.com")
            .with_phone("08129876543")
            .with_address("Bandung, Jawa Barat"),
    )?;

    on(2023, 10, 20)?;
    koperasi.deposit_kind(&siti.id, SavingsKind::Pokok, 10_000_000, "Simpanan Pokok")?;
    koperasi.deposit_kind(&siti.id, SavingsKind::Wajib, 2_500_000, "Simpanan Wajib")?;
    on(2023, 11, 15)?;
    koperasi.deposit_kind(&budi.id, SavingsKind::Pokok, 1_000_000, "Setoran Awal")?;
    on(2023, 12, 1)?;
    koperasi.deposit(&budi.id, 500_000, "Simpanan Sukarela")?;
    let loan = koperasi.apply_loan(&siti.id, 10_000_000, Decimal::from(10), 24)?;
    on(2023, 12, 5)?;
    koperasi.decide_loan(&loan.id, true)?;
    koperasi.disburse_loan(&loan.id)?;

    let installment = koperasi.loan(&loan.id)?.monthly_installment;
    on(2024, 1, 5)?;
    koperasi.record_repayment(&loan.id, installment)?;
    on(2024, 1, 31)?;
    koperasi.record_expense(150_000, "Biaya alat tulis kantor")?;
    on(2024, 2, 5)?;
    koperasi.record_repayment(&loan.id, installment)?;
    Ok(koperasi)
}

fn reports(koperasi: &Koperasi) -> KoperasiResult<Value> {
    Ok(json!({
        "members": koperasi.members(),
        "loans": koperasi.loans(),
        "trial_balance": koperasi.trial_balance(),
        "income_statement": koperasi.income_statement(),
        "balance_sheet": koperasi.balance_sheet(),
        "dashboard": koperasi.dashboard_summary(),
    }))
}

fn print(value: &Value) -> KoperasiResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn demo(save_as: Option<&str>) -> KoperasiResult<()> {
    let clock = Arc::new(FixedClock::on(date(2023, 1, 1)?));
    let koperasi = sample_koperasi(clock)?;
    let mut output = reports(&koperasi)?;
    if let Some(name) = save_as {
        let path = JsonSnapshotStore::new_default()?.save(name, &koperasi.snapshot())?;
        output["saved_to"] = json!(path.display().to_string());
    }
    print(&output)
}

fn report(name: &str) -> KoperasiResult<()> {
    let config = ConfigManager::new()?.load()?;
    let snapshot = JsonSnapshotStore::new_default()?.load(name)?;
    let koperasi = Koperasi::restore(snapshot, &config, Arc::new(SystemClock))?;
    print(&reports(&koperasi)?)
}
