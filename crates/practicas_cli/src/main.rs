//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store, run first-start bootstrap and print table
//!   counts plus coordinator statistics.
//! - Keep output deterministic for quick local sanity checks.

use log::{error, info};
use practicas_core::{
    init_from_config, service::stats::collect_stats, PortalConfig, RecordStore, TableName,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("practicas_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = PortalConfig::from_env()?;
    init_from_config(&config)?;
    info!(
        "event=cli_run module=cli status=start db_path={}",
        config.db_path.display()
    );

    let store = RecordStore::open(&config.db_path)?;
    let report = store.bootstrap(config.seed_demo_accounts)?;

    println!("practicas_core version={}", practicas_core::core_version());
    println!("db_path={}", config.db_path.display());
    println!(
        "bootstrap seeded_demo_accounts={} initialized_tables={}",
        report.seeded_demo_accounts,
        report.initialized.len()
    );

    for table in TableName::ALL {
        let rows = match store.raw(table.key())? {
            Some(entry) => row_count(&entry.value),
            None => 0,
        };
        println!("table={} rows={}", table.key(), rows);
    }

    let stats = collect_stats(&store);
    println!(
        "stats students={} with_internship={} active_postings={} tasks={} overdue_tasks={} companies={}",
        stats.total_students,
        stats.students_with_internship,
        stats.active_postings,
        stats.total_tasks,
        stats.overdue_tasks,
        stats.total_companies
    );

    info!("event=cli_run module=cli status=ok");
    Ok(())
}

/// Counts top-level array elements without knowing the row type.
fn row_count(blob: &str) -> usize {
    match serde_json::from_str::<Vec<serde_json::Value>>(blob) {
        Ok(rows) => rows.len(),
        Err(_) => 0,
    }
}
