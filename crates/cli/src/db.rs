//! `dealdesk init-db` / `dealdesk dim-date`: store setup.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use dealdesk_config::Settings;
use dealdesk_import::date_dim::{DIM_DATE_KEY, DIM_DATE_TABLE};
use dealdesk_import::{date_dimension, ensure_schema};
use dealdesk_recon::{reconcile, ReconOutcome, SqliteStore};

use crate::CliError;

/// Open the database and make sure the deal tables exist.
pub fn open_store(path: &Path) -> Result<SqliteStore, CliError> {
    let store = SqliteStore::open(path).map_err(CliError::recon)?;
    ensure_schema(&store).map_err(CliError::recon)?;
    log::debug!("opened {}", path.display());
    Ok(store)
}

pub fn cmd_init_db(db: Option<PathBuf>, settings: &Settings) -> Result<(), CliError> {
    let path = db.unwrap_or_else(|| settings.effective_db_path());
    open_store(&path)?;
    eprintln!("initialized {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct DimDateReport {
    table: &'static str,
    from: NaiveDate,
    to: NaiveDate,
    days: usize,
    #[serde(flatten)]
    outcome: ReconOutcome,
}

pub fn cmd_dim_date(
    from: NaiveDate,
    to: NaiveDate,
    db: Option<PathBuf>,
    json_output: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let batch = date_dimension(from, to).map_err(CliError::normalize)?;
    let path = db.unwrap_or_else(|| settings.effective_db_path());
    let mut store = open_store(&path)?;
    let outcome = reconcile(&batch, &mut store, DIM_DATE_TABLE, DIM_DATE_KEY).map_err(CliError::recon)?;

    let report = DimDateReport { table: DIM_DATE_TABLE, from, to, days: batch.len(), outcome };
    if json_output {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "{}: {} days {}..{}, {} inserted, {} updated",
        report.table, report.days, from, to, outcome.inserted, outcome.updated
    );
    Ok(())
}
