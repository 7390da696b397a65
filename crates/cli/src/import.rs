//! `dealdesk import` / `dealdesk preview`: workbook → canonical deals → store.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use dealdesk_config::{ImportMode, Settings};
use dealdesk_import::{deals_to_batch, normalize, DealRecord, ImportConfig, NormalizeOutput, NormalizeStats};
use dealdesk_io::RawTable;
use dealdesk_recon::{append, reconcile, ReconOutcome};

use crate::CliError;

/// Where to read deals from and how to interpret the sheet.
#[derive(Args)]
pub struct SourceArgs {
    /// Workbook (.xlsx, .xls, .xlsb, .ods) or CSV export
    pub file: PathBuf,

    /// Import config TOML (sheet, header row, column labels)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sheet holding the deals (overrides config)
    #[arg(long)]
    pub sheet: Option<String>,

    /// 0-based row holding the column labels (overrides config)
    #[arg(long)]
    pub header_row: Option<usize>,

    /// Reference date for the closest-milestone fields (default: today)
    #[arg(long)]
    pub today: Option<chrono::NaiveDate>,
}

#[derive(Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// SQLite database (default: settings, then ./dealdesk.db)
    #[arg(long, env = "DEALDESK_DB")]
    pub db: Option<PathBuf>,

    /// Target table (overrides config)
    #[arg(long)]
    pub table: Option<String>,

    /// Reconciliation key column (overrides config)
    #[arg(long)]
    pub key: Option<String>,

    /// upsert (update existing deals, insert new ones) or append
    #[arg(long)]
    pub mode: Option<ImportMode>,

    /// Normalize and report without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON report to file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of rows to show (default: settings, then 10)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output JSON to stdout instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub file: String,
    pub sheet: String,
    pub table: String,
    pub key: String,
    pub mode: String,
    pub dry_run: bool,
    pub stats: NormalizeStats,
    pub deals: usize,
    #[serde(flatten)]
    pub outcome: ReconOutcome,
}

// ============================================================================
// Shared: config + read + normalize
// ============================================================================

/// Import config from --config, else the settings file, else the built-in
/// layout; command-line overrides applied last.
fn resolve_config(source: &SourceArgs, settings: &Settings) -> Result<ImportConfig, CliError> {
    let path = source.config.as_ref().or(settings.import_config.as_ref());
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
            ImportConfig::from_toml(&text).map_err(|e| CliError::normalize(e).with_hint(format!("in {}", path.display())))?
        }
        None => ImportConfig::default(),
    };

    if let Some(sheet) = &source.sheet {
        config.sheet = sheet.clone();
    }
    if let Some(row) = source.header_row {
        config.header_row = row;
    }
    Ok(config)
}

fn is_delimited(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "csv" | "tsv" | "txt"))
        .unwrap_or(false)
}

fn read_source(path: &Path, config: &ImportConfig) -> Result<RawTable, CliError> {
    let raw = if is_delimited(path) {
        dealdesk_io::csv::read_csv(path, config.header_row)
    } else {
        dealdesk_io::xlsx::read_sheet(path, &config.sheet, config.header_row)
    };
    raw.map_err(CliError::read)
}

fn load_deals(source: &SourceArgs, config: &ImportConfig) -> Result<(RawTable, NormalizeOutput), CliError> {
    let raw = read_source(&source.file, config)?;
    let today = source.today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let out = normalize(&raw, config, today).map_err(CliError::normalize)?;
    log::info!(
        "{}: {} deals from {} rows ({} dropped)",
        source.file.display(),
        out.deals.len(),
        out.stats.rows_read,
        out.stats.rows_dropped
    );
    Ok((raw, out))
}

// ============================================================================
// import
// ============================================================================

pub fn cmd_import(args: ImportArgs, settings: &Settings) -> Result<(), CliError> {
    let mut config = resolve_config(&args.source, settings)?;
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
    if let Some(key) = &args.key {
        config.key = key.clone();
    }
    config.validate().map_err(CliError::normalize)?;

    let mode = args.mode.unwrap_or(settings.import_mode);
    let (raw, out) = load_deals(&args.source, &config)?;

    let outcome = if args.dry_run {
        ReconOutcome::default()
    } else {
        let db_path = args.db.clone().unwrap_or_else(|| settings.effective_db_path());
        let mut store = crate::db::open_store(&db_path)?;
        let batch = deals_to_batch(&out.deals);
        match mode {
            ImportMode::Upsert => {
                reconcile(&batch, &mut store, &config.table, &config.key).map_err(CliError::recon)?
            }
            ImportMode::Append => {
                let inserted = append(&batch, &mut store, &config.table).map_err(CliError::recon)?;
                ReconOutcome { inserted, ..Default::default() }
            }
        }
    };

    let report = ImportReport {
        file: args.source.file.display().to_string(),
        sheet: raw.sheet.clone(),
        table: config.table.clone(),
        key: config.key.clone(),
        mode: mode.to_string(),
        dry_run: args.dry_run,
        stats: out.stats,
        deals: out.deals.len(),
        outcome,
    };

    emit_report(&report, args.json, args.output.as_deref())
}

fn emit_report(report: &ImportReport, json_output: bool, output_file: Option<&Path>) -> Result<(), CliError> {
    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

        if let Some(path) = output_file {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    let s = &report.stats;
    eprintln!(
        "{}: {} deals ({} rows read, {} without a deal name, {} unreadable dates, {} unreadable amounts)",
        report.sheet, report.deals, s.rows_read, s.rows_dropped, s.unparsed_dates, s.unparsed_amounts,
    );
    if report.dry_run {
        eprintln!("dry run: nothing written to {}", report.table);
    } else {
        eprintln!(
            "{} ({}): {} inserted, {} updated, {} skipped",
            report.table, report.mode, report.outcome.inserted, report.outcome.updated, report.outcome.skipped,
        );
    }

    Ok(())
}

// ============================================================================
// preview
// ============================================================================

pub fn cmd_preview(args: PreviewArgs, settings: &Settings) -> Result<(), CliError> {
    let config = resolve_config(&args.source, settings)?;
    let (_, out) = load_deals(&args.source, &config)?;
    let limit = args.limit.unwrap_or(settings.preview_limit);
    let shown: &[DealRecord] = &out.deals[..out.deals.len().min(limit)];

    if args.json {
        let json_str = serde_json::to_string_pretty(shown)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for deal in shown {
            println!("{}", preview_line(deal));
        }
    }

    eprintln!("showing {} of {} deals", shown.len(), out.deals.len());
    Ok(())
}

fn preview_line(deal: &DealRecord) -> String {
    let amount = deal.deal_amount.map(|a| format!("{a:.2}")).unwrap_or_else(|| "-".into());
    let closest = deal
        .closest
        .map(|c| c.date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());
    format!("{:<32} {:<18} {:>14} {}", deal.deal_name, deal.status.label(), amount, closest)
}
