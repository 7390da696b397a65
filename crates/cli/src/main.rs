// dealdesk - import pre-sales deal workbooks into SQLite

mod config_cmd;
mod db;
mod exit_codes;
mod import;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use dealdesk_config::Settings;
use dealdesk_import::NormalizeError;
use dealdesk_io::IoError;
use dealdesk_recon::ReconError;

use config_cmd::ConfigCommands;
use exit_codes::{
    io_exit_code, normalize_exit_code, recon_exit_code, ErrorOutput, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};
use import::{ImportArgs, PreviewArgs};

#[derive(Parser)]
#[command(name = "dealdesk")]
#[command(about = "Import pre-sales deal workbooks into a SQLite fact table")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a deal workbook and upsert it into the store
    #[command(after_help = "\
Examples:
  dealdesk import pipeline.xlsx
  dealdesk import pipeline.xlsx --db sales.db --json
  dealdesk import export.csv --header-row 0 --mode append
  dealdesk import pipeline.xlsx --config deals.toml --dry-run")]
    Import(ImportArgs),

    /// Normalize a deal workbook and show the resulting rows without writing
    #[command(after_help = "\
Examples:
  dealdesk preview pipeline.xlsx
  dealdesk preview pipeline.xlsx --limit 3 --json")]
    Preview(PreviewArgs),

    /// Create the fact_deals and dim_date tables
    #[command(after_help = "\
Examples:
  dealdesk init-db
  dealdesk init-db --db sales.db")]
    InitDb {
        /// SQLite database (default: settings, then ./dealdesk.db)
        #[arg(long, env = "DEALDESK_DB")]
        db: Option<PathBuf>,
    },

    /// Build the calendar dimension and upsert it into dim_date
    #[command(after_help = "\
Examples:
  dealdesk dim-date
  dealdesk dim-date --from 2024-01-01 --to 2024-12-31 --json")]
    DimDate {
        /// First day (YYYY-MM-DD)
        #[arg(long, default_value = "2020-01-01")]
        from: chrono::NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long, default_value = "2030-12-31")]
        to: chrono::NaiveDate,

        /// SQLite database (default: settings, then ./dealdesk.db)
        #[arg(long, env = "DEALDESK_DB")]
        db: Option<PathBuf>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Inspect import configs and user settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Import(args) => args.json,
            Commands::Preview(args) => args.json,
            Commands::DimDate { json, .. } => *json,
            Commands::InitDb { .. } | Commands::Config { .. } => false,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
            "\nstore:   sqlite (bundled)",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
            "\nstore:   sqlite (bundled)",
        )
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let json = cli.command.json();
    let settings = Settings::load();

    let result = match cli.command {
        Commands::Import(args) => import::cmd_import(args, &settings),
        Commands::Preview(args) => import::cmd_preview(args, &settings),
        Commands::InitDb { db } => db::cmd_init_db(db, &settings),
        Commands::DimDate { from, to, db, json } => db::cmd_dim_date(from, to, db, json, &settings),
        Commands::Config { command } => config_cmd::cmd_config(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            ErrorOutput { error: message, hint, exit_code: code }.print(json);
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a workbook read error with proper exit code.
    pub fn read(err: IoError) -> Self {
        let hint = match &err {
            IoError::SheetNotFound { available, .. } if !available.is_empty() => {
                Some(format!("pass --sheet with one of: {}", available.join(", ")))
            }
            IoError::HeaderRowOutOfRange { .. } => Some("--header-row is 0-based".to_string()),
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }

    /// Create error from a normalization error with proper exit code.
    pub fn normalize(err: NormalizeError) -> Self {
        let hint = match &err {
            NormalizeError::MissingColumns { .. } => {
                Some("map the labels in the [columns] table of an import config (--config)".to_string())
            }
            NormalizeError::NoKeyedRows { .. } => Some("is --header-row pointing at the label row?".to_string()),
            _ => None,
        };
        Self { code: normalize_exit_code(&err), message: err.to_string(), hint }
    }

    /// Create error from a reconciler/store error with proper exit code.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::UnknownTable(_) => Some("run `dealdesk init-db` or pass --table".to_string()),
            ReconError::DuplicateKeys { .. } => {
                Some("deal names must be unique within one workbook; nothing was written".to_string())
            }
            ReconError::Store { table, .. } if !table.is_empty() => Some("the whole batch was rolled back".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
