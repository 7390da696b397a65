//! `dealdesk config`: import config validation and user settings.

use std::path::PathBuf;

use clap::Subcommand;

use dealdesk_config::Settings;
use dealdesk_import::ImportConfig;

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate an import config without running an import
    #[command(after_help = "\
Examples:
  dealdesk config validate deals.toml")]
    Validate {
        /// Path to the import config TOML
        config: PathBuf,
    },

    /// Print the settings file location and effective settings
    Show,

    /// Set the default database in the settings file
    #[command(after_help = "\
Examples:
  dealdesk config set-db ~/sales/deals.db")]
    SetDb {
        /// SQLite database path
        path: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { config } => cmd_config_validate(config),
        ConfigCommands::Show => cmd_config_show(),
        ConfigCommands::SetDb { path } => cmd_config_set_db(path),
    }
}

fn cmd_config_validate(path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::args(format!("cannot read {}: {e}", path.display())))?;
    let config = ImportConfig::from_toml(&text).map_err(CliError::normalize)?;

    eprintln!(
        "{}: ok (sheet '{}', header row {}, {}.{})",
        path.display(),
        config.sheet,
        config.header_row,
        config.table,
        config.key
    );
    for (field, label) in config.columns.entries() {
        eprintln!("  {field:<20} <- {label}");
    }
    Ok(())
}

fn cmd_config_show() -> Result<(), CliError> {
    let settings = Settings::load();
    let json_str = serde_json::to_string_pretty(&settings)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    eprintln!("settings: {}", Settings::config_path_display());
    println!("{json_str}");
    Ok(())
}

fn cmd_config_set_db(path: PathBuf) -> Result<(), CliError> {
    let mut settings = Settings::load();
    settings.db_path = Some(path);
    settings.save().map_err(|e| {
        CliError::io(format!("cannot write settings: {e}"))
            .with_hint(format!("edit {} by hand", Settings::config_path_display()))
    })?;
    eprintln!("db.path set in {}", Settings::config_path_display());
    Ok(())
}
