//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, bad identifier, bad date range)|
//! | 3    | Schema error (missing source column, unknown table/column)|
//! | 4    | Duplicate keys in the import batch                        |
//! | 5    | Cannot open or read the workbook / CSV                    |
//! | 6    | Store error (constraint violation, locked database, I/O)  |
//! | 7    | Invalid import config                                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the error mapping below

use dealdesk_import::NormalizeError;
use dealdesk_io::IoError;
use dealdesk_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Import (3-7)
// =============================================================================

/// Source sheet lacks a mapped column, or the target table/column is unknown.
pub const EXIT_SCHEMA: u8 = 3;

/// The same deal name appears more than once in one import.
pub const EXIT_DUPLICATE_KEYS: u8 = 4;

/// Workbook or CSV cannot be opened/read (missing sheet, corrupt file).
pub const EXIT_READ: u8 = 5;

/// Store rejected the batch; nothing was written.
pub const EXIT_STORE: u8 = 6;

/// Import config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 7;

// =============================================================================
// Error mapping
// =============================================================================

pub fn io_exit_code(_err: &IoError) -> u8 {
    EXIT_READ
}

pub fn normalize_exit_code(err: &NormalizeError) -> u8 {
    match err {
        NormalizeError::MissingColumns { .. } | NormalizeError::NoKeyedRows { .. } => EXIT_SCHEMA,
        NormalizeError::ConfigParse(_) | NormalizeError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        NormalizeError::InvalidDateRange { .. } => EXIT_USAGE,
    }
}

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::InvalidIdentifier(_) => EXIT_USAGE,
        ReconError::UnknownTable(_)
        | ReconError::UnknownColumn { .. }
        | ReconError::NullKey { .. } => EXIT_SCHEMA,
        ReconError::DuplicateKeys { .. } => EXIT_DUPLICATE_KEYS,
        ReconError::Store { .. } => EXIT_STORE,
        ReconError::RowShape { .. } => EXIT_ERROR,
    }
}

/// Structured error output for `--json` runs.
/// Written to stderr so stdout stays a single JSON value (or empty).
#[derive(Debug, serde::Serialize)]
pub struct ErrorOutput {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub exit_code: u8,
}

impl ErrorOutput {
    /// Print error to stderr (human-readable by default).
    pub fn print(&self, json: bool) {
        if json {
            if let Ok(output) = serde_json::to_string(self) {
                eprintln!("{}", output);
            }
        } else {
            eprintln!("error: {}", self.error);
            if let Some(ref hint) = self.hint {
                eprintln!("hint:  {}", hint);
            }
        }
    }
}
