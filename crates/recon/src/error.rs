use std::fmt;

/// A key that appears more than once in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub key: String,
    pub count: usize,
}

#[derive(Debug)]
pub enum ReconError {
    /// Table or column name is not a plain SQL identifier.
    InvalidIdentifier(String),
    /// The target table does not exist in the store.
    UnknownTable(String),
    /// Column is not present in the batch or not exposed by the target table.
    UnknownColumn { table: String, column: String },
    /// A batch row has a null reconciliation key.
    NullKey { table: String, column: String, row: usize },
    /// The same key appears more than once in the incoming batch.
    DuplicateKeys { table: String, keys: Vec<DuplicateKey> },
    /// Row width doesn't match the batch's column list.
    RowShape { row: usize, expected: usize, found: usize },
    /// Error raised by the backing store (constraint violation, IO, etc.).
    Store { table: String, message: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier: {name:?}"),
            Self::UnknownTable(table) => write!(f, "table '{table}' does not exist"),
            Self::UnknownColumn { table, column } => {
                write!(f, "table '{table}': unknown column '{column}'")
            }
            Self::NullKey { table, column, row } => {
                write!(f, "table '{table}': row {row} has a null key in column '{column}'")
            }
            Self::DuplicateKeys { table, keys } => {
                write!(f, "table '{table}': duplicate keys in batch:")?;
                for dup in keys {
                    write!(f, " {:?} ({} times)", dup.key, dup.count)?;
                }
                Ok(())
            }
            Self::RowShape { row, expected, found } => {
                write!(f, "row {row}: expected {expected} values, found {found}")
            }
            Self::Store { table, message } if table.is_empty() => write!(f, "store error: {message}"),
            Self::Store { table, message } => write!(f, "table '{table}': {message}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl ReconError {
    pub(crate) fn store(table: &str, err: impl fmt::Display) -> Self {
        Self::Store { table: table.to_string(), message: err.to_string() }
    }
}
