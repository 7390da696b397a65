use std::fmt;

#[derive(Debug)]
pub enum NormalizeError {
    /// Required source columns are absent from the header row.
    MissingColumns { sheet: String, columns: Vec<String> },
    /// Every data row had a blank key, so nothing can be imported.
    NoKeyedRows { sheet: String, column: String, rows: usize },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty labels, bad identifiers, etc.).
    ConfigValidation(String),
    /// Date dimension requested with start after end.
    InvalidDateRange { start: String, end: String },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns { sheet, columns } => {
                let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
                write!(f, "sheet '{sheet}': missing column(s) {}", quoted.join(", "))
            }
            Self::NoKeyedRows { sheet, column, rows } => {
                write!(f, "sheet '{sheet}': all {rows} row(s) have an empty '{column}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidDateRange { start, end } => {
                write!(f, "invalid date range: {start} is after {end}")
            }
        }
    }
}

impl std::error::Error for NormalizeError {}
