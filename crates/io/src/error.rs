use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or is not a readable workbook.
    Open { path: String, message: String },
    /// Requested sheet is not in the workbook.
    SheetNotFound { sheet: String, available: Vec<String> },
    /// The sheet has no row at the configured header offset.
    HeaderRowOutOfRange { sheet: String, header_row: usize },
    /// Cell data could not be read.
    Read { sheet: String, message: String },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => write!(f, "cannot open {path}: {message}"),
            Self::SheetNotFound { sheet, available } => {
                write!(f, "sheet '{sheet}' not found (available: {})", available.join(", "))
            }
            Self::HeaderRowOutOfRange { sheet, header_row } => {
                write!(f, "sheet '{sheet}': no header at row {}", header_row + 1)
            }
            Self::Read { sheet, message } => write!(f, "sheet '{sheet}': {message}"),
        }
    }
}

impl std::error::Error for IoError {}
