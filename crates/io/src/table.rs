use chrono::{Duration, NaiveDate, NaiveDateTime};

/// One spreadsheet cell as read, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Blank text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form of the cell, trimmed. `None` for empty and error cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty | Self::Error(_) => None,
            Self::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            // Integers without decimals
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Self::DateTime(dt) if dt.time() == chrono::NaiveTime::MIN => {
                Some(dt.date().format("%Y-%m-%d").to_string())
            }
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Convert an Excel serial (1900 date system) to a date-time.
///
/// Day 0 is 1899-12-30, which absorbs Excel's phantom 1900-02-29 for every
/// serial after February 1900.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let millis = (serial.fract() * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::milliseconds(millis))
}

/// A sheet's header labels and the data rows beneath them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Position of the header matching this label, ignoring surrounding
    /// whitespace on either side.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cell at (row, col); short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
