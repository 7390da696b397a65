// Excel import (xlsx, xls, xlsb, ods) via calamine

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::IoError;
use crate::table::{Cell, RawTable};

/// Read one sheet of a workbook on disk.
///
/// `header_row` is the absolute 0-based sheet row holding the column labels;
/// every non-blank row below it becomes a data row.
pub fn read_sheet(path: &Path, sheet: &str, header_row: usize) -> Result<RawTable, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    read_from(&mut workbook, sheet, header_row)
}

/// Read one sheet of a workbook held in memory (e.g. an uploaded file).
pub fn read_sheet_from_bytes(bytes: &[u8], sheet: &str, header_row: usize) -> Result<RawTable, IoError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| IoError::Open {
        path: "<upload>".to_string(),
        message: e.to_string(),
    })?;
    read_from(&mut workbook, sheet, header_row)
}

/// Sheet names in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>, IoError> {
    let workbook = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(workbook.sheet_names().to_vec())
}

fn read_from<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet: &str,
    header_row: usize,
) -> Result<RawTable, IoError> {
    let available = workbook.sheet_names().to_vec();
    if !available.iter().any(|name| name == sheet) {
        return Err(IoError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet).map_err(|e| IoError::Read {
        sheet: sheet.to_string(),
        message: e.to_string(),
    })?;

    table_from_range(&range, sheet, header_row)
}

fn table_from_range(range: &Range<Data>, sheet: &str, header_row: usize) -> Result<RawTable, IoError> {
    // Range start offset (data may not begin at A1)
    let (start_row, _) = range.start().unwrap_or((0, 0));
    let start_row = start_row as usize;

    if range.is_empty() || header_row < start_row {
        return Err(IoError::HeaderRowOutOfRange {
            sheet: sheet.to_string(),
            header_row,
        });
    }

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut blank_rows = 0usize;

    for (idx, row) in range.rows().enumerate() {
        let abs_row = start_row + idx;
        if abs_row < header_row {
            continue;
        }
        if abs_row == header_row {
            headers = Some(row.iter().map(|c| convert_cell(c).as_text().unwrap_or_default()).collect());
            continue;
        }

        let cells: Vec<Cell> = row.iter().map(convert_cell).collect();
        if cells.iter().all(Cell::is_empty) {
            blank_rows += 1;
            continue;
        }
        rows.push(cells);
    }

    let headers = headers.ok_or_else(|| IoError::HeaderRowOutOfRange {
        sheet: sheet.to_string(),
        header_row,
    })?;

    log::debug!(
        "sheet '{sheet}': {} data rows under header row {} ({blank_rows} blank rows skipped)",
        rows.len(),
        header_row + 1
    );

    Ok(RawTable {
        sheet: sheet.to_string(),
        headers,
        rows,
    })
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Error(format!("#{:?}", e)),
        // Durations and time-of-day cells carry no calendar date
        Data::DateTime(dt) if dt.is_duration() || dt.as_f64() < 1.0 => Cell::Number(dt.as_f64()),
        Data::DateTime(dt) => {
            // as_datetime applies the workbook's 1900/1904 epoch
            match dt.as_datetime() {
                Some(value) => Cell::DateTime(value),
                None => Cell::Number(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) => parse_iso(s).map(Cell::DateTime).unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn iso_cells_become_datetimes() {
        let cell = convert_cell(&Data::DateTimeIso("2024-03-01T00:00:00".into()));
        assert_eq!(
            cell,
            Cell::DateTime(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("soon".into())),
            Cell::Text("soon".into())
        );
    }

    #[test]
    fn date_cells_follow_workbook_epoch() {
        let jan_10 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mac = ExcelDateTime::new(43839.0, ExcelDateTimeType::DateTime, true);
        assert_eq!(convert_cell(&Data::DateTime(mac)), Cell::DateTime(jan_10));

        let windows = ExcelDateTime::new(45301.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(convert_cell(&Data::DateTime(windows)), Cell::DateTime(jan_10));

        let duration = ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(convert_cell(&Data::DateTime(duration)), Cell::Number(1.5));
        let time_only = ExcelDateTime::new(0.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(convert_cell(&Data::DateTime(time_only)), Cell::Number(0.5));
    }

    #[test]
    fn blank_strings_are_empty() {
        assert_eq!(convert_cell(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(convert_cell(&Data::Int(7)), Cell::Number(7.0));
    }
}
