// CSV/TSV import

use std::io::Read;
use std::path::Path;

use crate::error::IoError;
use crate::table::{Cell, RawTable};

/// Read a delimited text export of a deal sheet.
///
/// The delimiter is sniffed; `header_row` is the 0-based physical line holding
/// the labels, blank lines included. If that line is blank the next record is
/// the header. The table's sheet name is the file stem.
pub fn read_csv(path: &Path, header_row: usize) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    read_csv_str(&content, &name, header_row)
}

pub fn read_csv_str(content: &str, name: &str, header_row: usize) -> Result<RawTable, IoError> {
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| IoError::Read {
            sheet: name.to_string(),
            message: e.to_string(),
        })?;
        if headers.is_none() {
            // csv skips empty lines, so place records by their starting line
            let line = record.position().map_or(0, |p| p.line().saturating_sub(1) as usize);
            if line >= header_row {
                headers = Some(record.iter().map(|h| h.to_string()).collect::<Vec<_>>());
            }
            continue;
        }

        let cells: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(cells);
    }

    let headers = headers.ok_or_else(|| IoError::HeaderRowOutOfRange {
        sheet: name.to_string(),
        header_row,
    })?;

    Ok(RawTable {
        sheet: name.to_string(),
        headers,
        rows,
    })
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // More consistent lines, then more columns
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let open_err = |e: std::io::Error| IoError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(open_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(open_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Amount;City\n\"Doe, Jane\";\"$1,200\";Paris\nBob;\"$456\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_header_offset_and_blank_rows() {
        let content = "Official Deal,,\nDeal Name,Deal Amount,Won\nAcme,\"$1,200\",2024-01-10\n,,\nGlobex,,\n";
        let table = read_csv_str(content, "deals", 1).unwrap();
        assert_eq!(table.headers, vec!["Deal Name", "Deal Amount", "Won"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 1), &Cell::Text("$1,200".into()));
        assert_eq!(table.cell(1, 2), &Cell::Empty);
    }

    #[test]
    fn test_header_row_counts_blank_lines() {
        let table = read_csv_str("\nDeal Name,Won\nAcme,01/10/24\n", "deals", 1).unwrap();
        assert_eq!(table.headers, vec!["Deal Name", "Won"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, 0), &Cell::Text("Acme".into()));

        let table = read_csv_str("Export\n\n\nDeal Name,Won\nAcme,\n", "deals", 3).unwrap();
        assert_eq!(table.headers, vec!["Deal Name", "Won"]);
        assert_eq!(table.row_count(), 1);

        let table = read_csv_str("\nDeal Name\tWon\nAcme\t01/10/24\n", "deals", 1).unwrap();
        assert_eq!(table.headers, vec!["Deal Name", "Won"]);
    }

    #[test]
    fn test_missing_header_row() {
        let err = read_csv_str("a,b\n", "deals", 3).unwrap_err();
        assert!(matches!(err, IoError::HeaderRowOutOfRange { header_row: 3, .. }));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deals.csv");
        // "Café" in Windows-1252
        let mut bytes = b"Deal Name,Reasons\nAcme,Caf".to_vec();
        bytes.push(0xE9);
        bytes.push(b'\n');
        fs::write(&path, bytes).unwrap();

        let table = read_csv(&path, 0).unwrap();
        assert_eq!(table.sheet, "deals");
        assert_eq!(table.cell(0, 1), &Cell::Text("Café".into()));
    }
}
