// Permissive coercion of raw cells into dates, amounts and percentages.
//
// Every parser returns `None` for anything it cannot read; callers decide
// whether a `None` from a non-empty cell is worth counting.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use dealdesk_io::{excel_serial_to_datetime, Cell};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.date()),
        Cell::Text(s) => parse_date_str(s),
        Cell::Empty | Cell::Bool(_) | Cell::Error(_) => None,
    }
}

pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = parse_slashed(s) {
        return Some(date);
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // "1/10/2024 0:00" and similar: retry on the date part alone
    let (head, _) = s.split_once(char::is_whitespace)?;
    parse_slashed(head).or_else(|| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
    })
}

/// `MM/DD/YY` and `MM/DD/YYYY`. The year width picks the format, since
/// `%Y` would read "24" as the year 24.
fn parse_slashed(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 || parts[0].len() > 2 {
        return None;
    }
    let fmt = match parts[2].len() {
        2 => "%m/%d/%y",
        4 => "%m/%d/%Y",
        _ => return None,
    };
    NaiveDate::parse_from_str(s, fmt).ok()
}

/// Monetary amount. Currency symbols, thousands separators and whitespace are
/// ignored; `(1,000)` reads as -1000.
pub fn parse_amount(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_amount_str(s),
        _ => None,
    }
}

pub fn parse_amount_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (negative, inner) = if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '₫' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let n = cleaned.parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(if negative { -n } else { n })
}

/// Percentage as a fraction-or-number: numeric cells pass through, `"60%"`
/// reads as 0.6, a bare numeric string as that number.
pub fn parse_percent(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => {
            let s = s.trim();
            let value = match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok().map(|n| n / 100.0),
                None => s.parse::<f64>().ok(),
            };
            value.filter(|n| n.is_finite())
        }
        _ => None,
    }
}
