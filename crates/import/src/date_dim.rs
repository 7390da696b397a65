use chrono::{Datelike, NaiveDate};

use dealdesk_recon::{Batch, Value};

use crate::error::NormalizeError;

pub const DIM_DATE_TABLE: &str = "dim_date";
pub const DIM_DATE_KEY: &str = "full_date";
pub const DIM_DATE_COLUMNS: [&str; 7] = ["full_date", "year", "quarter", "month", "week", "day", "day_name"];

/// One row per calendar day in `start..=end`, keyed on the ISO date text.
pub fn date_dimension(start: NaiveDate, end: NaiveDate) -> Result<Batch, NormalizeError> {
    if start > end {
        return Err(NormalizeError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let mut batch = Batch::new(DIM_DATE_COLUMNS.iter().map(|c| c.to_string()).collect());
    for date in start.iter_days().take_while(|d| *d <= end) {
        batch.push(vec![
            Value::Text(date.format("%Y-%m-%d").to_string()),
            Value::Integer(date.year() as i64),
            Value::Integer(((date.month() - 1) / 3 + 1) as i64),
            Value::Integer(date.month() as i64),
            Value::Integer(date.iso_week().week() as i64),
            Value::Integer(date.day() as i64),
            Value::Text(date.format("%A").to_string()),
        ]);
    }

    log::debug!("date dimension {start}..={end}: {} days", batch.len());
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn leap_year_has_366_days() {
        let batch = date_dimension(ymd(2024, 1, 1), ymd(2024, 12, 31)).unwrap();
        assert_eq!(batch.len(), 366);
        assert_eq!(
            batch.rows[59],
            vec![
                Value::Text("2024-02-29".into()),
                Value::Integer(2024),
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(9),
                Value::Integer(29),
                Value::Text("Thursday".into()),
            ]
        );
    }

    #[test]
    fn single_day() {
        let batch = date_dimension(ymd(2030, 12, 31), ymd(2030, 12, 31)).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows[0][2], Value::Integer(4));
    }

    #[test]
    fn rejects_reversed_range() {
        let err = date_dimension(ymd(2024, 2, 1), ymd(2024, 1, 1)).unwrap_err();
        assert_eq!(err.to_string(), "invalid date range: 2024-02-01 is after 2024-01-01");
    }
}
