use chrono::NaiveDate;
use serde::Serialize;

use dealdesk_io::RawTable;

use crate::config::{ColumnMapping, ImportConfig};
use crate::error::NormalizeError;
use crate::model::{ClosestDate, DealRecord, DealStatus};
use crate::parse::{parse_amount, parse_date, parse_percent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Data rows under the header.
    pub rows_read: usize,
    /// Rows without a deal name.
    pub rows_dropped: usize,
    /// Non-empty date cells that could not be read (stored as null).
    pub unparsed_dates: usize,
    /// Non-empty amount cells that could not be read (stored as null).
    pub unparsed_amounts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutput {
    pub deals: Vec<DealRecord>,
    pub stats: NormalizeStats,
}

/// Source column position for every canonical field.
struct Columns {
    deal_name: usize,
    project_type: usize,
    deal_amount: usize,
    deal_received_date: usize,
    proposal_sent_date: usize,
    pending_date: usize,
    lost_date: usize,
    won_date: usize,
    division: usize,
    division_1_pct: usize,
    division_2_pct: usize,
    reasons: usize,
}

impl Columns {
    /// Locate every mapped label among the (trimmed) headers, reporting all
    /// missing labels at once.
    fn resolve(raw: &RawTable, mapping: &ColumnMapping) -> Result<Self, NormalizeError> {
        let find = |label: &str| raw.column_index(label);

        let missing: Vec<String> = mapping
            .entries()
            .iter()
            .filter(|(_, label)| find(label).is_none())
            .map(|(_, label)| label.trim().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(NormalizeError::MissingColumns {
                sheet: raw.sheet.clone(),
                columns: missing,
            });
        }

        // Every label resolved above
        let at = |label: &str| find(label).unwrap_or_default();
        Ok(Self {
            deal_name: at(&mapping.deal_name),
            project_type: at(&mapping.project_type),
            deal_amount: at(&mapping.deal_amount),
            deal_received_date: at(&mapping.deal_received_date),
            proposal_sent_date: at(&mapping.proposal_sent_date),
            pending_date: at(&mapping.pending_date),
            lost_date: at(&mapping.lost_date),
            won_date: at(&mapping.won_date),
            division: at(&mapping.division),
            division_1_pct: at(&mapping.division_1_pct),
            division_2_pct: at(&mapping.division_2_pct),
            reasons: at(&mapping.reasons),
        })
    }
}

/// Turn the raw deal sheet into canonical deal records.
///
/// Rows without a deal name are dropped. Unreadable dates and amounts become
/// null and are counted in the stats rather than failing the import. `today`
/// anchors the closest-milestone fields.
pub fn normalize(raw: &RawTable, config: &ImportConfig, today: NaiveDate) -> Result<NormalizeOutput, NormalizeError> {
    let cols = Columns::resolve(raw, &config.columns)?;
    let mut stats = NormalizeStats {
        rows_read: raw.row_count(),
        ..Default::default()
    };
    let mut deals = Vec::with_capacity(raw.row_count());

    for row in 0..raw.row_count() {
        let cell = |col: usize| raw.cell(row, col);

        let Some(deal_name) = cell(cols.deal_name).as_text() else {
            stats.rows_dropped += 1;
            continue;
        };

        let mut date = |col: usize, field: &str| {
            let value = parse_date(cell(col));
            if value.is_none() && !cell(col).is_empty() {
                log::debug!("{}: row {}: unreadable {field} {:?}", raw.sheet, row + 1, cell(col));
                stats.unparsed_dates += 1;
            }
            value
        };
        let deal_received_date = date(cols.deal_received_date, "deal_received_date");
        let proposal_sent_date = date(cols.proposal_sent_date, "proposal_sent_date");
        let pending_date = date(cols.pending_date, "pending_date");
        let lost_date = date(cols.lost_date, "lost_date");
        let won_date = date(cols.won_date, "won_date");

        let amount_cell = cell(cols.deal_amount);
        let deal_amount = parse_amount(amount_cell);
        if deal_amount.is_none() && !amount_cell.is_empty() {
            log::debug!("{}: row {}: unreadable deal_amount {amount_cell:?}", raw.sheet, row + 1);
            stats.unparsed_amounts += 1;
        }

        let status = DealStatus::derive(won_date, lost_date, pending_date, proposal_sent_date);
        let closest = ClosestDate::nearest(&[won_date, pending_date, deal_received_date, lost_date], today);

        deals.push(DealRecord {
            deal_name,
            project_type: cell(cols.project_type).as_text(),
            deal_amount,
            deal_received_date,
            proposal_sent_date,
            pending_date,
            won_date,
            lost_date,
            division: cell(cols.division).as_text(),
            division_1_pct: parse_percent(cell(cols.division_1_pct)),
            division_2_pct: parse_percent(cell(cols.division_2_pct)),
            reasons: cell(cols.reasons).as_text(),
            status,
            closest,
        });
    }

    if deals.is_empty() && stats.rows_read > 0 {
        return Err(NormalizeError::NoKeyedRows {
            sheet: raw.sheet.clone(),
            column: config.columns.deal_name.trim().to_string(),
            rows: stats.rows_read,
        });
    }

    if stats.rows_dropped > 0 {
        log::info!("{}: dropped {} row(s) without a deal name", raw.sheet, stats.rows_dropped);
    }
    if stats.unparsed_dates > 0 || stats.unparsed_amounts > 0 {
        log::info!(
            "{}: {} unreadable date(s), {} unreadable amount(s) stored as null",
            raw.sheet,
            stats.unparsed_dates,
            stats.unparsed_amounts
        );
    }

    Ok(NormalizeOutput { deals, stats })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
