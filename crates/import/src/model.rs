use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use dealdesk_recon::{Batch, Value};

/// Persisted `fact_deals` columns, in table order.
pub const CANONICAL_COLUMNS: [&str; 18] = [
    "deal_name",
    "project_type",
    "deal_amount",
    "deal_received_date",
    "proposal_sent_date",
    "pending_date",
    "won_date",
    "lost_date",
    "division",
    "division_1_pct",
    "division_2_pct",
    "reasons",
    "status",
    "month",
    "week",
    "day",
    "quarter",
    "year",
];

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DealStatus {
    Won,
    Lost,
    Pending,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    #[serde(rename = "Preparing Proposal")]
    PreparingProposal,
}

impl DealStatus {
    /// First milestone present wins: won, lost, pending, proposal sent.
    pub fn derive(
        won: Option<NaiveDate>,
        lost: Option<NaiveDate>,
        pending: Option<NaiveDate>,
        proposal_sent: Option<NaiveDate>,
    ) -> Self {
        if won.is_some() {
            Self::Won
        } else if lost.is_some() {
            Self::Lost
        } else if pending.is_some() {
            Self::Pending
        } else if proposal_sent.is_some() {
            Self::ProposalSent
        } else {
            Self::PreparingProposal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Won => "Won",
            Self::Lost => "Lost",
            Self::Pending => "Pending",
            Self::ProposalSent => "Proposal Sent",
            Self::PreparingProposal => "Preparing Proposal",
        }
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Closest milestone date
// ---------------------------------------------------------------------------

/// Calendar parts of the milestone date nearest to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClosestDate {
    pub date: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    /// ISO-8601 week number.
    pub week: u32,
    pub day: u32,
}

impl ClosestDate {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            week: date.iso_week().week(),
            day: date.day(),
        }
    }

    /// The candidate with the smallest absolute day distance to `today`.
    /// Ties go to the earliest candidate in slice order; `None` when every
    /// candidate is null.
    pub fn nearest(candidates: &[Option<NaiveDate>], today: NaiveDate) -> Option<Self> {
        let mut best: Option<(i64, NaiveDate)> = None;
        for date in candidates.iter().flatten() {
            let distance = (*date - today).num_days().abs();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, *date));
            }
        }
        best.map(|(_, date)| Self::from_date(date))
    }
}

// ---------------------------------------------------------------------------
// Deal record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealRecord {
    pub deal_name: String,
    pub project_type: Option<String>,
    pub deal_amount: Option<f64>,
    pub deal_received_date: Option<NaiveDate>,
    pub proposal_sent_date: Option<NaiveDate>,
    pub pending_date: Option<NaiveDate>,
    pub won_date: Option<NaiveDate>,
    pub lost_date: Option<NaiveDate>,
    pub division: Option<String>,
    pub division_1_pct: Option<f64>,
    pub division_2_pct: Option<f64>,
    pub reasons: Option<String>,
    pub status: DealStatus,
    pub closest: Option<ClosestDate>,
}

impl DealRecord {
    pub fn canonical_columns() -> &'static [&'static str] {
        &CANONICAL_COLUMNS
    }

    /// Row values in `CANONICAL_COLUMNS` order.
    pub fn to_values(&self) -> Vec<Value> {
        let date = |d: Option<NaiveDate>| Value::from(d.map(|d| d.format("%Y-%m-%d").to_string()));
        let part = |f: fn(&ClosestDate) -> i64| Value::from(self.closest.as_ref().map(f));

        vec![
            Value::from(self.deal_name.as_str()),
            Value::from(self.project_type.clone()),
            Value::from(self.deal_amount),
            date(self.deal_received_date),
            date(self.proposal_sent_date),
            date(self.pending_date),
            date(self.won_date),
            date(self.lost_date),
            Value::from(self.division.clone()),
            Value::from(self.division_1_pct),
            Value::from(self.division_2_pct),
            Value::from(self.reasons.clone()),
            Value::from(self.status.label()),
            part(|c| c.month as i64),
            part(|c| c.week as i64),
            part(|c| c.day as i64),
            part(|c| c.quarter as i64),
            part(|c| c.year as i64),
        ]
    }
}

/// Records as a reconciler batch over `CANONICAL_COLUMNS`.
pub fn deals_to_batch(deals: &[DealRecord]) -> Batch {
    let mut batch = Batch::new(CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect());
    for deal in deals {
        batch.push(deal.to_values());
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn status_precedence() {
        let d = date(2024, 1, 1);
        assert_eq!(DealStatus::derive(d, d, d, d), DealStatus::Won);
        assert_eq!(DealStatus::derive(None, d, d, None), DealStatus::Lost);
        assert_eq!(DealStatus::derive(None, None, d, d), DealStatus::Pending);
        assert_eq!(DealStatus::derive(None, None, None, d), DealStatus::ProposalSent);
        assert_eq!(DealStatus::derive(None, None, None, None), DealStatus::PreparingProposal);
        assert_eq!(DealStatus::PreparingProposal.to_string(), "Preparing Proposal");
    }

    #[test]
    fn status_serializes_as_label() {
        assert_eq!(serde_json::to_string(&DealStatus::ProposalSent).unwrap(), "\"Proposal Sent\"");
        assert_eq!(serde_json::to_string(&DealStatus::Won).unwrap(), "\"Won\"");
    }

    #[test]
    fn nearest_picks_won_over_pending() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let closest = ClosestDate::nearest(&[date(2024, 1, 10), date(2024, 3, 1), None, None], today).unwrap();
        assert_eq!(closest.date, date(2024, 1, 10).unwrap());
        assert_eq!((closest.year, closest.quarter, closest.month, closest.day), (2024, 1, 1, 10));
        assert_eq!(closest.week, 2);
    }

    #[test]
    fn nearest_tie_keeps_first() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        // 5 days before and 5 days after
        let closest = ClosestDate::nearest(&[None, date(2024, 6, 20), date(2024, 6, 10), None], today).unwrap();
        assert_eq!(closest.date, date(2024, 6, 20).unwrap());
        assert!(ClosestDate::nearest(&[None, None, None, None], today).is_none());
    }

    #[test]
    fn iso_week_at_year_boundary() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020
        let c = ClosestDate::from_date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!((c.year, c.week, c.quarter), (2021, 53, 1));
    }

    #[test]
    fn batch_columns_and_values() {
        let deal = DealRecord {
            deal_name: "Acme".into(),
            project_type: None,
            deal_amount: Some(1200.0),
            deal_received_date: None,
            proposal_sent_date: None,
            pending_date: None,
            won_date: date(2024, 1, 10),
            lost_date: None,
            division: Some("East".into()),
            division_1_pct: Some(0.6),
            division_2_pct: None,
            reasons: None,
            status: DealStatus::Won,
            closest: date(2024, 1, 10).map(ClosestDate::from_date),
        };
        let batch = deals_to_batch(&[deal]);
        assert_eq!(batch.columns.len(), 18);
        assert_eq!(batch.columns, DealRecord::canonical_columns());

        let row = &batch.rows[0];
        assert_eq!(row[0], Value::Text("Acme".into()));
        assert_eq!(row[1], Value::Null);
        assert_eq!(row[2], Value::Real(1200.0));
        assert_eq!(row[6], Value::Text("2024-01-10".into()));
        assert_eq!(row[12], Value::Text("Won".into()));
        assert_eq!(&row[13..], &[
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(10),
            Value::Integer(1),
            Value::Integer(2024),
        ]);
    }
}
