use std::collections::HashSet;

use serde::Deserialize;

use dealdesk_recon::statement::validate_identifier;

use crate::error::NormalizeError;
use crate::model::CANONICAL_COLUMNS;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Where the deal sheet lives and how its labels map onto canonical names.
///
/// Every field defaults to the pre-sales workbook layout, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub sheet: String,
    /// Absolute 0-based row holding the column labels.
    pub header_row: usize,
    /// Target table.
    pub table: String,
    /// Reconciliation key column in the target table.
    pub key: String,
    pub columns: ColumnMapping,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sheet: "Official Deal".into(),
            header_row: 1,
            table: "fact_deals".into(),
            key: "deal_name".into(),
            columns: ColumnMapping::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Canonical field name → source header label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub deal_name: String,
    pub project_type: String,
    pub deal_amount: String,
    pub deal_received_date: String,
    pub proposal_sent_date: String,
    pub pending_date: String,
    pub lost_date: String,
    pub won_date: String,
    pub division: String,
    pub division_1_pct: String,
    pub division_2_pct: String,
    pub reasons: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            deal_name: "Deal Name".into(),
            project_type: "Project Type".into(),
            deal_amount: "Deal Amount".into(),
            deal_received_date: "Deal Received(MM/DD/YY)".into(),
            proposal_sent_date: "Proposal Sent".into(),
            pending_date: "Pending".into(),
            lost_date: "Lost/Canceled".into(),
            won_date: "Won".into(),
            division: "Division".into(),
            division_1_pct: "Division 1 - %".into(),
            division_2_pct: "Division 2 - %".into(),
            reasons: "Reasons".into(),
        }
    }
}

impl ColumnMapping {
    /// (canonical name, source label) pairs in source-sheet order.
    pub fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("deal_name", &self.deal_name),
            ("project_type", &self.project_type),
            ("deal_amount", &self.deal_amount),
            ("deal_received_date", &self.deal_received_date),
            ("proposal_sent_date", &self.proposal_sent_date),
            ("pending_date", &self.pending_date),
            ("lost_date", &self.lost_date),
            ("won_date", &self.won_date),
            ("division", &self.division),
            ("division_1_pct", &self.division_1_pct),
            ("division_2_pct", &self.division_2_pct),
            ("reasons", &self.reasons),
        ]
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImportConfig {
    pub fn from_toml(input: &str) -> Result<Self, NormalizeError> {
        let config: ImportConfig =
            toml::from_str(input).map_err(|e| NormalizeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NormalizeError> {
        if self.sheet.trim().is_empty() {
            return Err(NormalizeError::ConfigValidation("sheet must not be empty".into()));
        }

        validate_identifier(&self.table).map_err(|e| NormalizeError::ConfigValidation(format!("table: {e}")))?;
        validate_identifier(&self.key).map_err(|e| NormalizeError::ConfigValidation(format!("key: {e}")))?;

        if !CANONICAL_COLUMNS.contains(&self.key.as_str()) {
            return Err(NormalizeError::ConfigValidation(format!(
                "key '{}' is not a deal column",
                self.key
            )));
        }

        // Labels must be present and map to one field each
        let mut seen = HashSet::new();
        for (field, label) in self.columns.entries() {
            let label = label.trim();
            if label.is_empty() {
                return Err(NormalizeError::ConfigValidation(format!(
                    "columns.{field}: label must not be empty"
                )));
            }
            if !seen.insert(label) {
                return Err(NormalizeError::ConfigValidation(format!(
                    "columns.{field}: label '{label}' is mapped more than once"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = ImportConfig::from_toml("").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.sheet, "Official Deal");
        assert_eq!(config.header_row, 1);
        assert_eq!(config.columns.won_date, "Won");
    }

    #[test]
    fn override_single_label() {
        let config = ImportConfig::from_toml(
            r#"
sheet = "Deals 2025"
header_row = 0

[columns]
deal_received_date = "Received"
"#,
        )
        .unwrap();
        assert_eq!(config.sheet, "Deals 2025");
        assert_eq!(config.header_row, 0);
        assert_eq!(config.columns.deal_received_date, "Received");
        assert_eq!(config.columns.deal_name, "Deal Name");
    }

    #[test]
    fn rejects_unknown_field() {
        let err = ImportConfig::from_toml("[columns]\ndeal_nme = \"Name\"\n").unwrap_err();
        assert!(matches!(err, NormalizeError::ConfigParse(_)));
    }

    #[test]
    fn rejects_duplicate_label() {
        let err = ImportConfig::from_toml("[columns]\nwon_date = \"Pending\"\n").unwrap_err();
        assert!(err.to_string().contains("mapped more than once"));
    }

    #[test]
    fn rejects_bad_table_name() {
        let err = ImportConfig::from_toml("table = \"deals; drop\"\n").unwrap_err();
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn rejects_key_outside_deal_columns() {
        let err = ImportConfig::from_toml("key = \"owner\"\n").unwrap_err();
        assert!(err.to_string().contains("not a deal column"));
    }
}
