// Parameterized write statements.
// Column names come from an allow-list; values always travel as parameters.

use crate::error::ReconError;
use crate::model::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `UPDATE table SET col = ?, ... WHERE key_column = ?`
    Update {
        table: String,
        key_column: String,
        key: Value,
        assignments: Vec<(String, Value)>,
    },
    /// Bulk insert; the SQL is prepared once and run per row.
    Insert {
        table: String,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Self::Update { table, .. } | Self::Insert { table, .. } => table,
        }
    }

    /// Render the statement as SQL with numbered placeholders.
    /// Identifiers are validated and double-quoted.
    pub fn to_sql(&self) -> Result<String, ReconError> {
        match self {
            Self::Update { table, key_column, assignments, .. } => {
                let mut set_clauses = Vec::with_capacity(assignments.len());
                for (i, (column, _)) in assignments.iter().enumerate() {
                    set_clauses.push(format!("{} = ?{}", quote_identifier(column)?, i + 1));
                }
                Ok(format!(
                    "UPDATE {} SET {} WHERE {} = ?{}",
                    quote_identifier(table)?,
                    set_clauses.join(", "),
                    quote_identifier(key_column)?,
                    assignments.len() + 1
                ))
            }
            Self::Insert { table, columns, .. } => {
                let quoted = columns
                    .iter()
                    .map(|c| quote_identifier(c))
                    .collect::<Result<Vec<_>, _>>()?;
                let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
                Ok(format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_identifier(table)?,
                    quoted.join(", "),
                    placeholders.join(", ")
                ))
            }
        }
    }

    /// Parameters for an `Update`, in placeholder order. Empty for `Insert`,
    /// whose parameters are its rows.
    pub fn update_params(&self) -> Vec<Value> {
        match self {
            Self::Update { key, assignments, .. } => assignments
                .iter()
                .map(|(_, v)| v.normalized())
                .chain(std::iter::once(key.normalized()))
                .collect(),
            Self::Insert { .. } => Vec::new(),
        }
    }
}

/// Accept only `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), ReconError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ReconError::InvalidIdentifier(name.to_string()))
    }
}

pub fn quote_identifier(name: &str) -> Result<String, ReconError> {
    validate_identifier(name)?;
    Ok(format!("\"{name}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sql_and_params() {
        let stmt = Statement::Update {
            table: "fact_deals".into(),
            key_column: "deal_name".into(),
            key: Value::from("Acme"),
            assignments: vec![
                ("deal_amount".into(), Value::Real(f64::NAN)),
                ("status".into(), Value::from("Won")),
            ],
        };
        assert_eq!(
            stmt.to_sql().unwrap(),
            r#"UPDATE "fact_deals" SET "deal_amount" = ?1, "status" = ?2 WHERE "deal_name" = ?3"#
        );
        assert_eq!(
            stmt.update_params(),
            vec![Value::Null, Value::from("Won"), Value::from("Acme")]
        );
    }

    #[test]
    fn insert_sql() {
        let stmt = Statement::Insert {
            table: "dim_date".into(),
            columns: vec!["full_date".into(), "year".into()],
            rows: vec![],
        };
        assert_eq!(
            stmt.to_sql().unwrap(),
            r#"INSERT INTO "dim_date" ("full_date", "year") VALUES (?1, ?2)"#
        );
    }

    #[test]
    fn rejects_injected_identifier() {
        assert!(validate_identifier("deal_name").is_ok());
        assert!(validate_identifier("_x9").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("9lives").is_err());
        assert!(validate_identifier("name; DROP TABLE x").is_err());
        assert!(validate_identifier("a\"b").is_err());
    }
}
