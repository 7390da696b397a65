// Store abstraction: the reconciler only reads column lists and key values,
// and writes through `apply`, which is all-or-nothing.

use std::collections::{HashMap, HashSet};

use crate::error::ReconError;
use crate::model::Value;
use crate::statement::Statement;

pub trait Store {
    /// Columns exposed by `table`, in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<String>, ReconError>;

    /// Every value currently held in `table.key`.
    fn key_values(&self, table: &str, key: &str) -> Result<Vec<Value>, ReconError>;

    /// Execute all statements in one transaction. On error nothing is kept.
    fn apply(&mut self, statements: &[Statement]) -> Result<(), ReconError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    not_null: HashSet<String>,
}

impl MemoryTable {
    fn index(&self, table: &str, column: &str) -> Result<usize, ReconError> {
        self.columns.iter().position(|c| c == column).ok_or_else(|| ReconError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    fn check_not_null(&self, table: &str, column: &str, value: &Value) -> Result<(), ReconError> {
        if value.is_null() && self.not_null.contains(column) {
            return Err(ReconError::Store {
                table: table.to_string(),
                message: format!("NOT NULL constraint failed: {table}.{column}"),
            });
        }
        Ok(())
    }
}

/// Table store held in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, MemoryTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, table: &str, columns: &[&str]) {
        self.tables.insert(
            table.to_string(),
            MemoryTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            },
        );
    }

    /// Declare a NOT NULL constraint on `table.column`.
    pub fn require_not_null(&mut self, table: &str, column: &str) {
        if let Some(t) = self.tables.get_mut(table) {
            t.not_null.insert(column.to_string());
        }
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// First row whose `key_column` matches `key`, as (column, value) pairs.
    pub fn find(&self, table: &str, key_column: &str, key: &Value) -> Option<Vec<(String, Value)>> {
        let t = self.tables.get(table)?;
        let idx = t.columns.iter().position(|c| c == key_column)?;
        let wanted = key.as_key()?;
        t.rows
            .iter()
            .find(|row| row[idx].as_key().as_ref() == Some(&wanted))
            .map(|row| t.columns.iter().cloned().zip(row.iter().cloned()).collect())
    }

    fn table(&self, table: &str) -> Result<&MemoryTable, ReconError> {
        self.tables.get(table).ok_or_else(|| ReconError::UnknownTable(table.to_string()))
    }
}

impl Store for MemoryStore {
    fn columns(&self, table: &str) -> Result<Vec<String>, ReconError> {
        Ok(self.table(table)?.columns.clone())
    }

    fn key_values(&self, table: &str, key: &str) -> Result<Vec<Value>, ReconError> {
        let t = self.table(table)?;
        let idx = t.index(table, key)?;
        Ok(t.rows.iter().map(|row| row[idx].clone()).collect())
    }

    fn apply(&mut self, statements: &[Statement]) -> Result<(), ReconError> {
        // Work on a copy and swap it in only when every statement succeeded.
        let mut staged = self.tables.clone();

        for stmt in statements {
            let name = stmt.table();
            let t = staged
                .get_mut(name)
                .ok_or_else(|| ReconError::UnknownTable(name.to_string()))?;

            match stmt {
                Statement::Update { key_column, key, assignments, .. } => {
                    let key_idx = t.index(name, key_column)?;
                    let mut targets = Vec::with_capacity(assignments.len());
                    for (column, value) in assignments {
                        t.check_not_null(name, column, value)?;
                        targets.push((t.index(name, column)?, value.normalized()));
                    }
                    let wanted = key.as_key();
                    for row in t.rows.iter_mut().filter(|r| r[key_idx].as_key() == wanted) {
                        for (idx, value) in &targets {
                            row[*idx] = value.clone();
                        }
                    }
                }
                Statement::Insert { columns, rows, .. } => {
                    let indices = columns
                        .iter()
                        .map(|c| t.index(name, c))
                        .collect::<Result<Vec<_>, _>>()?;
                    for values in rows {
                        let mut full = vec![Value::Null; t.columns.len()];
                        for (idx, value) in indices.iter().zip(values) {
                            full[*idx] = value.normalized();
                        }
                        for (column, value) in t.columns.iter().zip(&full) {
                            t.check_not_null(name, column, value)?;
                        }
                        t.rows.push(full);
                    }
                }
            }
        }

        self.tables = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create_table("t", &["id", "name"]);
        store.require_not_null("t", "name");
        store
    }

    #[test]
    fn insert_then_update() {
        let mut store = store();
        store
            .apply(&[Statement::Insert {
                table: "t".into(),
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec![Value::from(1), Value::from("a")]],
            }])
            .unwrap();
        store
            .apply(&[Statement::Update {
                table: "t".into(),
                key_column: "id".into(),
                key: Value::from(1),
                assignments: vec![("name".into(), Value::from("b"))],
            }])
            .unwrap();
        let row = store.find("t", "id", &Value::from(1)).unwrap();
        assert_eq!(row[1], ("name".to_string(), Value::from("b")));
    }

    #[test]
    fn failed_apply_leaves_tables_untouched() {
        let mut store = store();
        let err = store
            .apply(&[
                Statement::Insert {
                    table: "t".into(),
                    columns: vec!["id".into(), "name".into()],
                    rows: vec![vec![Value::from(1), Value::from("a")]],
                },
                Statement::Insert {
                    table: "t".into(),
                    columns: vec!["id".into()],
                    rows: vec![vec![Value::from(2)]],
                },
            ])
            .unwrap_err();
        assert!(err.to_string().contains("NOT NULL constraint failed: t.name"));
        assert_eq!(store.row_count("t"), 0);
    }

    #[test]
    fn unknown_table() {
        let store = store();
        assert!(matches!(store.columns("missing"), Err(ReconError::UnknownTable(_))));
    }
}
