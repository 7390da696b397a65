// SQLite-backed store

use std::path::Path;

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::error::ReconError;
use crate::model::Value;
use crate::statement::{quote_identifier, Statement};
use crate::store::Store;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Real(n) if n.is_nan() => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Value::Real(n) => ToSqlOutput::Owned(SqlValue::Real(*n)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(n) => Value::Integer(n),
        SqlValue::Real(n) => Value::Real(n),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, ReconError> {
        let conn = Connection::open(path).map_err(|e| ReconError::Store {
            table: String::new(),
            message: format!("cannot open {}: {e}", path.display()),
        })?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, ReconError> {
        let conn = Connection::open_in_memory().map_err(|e| ReconError::store("", e))?;
        Ok(Self { conn })
    }

    /// Run a batch of DDL (e.g. `CREATE TABLE IF NOT EXISTS ...`).
    pub fn execute_batch(&self, sql: &str) -> Result<(), ReconError> {
        self.conn.execute_batch(sql).map_err(|e| ReconError::store("", e))
    }

    pub fn row_count(&self, table: &str) -> Result<usize, ReconError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table)?);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| ReconError::store(table, e))?;
        Ok(count as usize)
    }

    /// The row whose `key_column` equals `key`, as (column, value) pairs.
    pub fn fetch_row(
        &self,
        table: &str,
        key_column: &str,
        key: &Value,
    ) -> Result<Option<Vec<(String, Value)>>, ReconError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_identifier(table)?,
            quote_identifier(key_column)?
        );
        let mut stmt = self.conn.prepare(&sql).map_err(|e| ReconError::store(table, e))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        stmt.query_row([key], |row| {
            let mut out = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                out.push((name.clone(), from_sql(row.get::<_, SqlValue>(i)?)));
            }
            Ok(out)
        })
        .optional()
        .map_err(|e| ReconError::store(table, e))
    }
}

impl Store for SqliteStore {
    fn columns(&self, table: &str) -> Result<Vec<String>, ReconError> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(table)?);
        let mut stmt = self.conn.prepare(&sql).map_err(|e| ReconError::store(table, e))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| ReconError::store(table, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReconError::store(table, e))?;
        if columns.is_empty() {
            return Err(ReconError::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }

    fn key_values(&self, table: &str, key: &str) -> Result<Vec<Value>, ReconError> {
        let sql = format!("SELECT {} FROM {}", quote_identifier(key)?, quote_identifier(table)?);
        let mut stmt = self.conn.prepare(&sql).map_err(|e| ReconError::store(table, e))?;
        let values = stmt
            .query_map([], |row| row.get::<_, SqlValue>(0))
            .map_err(|e| ReconError::store(table, e))?
            .map(|v| v.map(from_sql))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReconError::store(table, e))?;
        Ok(values)
    }

    fn apply(&mut self, statements: &[Statement]) -> Result<(), ReconError> {
        // Dropping `tx` without commit rolls back.
        let tx = self.conn.transaction().map_err(|e| ReconError::store("", e))?;

        for stmt in statements {
            let table = stmt.table();
            let sql = stmt.to_sql()?;
            log::trace!("{sql}");
            match stmt {
                Statement::Update { .. } => {
                    // Every update of a batch renders the same SQL
                    let mut prepared = tx.prepare_cached(&sql).map_err(|e| ReconError::store(table, e))?;
                    prepared
                        .execute(params_from_iter(stmt.update_params()))
                        .map_err(|e| ReconError::store(table, e))?;
                }
                Statement::Insert { rows, .. } => {
                    let mut prepared = tx.prepare(&sql).map_err(|e| ReconError::store(table, e))?;
                    for row in rows {
                        prepared
                            .execute(params_from_iter(row.iter()))
                            .map_err(|e| ReconError::store(table, e))?;
                    }
                }
            }
        }

        tx.commit().map_err(|e| ReconError::store("", e))
    }
}
