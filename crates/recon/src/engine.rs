use std::collections::{HashMap, HashSet};

use crate::error::{DuplicateKey, ReconError};
use crate::model::{Batch, Key, ReconOutcome, Value};
use crate::statement::{validate_identifier, Statement};
use crate::store::Store;

/// Partition `batch` into inserts and updates by `key` and apply both in one
/// transaction against `table`.
///
/// Keys already in the store are updated column by column (every non-key
/// column, nulls written as NULL); new keys are inserted in bulk. Rows whose
/// only column is the key are skipped. Any store failure aborts the whole
/// batch.
pub fn reconcile<S: Store + ?Sized>(
    batch: &Batch,
    store: &mut S,
    table: &str,
    key: &str,
) -> Result<ReconOutcome, ReconError> {
    let key_idx = validate_batch(batch, &*store, table, key)?;

    if batch.is_empty() {
        log::info!("{table}: empty batch, nothing to reconcile");
        return Ok(ReconOutcome::default());
    }

    let keys = batch_keys(batch, table, key, key_idx)?;

    // Current key set in the store
    let existing: HashSet<Key> = store
        .key_values(table, key)?
        .iter()
        .filter_map(Value::as_key)
        .collect();

    let mut statements = Vec::new();
    let mut insert_rows: Vec<Vec<Value>> = Vec::new();
    let mut outcome = ReconOutcome::default();

    for (row, row_key) in batch.rows.iter().zip(&keys) {
        if existing.contains(row_key) {
            let assignments: Vec<(String, Value)> = batch
                .columns
                .iter()
                .zip(row)
                .enumerate()
                .filter(|(i, _)| *i != key_idx)
                .map(|(_, (column, value))| (column.clone(), value.normalized()))
                .collect();

            if assignments.is_empty() {
                outcome.skipped += 1;
                continue;
            }

            statements.push(Statement::Update {
                table: table.to_string(),
                key_column: key.to_string(),
                key: row[key_idx].clone(),
                assignments,
            });
            outcome.updated += 1;
        } else {
            insert_rows.push(row.iter().map(Value::normalized).collect());
        }
    }

    outcome.inserted = insert_rows.len();
    if !insert_rows.is_empty() {
        statements.push(Statement::Insert {
            table: table.to_string(),
            columns: batch.columns.clone(),
            rows: insert_rows,
        });
    }

    log::info!(
        "{table}: {} to insert, {} to update, {} skipped (store has {} keys)",
        outcome.inserted,
        outcome.updated,
        outcome.skipped,
        existing.len()
    );

    if !statements.is_empty() {
        store.apply(&statements)?;
    }

    Ok(outcome)
}

/// Insert every row of `batch` into `table` in one transaction, without
/// looking at existing keys. Returns the number of rows inserted.
pub fn append<S: Store + ?Sized>(batch: &Batch, store: &mut S, table: &str) -> Result<usize, ReconError> {
    validate_identifier(table)?;
    batch.check_shape()?;
    check_columns(batch, &store.columns(table)?, table)?;

    if batch.is_empty() {
        return Ok(0);
    }

    store.apply(&[Statement::Insert {
        table: table.to_string(),
        columns: batch.columns.clone(),
        rows: batch
            .rows
            .iter()
            .map(|row| row.iter().map(Value::normalized).collect())
            .collect(),
    }])?;

    log::info!("{table}: appended {} rows", batch.len());
    Ok(batch.len())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check identifiers, shape and the column allow-list. Returns the key's
/// position in the batch.
fn validate_batch<S: Store + ?Sized>(
    batch: &Batch,
    store: &S,
    table: &str,
    key: &str,
) -> Result<usize, ReconError> {
    validate_identifier(table)?;
    validate_identifier(key)?;
    batch.check_shape()?;

    let key_idx = batch.column_index(key).ok_or_else(|| ReconError::UnknownColumn {
        table: table.to_string(),
        column: key.to_string(),
    })?;

    let store_columns = store.columns(table)?;
    if !store_columns.iter().any(|c| c == key) {
        return Err(ReconError::UnknownColumn {
            table: table.to_string(),
            column: key.to_string(),
        });
    }
    check_columns(batch, &store_columns, table)?;

    Ok(key_idx)
}

fn check_columns(batch: &Batch, store_columns: &[String], table: &str) -> Result<(), ReconError> {
    for column in &batch.columns {
        validate_identifier(column)?;
        if !store_columns.contains(column) {
            return Err(ReconError::UnknownColumn {
                table: table.to_string(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}

/// Keys of every batch row, in row order. Null keys and duplicates are errors.
fn batch_keys(batch: &Batch, table: &str, key: &str, key_idx: usize) -> Result<Vec<Key>, ReconError> {
    let mut keys = Vec::with_capacity(batch.len());
    for (i, row) in batch.rows.iter().enumerate() {
        let k = row[key_idx].as_key().ok_or_else(|| ReconError::NullKey {
            table: table.to_string(),
            column: key.to_string(),
            row: i,
        })?;
        keys.push(k);
    }

    let mut counts: HashMap<&Key, usize> = HashMap::new();
    for k in &keys {
        *counts.entry(k).or_insert(0) += 1;
    }
    let mut duplicates: Vec<DuplicateKey> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(k, count)| DuplicateKey { key: k.to_string(), count })
        .collect();

    if !duplicates.is_empty() {
        duplicates.sort_by(|a, b| a.key.cmp(&b.key));
        return Err(ReconError::DuplicateKeys {
            table: table.to_string(),
            keys: duplicates,
        });
    }

    Ok(keys)
}
