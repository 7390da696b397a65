use std::fmt;

use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single scalar as the store sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// NaN counts as null: it is written as an explicit NULL.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Real(n) => n.is_nan(),
            _ => false,
        }
    }

    /// The value to hand to the store, with NaN collapsed to `Null`.
    pub fn normalized(&self) -> Value {
        if self.is_null() {
            Value::Null
        } else {
            self.clone()
        }
    }

    /// Reconciliation key for this value. Integral reals compare equal to
    /// the matching integer. Nulls have no key.
    pub fn as_key(&self) -> Option<Key> {
        match self {
            Self::Null => None,
            Self::Integer(n) => Some(Key::Integer(*n)),
            Self::Real(n) if n.is_nan() => None,
            Self::Real(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Some(Key::Integer(*n as i64)),
            Self::Real(n) => Some(Key::Real(n.to_bits())),
            Self::Text(s) => Some(Key::Text(s.clone())),
        }
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map(Value::Text).unwrap_or(Value::Null)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Real).unwrap_or(Value::Null)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map(Value::Integer).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

/// Hashable form of a key column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Integer(i64),
    /// Bit pattern of a non-integral real.
    Real(u64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A canonical table: named columns and rows of values in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Batch {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Every row must carry exactly one value per column.
    pub fn check_shape(&self) -> Result<(), ReconError> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(ReconError::RowShape {
                    row: i,
                    expected: self.columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// Update rows with no non-key column; left untouched.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_null() {
        assert!(Value::Real(f64::NAN).is_null());
        assert_eq!(Value::Real(f64::NAN).normalized(), Value::Null);
        assert!(!Value::Real(0.0).is_null());
        assert!(!Value::Text(String::new()).is_null());
    }

    #[test]
    fn integral_real_key_matches_integer() {
        assert_eq!(Value::Real(42.0).as_key(), Value::Integer(42).as_key());
        assert_eq!(Value::Real(1.5).as_key(), Some(Key::Real(1.5f64.to_bits())));
        assert_ne!(Value::Real(1.5).as_key(), Value::from("1.5").as_key());
        assert_eq!(Value::Real(1.5).as_key().unwrap().to_string(), "1.5");
        assert_eq!(Value::Null.as_key(), None);
    }

    #[test]
    fn check_shape_reports_row() {
        let mut batch = Batch::new(vec!["a".into(), "b".into()]);
        batch.push(vec![Value::from(1), Value::from(2)]);
        batch.push(vec![Value::from(3)]);
        let err = batch.check_shape().unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }
}
