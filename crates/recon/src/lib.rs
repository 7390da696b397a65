//! `dealdesk-recon`: key-partitioned upsert reconciliation.
//!
//! Receives a canonical batch and a store handle, splits the batch into
//! inserts and updates by a unique key and applies both in one transaction.
//! No CLI or spreadsheet dependencies.

pub mod engine;
pub mod error;
pub mod model;
pub mod sqlite;
pub mod statement;
pub mod store;

pub use engine::{append, reconcile};
pub use error::{DuplicateKey, ReconError};
pub use model::{Batch, Key, ReconOutcome, Value};
pub use sqlite::SqliteStore;
pub use statement::Statement;
pub use store::{MemoryStore, Store};
