//! Pre-sales deal workbook normalization.
//!
//! [`normalize`] turns the raw deal sheet read by `dealdesk-io` into
//! [`DealRecord`]s; [`deals_to_batch`] hands them to the reconciler.

pub mod config;
pub mod date_dim;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod schema;

pub use config::{ColumnMapping, ImportConfig};
pub use date_dim::date_dimension;
pub use error::NormalizeError;
pub use model::{deals_to_batch, ClosestDate, DealRecord, DealStatus, CANONICAL_COLUMNS};
pub use normalize::{normalize, NormalizeOutput, NormalizeStats};
pub use schema::ensure_schema;
