// Target tables for deal imports

use dealdesk_recon::{ReconError, SqliteStore};

pub const FACT_DEALS_TABLE: &str = "fact_deals";

pub const FACT_DEALS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS fact_deals (
    deal_name          TEXT PRIMARY KEY,
    project_type       TEXT,
    deal_amount        REAL,
    deal_received_date TEXT,
    proposal_sent_date TEXT,
    pending_date       TEXT,
    won_date           TEXT,
    lost_date          TEXT,
    division           TEXT,
    division_1_pct     REAL,
    division_2_pct     REAL,
    reasons            TEXT,
    status             TEXT NOT NULL,
    month              INTEGER,
    week               INTEGER,
    day                INTEGER,
    quarter            INTEGER,
    year               INTEGER
);
"#;

pub const DIM_DATE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS dim_date (
    full_date TEXT PRIMARY KEY,
    year      INTEGER NOT NULL,
    quarter   INTEGER NOT NULL,
    month     INTEGER NOT NULL,
    week      INTEGER NOT NULL,
    day       INTEGER NOT NULL,
    day_name  TEXT NOT NULL
);
"#;

/// Create `fact_deals` and `dim_date` if they don't exist yet.
pub fn ensure_schema(store: &SqliteStore) -> Result<(), ReconError> {
    store.execute_batch(FACT_DEALS_DDL)?;
    store.execute_batch(DIM_DATE_DDL)?;
    log::debug!("schema ready");
    Ok(())
}
