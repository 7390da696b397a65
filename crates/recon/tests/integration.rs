use dealdesk_recon::{reconcile, Batch, ReconError, ReconOutcome, SqliteStore, Store, Value};

const SCHEMA: &str = r#"
CREATE TABLE fact_deals (
    deal_name TEXT PRIMARY KEY,
    deal_amount REAL,
    status TEXT NOT NULL,
    reasons TEXT
);
"#;

fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
    let store = SqliteStore::open(&dir.path().join("deals.db")).unwrap();
    store.execute_batch(SCHEMA).unwrap();
    store
}

fn deal(name: &str, amount: Option<f64>, status: Option<&str>, reasons: Option<&str>) -> Vec<Value> {
    vec![
        Value::from(name),
        Value::from(amount),
        Value::from(status.map(String::from)),
        Value::from(reasons.map(String::from)),
    ]
}

fn batch(rows: Vec<Vec<Value>>) -> Batch {
    Batch {
        columns: vec![
            "deal_name".into(),
            "deal_amount".into(),
            "status".into(),
            "reasons".into(),
        ],
        rows,
    }
}

fn column(store: &SqliteStore, name: &str, column: &str) -> Value {
    let row = store
        .fetch_row("fact_deals", "deal_name", &Value::from(name))
        .unwrap()
        .unwrap_or_else(|| panic!("row {name} missing"));
    row.into_iter()
        .find(|(c, _)| c == column)
        .map(|(_, v)| v)
        .unwrap()
}

fn seed(store: &mut SqliteStore) {
    let first = batch(vec![deal("Acme", Some(100.0), Some("Pending"), Some("budget"))]);
    let outcome = reconcile(&first, store, "fact_deals", "deal_name").unwrap();
    assert_eq!(outcome.inserted, 1);
}

// -------------------------------------------------------------------------
// Partitioning
// -------------------------------------------------------------------------

#[test]
fn one_existing_two_new() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    seed(&mut store);

    let incoming = batch(vec![
        deal("Acme", Some(150.0), Some("Won"), None),
        deal("Globex", Some(200.0), Some("Proposal Sent"), None),
        deal("Initech", None, Some("Preparing Proposal"), Some("new lead")),
    ]);
    let outcome = reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap();

    assert_eq!(outcome, ReconOutcome { inserted: 2, updated: 1, skipped: 0 });
    assert_eq!(store.row_count("fact_deals").unwrap(), 3);

    let mut keys: Vec<Value> = store.key_values("fact_deals", "deal_name").unwrap();
    keys.sort_by_key(|v| format!("{v:?}"));
    assert_eq!(keys, vec![Value::from("Acme"), Value::from("Globex"), Value::from("Initech")]);

    assert_eq!(column(&store, "Acme", "deal_amount"), Value::Real(150.0));
    assert_eq!(column(&store, "Acme", "status"), Value::from("Won"));
    assert_eq!(column(&store, "Initech", "reasons"), Value::from("new lead"));
}

#[test]
fn rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let incoming = batch(vec![
        deal("Acme", Some(150.0), Some("Won"), None),
        deal("Globex", Some(200.0), Some("Lost"), Some("price")),
    ]);
    let first = reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap();
    assert_eq!(first, ReconOutcome { inserted: 2, updated: 0, skipped: 0 });

    let before: Vec<_> = ["Acme", "Globex"]
        .iter()
        .map(|k| store.fetch_row("fact_deals", "deal_name", &Value::from(*k)).unwrap())
        .collect();

    let second = reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap();
    assert_eq!(second, ReconOutcome { inserted: 0, updated: 2, skipped: 0 });

    let after: Vec<_> = ["Acme", "Globex"]
        .iter()
        .map(|k| store.fetch_row("fact_deals", "deal_name", &Value::from(*k)).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(store.row_count("fact_deals").unwrap(), 2);
}

// -------------------------------------------------------------------------
// Nulls
// -------------------------------------------------------------------------

#[test]
fn null_overwrites_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    seed(&mut store);

    let incoming = batch(vec![deal("Acme", None, Some("Pending"), None)]);
    reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap();

    assert_eq!(column(&store, "Acme", "deal_amount"), Value::Null);
    assert_eq!(column(&store, "Acme", "reasons"), Value::Null);
}

#[test]
fn nan_amount_stored_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let incoming = batch(vec![deal("Acme", Some(f64::NAN), Some("Won"), None)]);
    reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap();

    assert_eq!(column(&store, "Acme", "deal_amount"), Value::Null);
}

// -------------------------------------------------------------------------
// Atomicity
// -------------------------------------------------------------------------

#[test]
fn failed_update_rolls_back_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    seed(&mut store);
    let hooli = batch(vec![deal("Hooli", Some(5.0), Some("Pending"), None)]);
    reconcile(&hooli, &mut store, "fact_deals", "deal_name").unwrap();

    // Hooli updates fine, then the Acme update violates NOT NULL on status;
    // Globex would have been inserted afterwards.
    let incoming = batch(vec![
        deal("Hooli", Some(6.0), Some("Won"), None),
        deal("Acme", Some(999.0), None, None),
        deal("Globex", Some(200.0), Some("Won"), None),
    ]);
    let err = reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap_err();

    assert!(matches!(err, ReconError::Store { ref table, .. } if table == "fact_deals"));
    assert_eq!(store.row_count("fact_deals").unwrap(), 2);
    assert_eq!(column(&store, "Acme", "deal_amount"), Value::Real(100.0));
    assert_eq!(column(&store, "Hooli", "deal_amount"), Value::Real(5.0));
    assert_eq!(column(&store, "Hooli", "status"), Value::from("Pending"));
    assert!(store
        .fetch_row("fact_deals", "deal_name", &Value::from("Globex"))
        .unwrap()
        .is_none());
}

#[test]
fn duplicate_keys_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let incoming = batch(vec![
        deal("Acme", Some(1.0), Some("Won"), None),
        deal("Acme", Some(2.0), Some("Lost"), None),
    ]);
    let err = reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap_err();

    assert!(err.to_string().contains("Acme"));
    assert_eq!(store.row_count("fact_deals").unwrap(), 0);
}

#[test]
fn missing_table_reported_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::open(&dir.path().join("empty.db")).unwrap();

    let incoming = batch(vec![deal("Acme", None, Some("Won"), None)]);
    let err = reconcile(&incoming, &mut store, "fact_deals", "deal_name").unwrap_err();
    assert_eq!(err.to_string(), "table 'fact_deals' does not exist");
}
