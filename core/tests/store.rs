//! Output store: SQLite persistence of a pipeline run.

use chrono::NaiveDate;
use ledgerscope_core::{
    engine::{Pipeline, PipelineOutputs},
    generator::{generate_ledger, GeneratorConfig},
    scoring::RiskLevel,
    store::OutputStore,
};

/// Route core logs through the test harness; RUST_LOG=debug shows them.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn outputs() -> PipelineOutputs {
    init_logging();
    let mut config = GeneratorConfig::new(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    config.seed = 11;
    config.customers = 60;
    Pipeline::default().run(&generate_ledger(&config)).expect("pipeline run")
}

fn store_with_run(run_id: &str, outputs: &PipelineOutputs) -> OutputStore {
    let store = OutputStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_run(run_id, "0.1.0-test", outputs.reference_date).expect("insert run");
    store.save_outputs(run_id, outputs).expect("save outputs");
    store
}

/// Every table lands with one row per output row.
#[test]
fn saved_row_counts_match_outputs() {
    let outputs = outputs();
    let store = store_with_run("store-counts", &outputs);

    assert_eq!(store.run_count().unwrap(), 1);
    assert_eq!(store.scored_transaction_count("store-counts").unwrap(), outputs.scored.len() as i64);
    assert_eq!(store.customer_risk_count("store-counts").unwrap(), outputs.customer_risk.len() as i64);
    assert_eq!(store.segment_row_count("store-counts").unwrap(), outputs.segments.len() as i64);
    assert_eq!(store.retention_rows("store-counts").unwrap().len(), outputs.retention.len());
}

/// A customer summary reads back field for field.
#[test]
fn customer_risk_round_trips() {
    let outputs = outputs();
    let store = store_with_run("store-risk", &outputs);

    let expected = &outputs.customer_risk[0];
    let got = store
        .customer_risk("store-risk", expected.customer_id)
        .unwrap()
        .expect("summary row present");
    assert_eq!(&got, expected);

    assert!(store.customer_risk("store-risk", -1).unwrap().is_none());
}

/// The top-N view keeps its rank order.
#[test]
fn top_suspicious_keeps_rank_order() {
    let outputs = outputs();
    let store = store_with_run("store-top", &outputs);

    let expected: Vec<i64> = outputs
        .top_suspicious
        .iter()
        .map(|s| s.flagged.aggregated.transaction.transaction_id)
        .collect();
    assert_eq!(store.top_suspicious_ids("store-top").unwrap(), expected);
}

/// Level and segment distributions add up to the table sizes.
#[test]
fn distributions_add_up() {
    let outputs = outputs();
    let store = store_with_run("store-dist", &outputs);

    let levels = store.risk_level_counts("store-dist").unwrap();
    let total: i64 = levels.iter().map(|(_, n)| n).sum();
    assert_eq!(total, outputs.scored.len() as i64);
    assert!(levels.iter().all(|(l, _)| RiskLevel::from_label(l).is_some()));

    let segments = store.segment_counts("store-dist").unwrap();
    let total: i64 = segments.iter().map(|(_, n)| n).sum();
    assert_eq!(total, outputs.segments.len() as i64);
}

/// Retention rows read back in month order with their rates.
#[test]
fn retention_rows_round_trip() {
    let outputs = outputs();
    let store = store_with_run("store-ret", &outputs);

    let rows = store.retention_rows("store-ret").unwrap();
    for (row, m) in rows.iter().zip(&outputs.retention) {
        assert_eq!(row.year_month, m.year_month.to_string());
        assert_eq!(row.active_customers, m.active_customers);
        assert_eq!(row.retention_rate_next_month, m.retention_rate_next_month);
    }
}

/// The event log is persisted in sequence order.
#[test]
fn events_are_persisted_in_order() {
    let outputs = outputs();
    let store = store_with_run("store-events", &outputs);

    let entries = store.events_for_run("store-events").unwrap();
    assert_eq!(entries.len(), outputs.events.len());
    for (i, (entry, event)) in entries.iter().zip(&outputs.events).enumerate() {
        assert_eq!(entry.seq, i as u64);
        assert_eq!(entry.event_type, event.type_name());
        assert_eq!(entry.payload, serde_json::to_string(event).unwrap());
    }
}

/// Saving the same run twice violates the primary keys and leaves the
/// first save intact.
#[test]
fn duplicate_save_is_rejected_atomically() {
    let outputs = outputs();
    let store = store_with_run("store-dup", &outputs);

    assert!(store.save_outputs("store-dup", &outputs).is_err());
    assert_eq!(store.scored_transaction_count("store-dup").unwrap(), outputs.scored.len() as i64);
    assert_eq!(store.events_for_run("store-dup").unwrap().len(), outputs.events.len());
}

/// A file-backed store survives reopening.
#[test]
fn file_store_persists_across_connections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("run.db");
    let path = path.to_str().expect("utf-8 path");
    let outputs = outputs();

    {
        let store = OutputStore::open(path).unwrap();
        store.migrate().unwrap();
        store.insert_run("file-run", "0.1.0-test", outputs.reference_date).unwrap();
        store.save_outputs("file-run", &outputs).unwrap();
        assert_eq!(store.path(), Some(path));
    }

    let reopened = OutputStore::open(path).unwrap();
    reopened.migrate().expect("migrations are idempotent");
    assert_eq!(reopened.run_count().unwrap(), 1);
    assert_eq!(reopened.segment_row_count("file-run").unwrap(), outputs.segments.len() as i64);
}
