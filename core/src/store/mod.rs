//! SQLite persistence for pipeline outputs.
//!
//! RULE: Only the store talks to the database.
//! Engines never see SQL; they return tables and the caller persists them.

use crate::{
    engine::PipelineOutputs,
    error::PipelineResult,
    event::{EventLogEntry, PipelineEvent},
    ledger::format_timestamp,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

mod retention;
mod risk;
mod segments;

pub struct OutputStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl OutputStore {
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PipelineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_outputs.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        version: &str,
        reference_date: Option<NaiveDateTime>,
    ) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, version, reference_date) VALUES (?1, ?2, ?3)",
            params![run_id, version, reference_date.as_ref().map(format_timestamp)],
        )?;
        Ok(())
    }

    pub fn run_count(&self) -> PipelineResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM run", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Persist every output table of one run atomically.
    pub fn save_outputs(&self, run_id: &str, outputs: &PipelineOutputs) -> PipelineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        risk::insert_scored_transactions(&tx, run_id, &outputs.scored)?;
        risk::insert_top_suspicious(&tx, run_id, &outputs.top_suspicious)?;
        risk::insert_customer_risk(&tx, run_id, &outputs.customer_risk)?;
        segments::insert_segments(&tx, run_id, &outputs.segments)?;
        retention::insert_retention(&tx, run_id, &outputs.retention)?;
        for (seq, event) in outputs.events.iter().enumerate() {
            append_event(&tx, run_id, seq as u64, event)?;
        }
        tx.commit()?;

        log::info!(
            "store: saved run {run_id} ({} transactions, {} customers, {} months)",
            outputs.scored.len(),
            outputs.segments.len(),
            outputs.retention.len()
        );
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn events_for_run(&self, run_id: &str) -> PipelineResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    seq:        row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn append_event(
    conn: &Connection,
    run_id: &str,
    seq: u64,
    event: &PipelineEvent,
) -> PipelineResult<()> {
    conn.execute(
        "INSERT INTO event_log (run_id, seq, event_type, payload) VALUES (?1, ?2, ?3, ?4)",
        params![run_id, seq as i64, event.type_name(), serde_json::to_string(event)?],
    )?;
    Ok(())
}
