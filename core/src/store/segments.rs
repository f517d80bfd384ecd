use super::OutputStore;
use crate::{error::PipelineResult, export::CustomerSegmentRow, rfm::CustomerSegment};
use rusqlite::{params, Connection};

pub(super) fn insert_segments(
    conn: &Connection,
    run_id: &str,
    segments: &[CustomerSegment],
) -> PipelineResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO customer_segment (
            run_id, customer_id, signup_date, last_purchase, first_purchase,
            txn_count, total_spend, avg_txn_value, recency_days, tenure_days,
            purchase_frequency_per_month, clv_simple, is_churn_risk, r, f, m, segment
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
    )?;
    for s in segments {
        let r = CustomerSegmentRow::from(s);
        stmt.execute(params![
            run_id,
            r.customer_id,
            r.signup_date,
            r.last_purchase,
            r.first_purchase,
            r.txn_count as i64,
            r.total_spend,
            r.avg_txn_value,
            r.recency_days,
            r.tenure_days,
            r.purchase_frequency_per_month,
            r.clv_simple,
            r.is_churn_risk,
            r.r,
            r.f,
            r.m,
            r.segment,
        ])?;
    }
    Ok(())
}

impl OutputStore {
    // ── Segments ───────────────────────────────────────────────

    pub fn segment_row_count(&self, run_id: &str) -> PipelineResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM customer_segment WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// (segment label, customer count), largest first.
    pub fn segment_counts(&self, run_id: &str) -> PipelineResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT segment, COUNT(*) AS n FROM customer_segment
             WHERE run_id = ?1 GROUP BY segment ORDER BY n DESC, segment ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
