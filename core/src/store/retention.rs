use super::OutputStore;
use crate::{error::PipelineResult, export::RetentionRow, retention::MonthlyRetention};
use rusqlite::{params, Connection};

pub(super) fn insert_retention(
    conn: &Connection,
    run_id: &str,
    retention: &[MonthlyRetention],
) -> PipelineResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO monthly_retention (
            run_id, year_month, active_customers, retained_next_month, retention_rate_next_month
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for m in retention {
        let r = RetentionRow::from(m);
        stmt.execute(params![
            run_id,
            r.year_month,
            r.active_customers as i64,
            r.retained_next_month as i64,
            r.retention_rate_next_month,
        ])?;
    }
    Ok(())
}

impl OutputStore {
    // ── Retention ──────────────────────────────────────────────

    /// Stored retention rows in month order.
    pub fn retention_rows(&self, run_id: &str) -> PipelineResult<Vec<RetentionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT year_month, active_customers, retained_next_month, retention_rate_next_month
             FROM monthly_retention WHERE run_id = ?1 ORDER BY year_month ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(RetentionRow {
                    year_month:                row.get(0)?,
                    active_customers:          row.get::<_, i64>(1)? as u64,
                    retained_next_month:       row.get::<_, i64>(2)? as u64,
                    retention_rate_next_month: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
