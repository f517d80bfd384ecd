use super::OutputStore;
use crate::{
    error::PipelineResult,
    export::TransactionRiskRow,
    risk_summary::CustomerRiskSummary,
    scoring::{RiskLevel, ScoredTransaction},
    types::CustomerId,
};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

pub(super) fn insert_scored_transactions(
    conn: &Connection,
    run_id: &str,
    scored: &[ScoredTransaction],
) -> PipelineResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO transaction_risk (
            run_id, transaction_id, customer_id, transaction_date, amount, category, region,
            cust_amt_mean, cust_amt_std, cust_txn_count, day, txns_that_day, z_score,
            flag_amount_anomaly, flag_high_amount, flag_velocity, flag_risky_category,
            risk_score, risk_level
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
    )?;
    for s in scored {
        let r = TransactionRiskRow::from(s);
        stmt.execute(params![
            run_id,
            r.transaction_id,
            r.customer_id,
            r.transaction_date,
            r.amount,
            r.category,
            r.region,
            r.cust_amt_mean,
            r.cust_amt_std,
            r.cust_txn_count as i64,
            r.day,
            r.txns_that_day,
            r.z_score,
            r.flag_amount_anomaly,
            r.flag_high_amount,
            r.flag_velocity,
            r.flag_risky_category,
            r.risk_score,
            r.risk_level,
        ])?;
    }
    Ok(())
}

pub(super) fn insert_top_suspicious(
    conn: &Connection,
    run_id: &str,
    top: &[ScoredTransaction],
) -> PipelineResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO top_suspicious (run_id, rank, transaction_id, risk_score)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (i, s) in top.iter().enumerate() {
        stmt.execute(params![
            run_id,
            (i + 1) as i64,
            s.flagged.aggregated.transaction.transaction_id,
            s.risk_score,
        ])?;
    }
    Ok(())
}

pub(super) fn insert_customer_risk(
    conn: &Connection,
    run_id: &str,
    summary: &[CustomerRiskSummary],
) -> PipelineResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO customer_risk_summary (
            run_id, customer_id, total_txns, total_spend, total_risk_score,
            max_risk_score, high_risk_txns, customer_risk_tier
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
    )?;
    for c in summary {
        stmt.execute(params![
            run_id,
            c.customer_id,
            c.total_txns as i64,
            c.total_spend,
            c.total_risk_score as i64,
            c.max_risk_score,
            c.high_risk_txns as i64,
            c.customer_risk_tier.as_str(),
        ])?;
    }
    Ok(())
}

impl OutputStore {
    // ── Transaction risk ───────────────────────────────────────

    pub fn scored_transaction_count(&self, run_id: &str) -> PipelineResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM transaction_risk WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn risk_level_counts(&self, run_id: &str) -> PipelineResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT risk_level, COUNT(*) FROM transaction_risk
             WHERE run_id = ?1 GROUP BY risk_level ORDER BY risk_level",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Transaction ids of the top-N view, best rank first.
    pub fn top_suspicious_ids(&self, run_id: &str) -> PipelineResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT transaction_id FROM top_suspicious WHERE run_id = ?1 ORDER BY rank ASC",
        )?;
        let ids = stmt
            .query_map(params![run_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ── Customer risk ──────────────────────────────────────────

    pub fn customer_risk(
        &self,
        run_id: &str,
        customer_id: CustomerId,
    ) -> PipelineResult<Option<CustomerRiskSummary>> {
        let row = self
            .conn
            .query_row(
                "SELECT customer_id, total_txns, total_spend, total_risk_score,
                        max_risk_score, high_risk_txns, customer_risk_tier
                 FROM customer_risk_summary WHERE run_id = ?1 AND customer_id = ?2",
                params![run_id, customer_id],
                |row| {
                    let tier: String = row.get(6)?;
                    let tier = RiskLevel::from_label(&tier).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            6,
                            Type::Text,
                            format!("unknown risk tier {tier:?}").into(),
                        )
                    })?;
                    Ok(CustomerRiskSummary {
                        customer_id:        row.get(0)?,
                        total_txns:         row.get::<_, i64>(1)? as u64,
                        total_spend:        row.get(2)?,
                        total_risk_score:   row.get::<_, i64>(3)? as u64,
                        max_risk_score:     row.get(4)?,
                        high_risk_txns:     row.get::<_, i64>(5)? as u64,
                        customer_risk_tier: tier,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn customer_risk_count(&self, run_id: &str) -> PipelineResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM customer_risk_summary WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
