//! Customer risk summary: one row per customer seen in the scored table.
//!
//! Customers without transactions never appear here. The KPI engine is the
//! place that keeps every registered customer.

use crate::{
    scoring::{RiskLevel, ScoredTransaction},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Tier boundaries on total_risk_score (inclusive upper bounds) ─────────────

pub const LOW_TIER_MAX_TOTAL: u64 = 50;
pub const MEDIUM_TIER_MAX_TOTAL: u64 = 150;

pub fn customer_risk_tier(total_risk_score: u64) -> RiskLevel {
    match total_risk_score {
        t if t <= LOW_TIER_MAX_TOTAL    => RiskLevel::Low,
        t if t <= MEDIUM_TIER_MAX_TOTAL => RiskLevel::Medium,
        _                               => RiskLevel::High,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRiskSummary {
    pub customer_id:        CustomerId,
    pub total_txns:         u64,
    pub total_spend:        f64,
    pub total_risk_score:   u64,
    pub max_risk_score:     u32,
    pub high_risk_txns:     u64,
    pub customer_risk_tier: RiskLevel,
}

/// Rows are ordered by ascending customer_id.
pub fn summarize_customers(scored: &[ScoredTransaction]) -> Vec<CustomerRiskSummary> {
    let mut by_customer: BTreeMap<CustomerId, CustomerRiskSummary> = BTreeMap::new();

    for txn in scored {
        let t = &txn.flagged.aggregated.transaction;
        let row = by_customer.entry(t.customer_id).or_insert_with(|| CustomerRiskSummary {
            customer_id:        t.customer_id,
            total_txns:         0,
            total_spend:        0.0,
            total_risk_score:   0,
            max_risk_score:     0,
            high_risk_txns:     0,
            customer_risk_tier: RiskLevel::Low,
        });
        row.total_txns += 1;
        row.total_spend += t.amount;
        row.total_risk_score += u64::from(txn.risk_score);
        row.max_risk_score = row.max_risk_score.max(txn.risk_score);
        if txn.risk_level == RiskLevel::High {
            row.high_risk_txns += 1;
        }
    }

    let summary: Vec<CustomerRiskSummary> = by_customer
        .into_values()
        .map(|mut row| {
            row.customer_risk_tier = customer_risk_tier(row.total_risk_score);
            row
        })
        .collect();

    log::info!("risk summary: {} customers", summary.len());
    summary
}
