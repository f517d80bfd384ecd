//! Flag engine: independent boolean risk flags per transaction.
//!
//! Each flag is a pure threshold test. No flag suppresses another.

use crate::{
    aggregation::{AggregatedTransaction, CustomerAmountStats},
    config::RiskConfig,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub amount_anomaly: bool,
    pub high_amount:    bool,
    pub velocity:       bool,
    pub risky_category: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedTransaction {
    pub aggregated: AggregatedTransaction,
    pub z_score:    f64,
    pub flags:      RiskFlags,
}

/// Standardised distance of `amount` from its customer's mean.
/// Zero whenever the customer's spread is zero.
pub fn z_score(amount: f64, stats: &CustomerAmountStats) -> f64 {
    if stats.std_amount > 0.0 {
        (amount - stats.mean_amount) / stats.std_amount
    } else {
        0.0
    }
}

pub fn evaluate_flags(txn: &AggregatedTransaction, z: f64, config: &RiskConfig) -> RiskFlags {
    let amount = txn.transaction.amount;
    RiskFlags {
        amount_anomaly: z > config.anomaly_z_threshold,
        high_amount:    amount >= config.high_amount_threshold,
        velocity:       txn.txns_that_day >= config.velocity_threshold,
        risky_category: config.risky_categories.contains(&txn.transaction.category),
    }
}

pub fn flag_transactions(
    aggregated: &[AggregatedTransaction],
    config: &RiskConfig,
) -> Vec<FlaggedTransaction> {
    aggregated
        .iter()
        .map(|txn| {
            let z = z_score(txn.transaction.amount, &txn.stats);
            FlaggedTransaction {
                aggregated: txn.clone(),
                z_score:    z,
                flags:      evaluate_flags(txn, z, config),
            }
        })
        .collect()
}
