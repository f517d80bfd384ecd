//! Aggregation engine: per-customer amount statistics and same-day velocity.
//!
//! This stage:
//!   1. Computes mean / sample standard deviation / count of amount per customer
//!   2. Counts transactions per (customer, calendar day)
//!   3. Left-joins both onto every transaction, preserving input order
//!
//! Every input row appears exactly once in the output.

use crate::{
    ledger::Transaction,
    types::CustomerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomerAmountStats {
    pub mean_amount: f64,
    pub std_amount:  f64, // 0 when undefined or zero variance
    pub txn_count:   u64,
}

/// A transaction with its customer's statistics and same-day count attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTransaction {
    pub transaction:   Transaction,
    pub stats:         CustomerAmountStats,
    pub day:           NaiveDate,
    pub txns_that_day: u32,
}

#[derive(Default)]
struct AmountAccumulator {
    amounts: Vec<f64>,
}

impl AmountAccumulator {
    fn finish(&self) -> CustomerAmountStats {
        let n = self.amounts.len();
        let mean = self.amounts.iter().sum::<f64>() / n as f64;

        // Sample std (n - 1). Identical amounts are pinned to exactly 0 so
        // that rounding noise in the mean can never look like variance.
        let all_equal = self.amounts.windows(2).all(|w| w[0] == w[1]);
        let std = if n < 2 || all_equal {
            0.0
        } else {
            let ss: f64 = self.amounts.iter().map(|a| (a - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };

        CustomerAmountStats {
            mean_amount: mean,
            std_amount:  std,
            txn_count:   n as u64,
        }
    }
}

/// One entry per distinct customer present in `transactions`.
pub fn customer_amount_stats(
    transactions: &[Transaction],
) -> HashMap<CustomerId, CustomerAmountStats> {
    let mut acc: HashMap<CustomerId, AmountAccumulator> = HashMap::new();
    for txn in transactions {
        acc.entry(txn.customer_id).or_default().amounts.push(txn.amount);
    }
    acc.into_iter().map(|(id, a)| (id, a.finish())).collect()
}

/// Transaction count per (customer, calendar day).
pub fn daily_velocity(transactions: &[Transaction]) -> HashMap<(CustomerId, NaiveDate), u32> {
    let mut counts: HashMap<(CustomerId, NaiveDate), u32> = HashMap::new();
    for txn in transactions {
        *counts.entry((txn.customer_id, txn.day())).or_insert(0) += 1;
    }
    counts
}

/// Attach customer stats and daily velocity to every transaction.
pub fn aggregate(transactions: &[Transaction]) -> Vec<AggregatedTransaction> {
    let stats = customer_amount_stats(transactions);
    let velocity = daily_velocity(transactions);

    let out: Vec<AggregatedTransaction> = transactions
        .iter()
        .map(|txn| {
            let day = txn.day();
            AggregatedTransaction {
                transaction:   txn.clone(),
                // Both maps were built from this same slice, so every key is present.
                stats:         stats[&txn.customer_id],
                day,
                txns_that_day: velocity[&(txn.customer_id, day)],
            }
        })
        .collect();

    log::info!(
        "aggregation: {} transactions across {} customers, {} customer-days",
        out.len(),
        stats.len(),
        velocity.len()
    );
    out
}
