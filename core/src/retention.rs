//! Retention engine: monthly active customers and next-month retention.
//!
//! A customer active in month M is retained when they also transact in
//! M + 1. The table covers every calendar month from the first active
//! month to the last one; quiet months are present with zeros.

use crate::{
    ledger::Transaction,
    types::{CustomerId, YearMonth},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRetention {
    pub year_month:                YearMonth,
    pub active_customers:          u64,
    pub retained_next_month:       u64,
    pub retention_rate_next_month: f64, // in [0, 1]
}

pub fn retention_rate(retained: u64, active: u64) -> f64 {
    if active > 0 {
        retained as f64 / active as f64
    } else {
        0.0
    }
}

pub fn monthly_retention(transactions: &[Transaction]) -> Vec<MonthlyRetention> {
    let mut active: BTreeMap<YearMonth, BTreeSet<CustomerId>> = BTreeMap::new();
    for txn in transactions {
        active
            .entry(YearMonth::of(txn.day()))
            .or_default()
            .insert(txn.customer_id);
    }

    let (Some(&first), Some(&last)) = (active.keys().next(), active.keys().next_back()) else {
        log::info!("retention: no transactions, empty table");
        return Vec::new();
    };

    let empty = BTreeSet::new();
    let mut out = Vec::new();
    let mut month = first;
    while month <= last {
        let this_month = active.get(&month).unwrap_or(&empty);
        let next_month = active.get(&month.next()).unwrap_or(&empty);

        let active_customers = this_month.len() as u64;
        let retained_next_month = this_month.intersection(next_month).count() as u64;

        out.push(MonthlyRetention {
            year_month: month,
            active_customers,
            retained_next_month,
            retention_rate_next_month: retention_rate(retained_next_month, active_customers),
        });
        month = month.next();
    }

    log::info!(
        "retention: {} months ({} with activity) from {first} to {last}",
        out.len(),
        active.len()
    );
    out
}
