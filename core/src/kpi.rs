//! KPI engine: recency, frequency, monetary value and churn per customer.
//!
//! Execution: once per run, against a single global reference date
//! (latest transaction + 1 day), never a per-customer or wall-clock date.
//!
//! Every registered customer yields exactly one row, in registry order.
//! Customers with no transactions get explicit defaults instead of gaps.

use crate::{
    config::SegmentationConfig,
    ledger::{Customer, Ledger, Transaction},
    types::CustomerId,
};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const ANNUALISE_MONTHS: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerKpi {
    pub customer:                     Customer,
    pub last_purchase:                Option<NaiveDateTime>,
    pub first_purchase:               Option<NaiveDateTime>,
    pub txn_count:                    u64,
    pub total_spend:                  f64,
    pub avg_txn_value:                f64,
    pub recency_days:                 i64,
    pub tenure_days:                  i64,
    pub purchase_frequency_per_month: f64,
    pub clv_simple:                   f64,
    pub is_churn_risk:                bool,
}

impl CustomerKpi {
    pub fn customer_id(&self) -> CustomerId {
        self.customer.customer_id
    }

    pub fn has_purchases(&self) -> bool {
        self.txn_count > 0
    }

    fn without_purchases(customer: &Customer, config: &SegmentationConfig) -> Self {
        Self {
            customer:                     customer.clone(),
            last_purchase:                None,
            first_purchase:               None,
            txn_count:                    0,
            total_spend:                  0.0,
            avg_txn_value:                0.0,
            recency_days:                 config.recency_sentinel_days,
            tenure_days:                  0,
            purchase_frequency_per_month: 0.0,
            clv_simple:                   0.0,
            is_churn_risk:                true,
        }
    }
}

/// Latest transaction timestamp plus one day. None for an empty ledger.
pub fn reference_date(transactions: &[Transaction]) -> Option<NaiveDateTime> {
    transactions
        .iter()
        .map(|t| t.transaction_date)
        .max()
        .map(|latest| latest + Duration::days(1))
}

struct PurchaseHistory {
    first: NaiveDateTime,
    last:  NaiveDateTime,
    count: u64,
    spend: f64,
}

pub fn compute_customer_kpis(ledger: &Ledger, config: &SegmentationConfig) -> Vec<CustomerKpi> {
    let mut history: HashMap<CustomerId, PurchaseHistory> = HashMap::new();
    for txn in &ledger.transactions {
        history
            .entry(txn.customer_id)
            .and_modify(|h| {
                h.first = h.first.min(txn.transaction_date);
                h.last = h.last.max(txn.transaction_date);
                h.count += 1;
                h.spend += txn.amount;
            })
            .or_insert(PurchaseHistory {
                first: txn.transaction_date,
                last:  txn.transaction_date,
                count: 1,
                spend: txn.amount,
            });
    }

    let registered: HashSet<CustomerId> =
        ledger.customers.iter().map(|c| c.customer_id).collect();
    let orphans = history.keys().filter(|id| !registered.contains(id)).count();
    if orphans > 0 {
        log::warn!("kpi: {orphans} transacting customers are missing from the registry and get no KPI row");
    }

    let rows: Vec<CustomerKpi> = match reference_date(&ledger.transactions) {
        Some(reference) => ledger
            .customers
            .iter()
            .map(|c| match history.get(&c.customer_id) {
                Some(h) => kpi_for(c, h, reference, config),
                None => CustomerKpi::without_purchases(c, config),
            })
            .collect(),
        None => ledger
            .customers
            .iter()
            .map(|c| CustomerKpi::without_purchases(c, config))
            .collect(),
    };

    log::info!(
        "kpi: {} customers, {} with purchases",
        rows.len(),
        rows.iter().filter(|r| r.has_purchases()).count()
    );
    rows
}

fn kpi_for(
    customer: &Customer,
    h: &PurchaseHistory,
    reference: NaiveDateTime,
    config: &SegmentationConfig,
) -> CustomerKpi {
    let recency_days = (reference - h.last).num_days();
    // Floor of one day keeps the frequency denominator positive.
    let tenure_days = (reference - h.first).num_days().max(1);

    let avg_txn_value = h.spend / h.count as f64;
    let purchase_frequency_per_month =
        h.count as f64 / (tenure_days as f64 / config.days_per_month);
    let clv_simple = avg_txn_value * purchase_frequency_per_month * ANNUALISE_MONTHS;

    CustomerKpi {
        customer: customer.clone(),
        last_purchase: Some(h.last),
        first_purchase: Some(h.first),
        txn_count: h.count,
        total_spend: h.spend,
        avg_txn_value,
        recency_days,
        tenure_days,
        purchase_frequency_per_month,
        clv_simple,
        is_churn_risk: recency_days > config.churn_window_days,
    }
}
