//! Immutable input tables: the transaction ledger and the customer registry.
//!
//! RULE: Nothing downstream mutates a Ledger.
//! Every engine borrows it and returns a fresh table.

use crate::types::{CustomerId, TransactionId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id:   TransactionId,
    pub customer_id:      CustomerId,
    pub transaction_date: NaiveDateTime,
    pub amount:           f64, // non-negative, currency-agnostic
    pub category:         String,
    pub region:           String,
}

impl Transaction {
    /// Calendar day of the transaction, in its recorded timezone.
    pub fn day(&self) -> NaiveDate {
        self.transaction_date.date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub name:        Option<String>,
    pub gender:      Option<String>,
    pub age:         Option<u32>,
    pub city:        Option<String>,
    pub state:       Option<String>,
    pub signup_date: NaiveDate,
}

impl Customer {
    /// A registry entry with no demographic attributes.
    pub fn bare(customer_id: CustomerId, signup_date: NaiveDate) -> Self {
        Self {
            customer_id,
            name: None,
            gender: None,
            age: None,
            city: None,
            state: None,
            signup_date,
        }
    }
}

/// The two raw tables every run starts from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub customers:    Vec<Customer>,
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(customers: Vec<Customer>, transactions: Vec<Transaction>) -> Self {
        Self { customers, transactions }
    }

    /// Latest transaction timestamp, if any transaction exists.
    pub fn latest_transaction(&self) -> Option<NaiveDateTime> {
        self.transactions.iter().map(|t| t.transaction_date).max()
    }
}

/// Render a timestamp the way the exported tables expect:
/// date only at midnight, full timestamp otherwise.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
