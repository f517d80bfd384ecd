//! Synthetic ledger generation.
//!
//! Produces a customer registry and a transaction history shaped like a
//! small retail book: Poisson transaction counts, lognormal amounts with a
//! rare large-amount outlier, uniform categories and regions.
//!
//! Everything is relative to an explicit `as_of` date and a master seed;
//! the same config always yields the same ledger.

use crate::{
    ledger::{Customer, Ledger, Transaction},
    name_generator::NameGenerator,
    rng::{RngBank, StreamRng, StreamSlot},
};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const CATEGORIES: [&str; 7] = [
    "Grocery", "Electronics", "Fashion", "Travel", "Dining", "Pharmacy", "Fuel",
];
pub const REGIONS: [&str; 4] = ["West", "Midwest", "South", "Northeast"];

// ── Distribution parameters ──────────────────────────────────────────────────

const SIGNUP_DAYS_AGO: (i64, i64) = (30, 900);
const TXN_DAYS_AGO: (i64, i64) = (0, 365);
const FEMALE_SHARE: f64 = 0.52;
const AGE_MEAN: f64 = 34.0;
const AGE_STD: f64 = 10.0;
const AGE_RANGE: (f64, f64) = (18.0, 70.0);
const AMOUNT_LOG_MEAN: f64 = 3.3;
const AMOUNT_LOG_STD: f64 = 0.6;
const OUTLIER_PROBABILITY: f64 = 0.01;
const OUTLIER_MULTIPLIER: (i64, i64) = (10, 30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub seed:                 u64,
    pub customers:            usize,
    pub avg_txn_per_customer: f64,
    pub as_of:                NaiveDate,
}

impl GeneratorConfig {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            seed: 42,
            customers: 2000,
            avg_txn_per_customer: 8.0,
            as_of,
        }
    }
}

pub fn generate_ledger(config: &GeneratorConfig) -> Ledger {
    let bank = RngBank::new(config.seed);
    let mut customer_rng = bank.for_stream(StreamSlot::Customers);
    let mut txn_rng = bank.for_stream(StreamSlot::Transactions);
    log::debug!("generator: streams {} and {}", customer_rng.name, txn_rng.name);

    let customers: Vec<Customer> = (1..=config.customers as i64)
        .map(|id| generate_customer(id, config.as_of, &mut customer_rng))
        .collect();

    let mut transactions = Vec::new();
    let mut next_id = 1;
    for customer in &customers {
        let count = txn_rng.poisson(config.avg_txn_per_customer);
        for _ in 0..count {
            transactions.push(generate_transaction(
                next_id,
                customer.customer_id,
                config.as_of,
                &mut txn_rng,
            ));
            next_id += 1;
        }
    }

    log::info!(
        "generator: seed={} as_of={} produced {} customers, {} transactions",
        config.seed,
        config.as_of,
        customers.len(),
        transactions.len()
    );
    Ledger::new(customers, transactions)
}

fn generate_customer(customer_id: i64, as_of: NaiveDate, rng: &mut StreamRng) -> Customer {
    let days_ago = rng.range_i64(SIGNUP_DAYS_AGO.0, SIGNUP_DAYS_AGO.1);
    let gender = if rng.chance(FEMALE_SHARE) { "F" } else { "M" };
    let age = rng.normal(AGE_MEAN, AGE_STD).clamp(AGE_RANGE.0, AGE_RANGE.1) as u32;
    let name = NameGenerator::full_name(rng, gender);
    let (city, state) = NameGenerator::location(rng);

    Customer {
        customer_id,
        name: Some(name),
        gender: Some(gender.to_string()),
        age: Some(age),
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        signup_date: as_of - Duration::days(days_ago),
    }
}

fn generate_transaction(
    transaction_id: i64,
    customer_id: i64,
    as_of: NaiveDate,
    rng: &mut StreamRng,
) -> Transaction {
    let days_back = rng.range_i64(TXN_DAYS_AGO.0, TXN_DAYS_AGO.1);
    let mut amount = round_cents(rng.lognormal(AMOUNT_LOG_MEAN, AMOUNT_LOG_STD));
    let category = rng.pick(&CATEGORIES).to_string();
    let region = rng.pick(&REGIONS).to_string();

    if rng.chance(OUTLIER_PROBABILITY) {
        amount = round_cents(amount * rng.range_i64(OUTLIER_MULTIPLIER.0, OUTLIER_MULTIPLIER.1) as f64);
    }

    Transaction {
        transaction_id,
        customer_id,
        transaction_date: (as_of - Duration::days(days_back)).and_time(NaiveTime::MIN),
        amount,
        category,
        region,
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
