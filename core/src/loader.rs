//! CSV ingestion for the two raw tables.
//!
//! Columns are located by header name, so column order is free and extra
//! columns are ignored. Every shape problem fails the load before any
//! engine runs, naming the table, column and row at fault.

use crate::{
    error::{PipelineError, PipelineResult},
    ledger::{Customer, Ledger, Transaction},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const CUSTOMERS_TABLE: &str = "customers";

pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";

const TRANSACTION_COLUMNS: [&str; 6] = [
    "transaction_id",
    "customer_id",
    "transaction_date",
    "amount",
    "category",
    "region",
];
const CUSTOMER_COLUMNS: [&str; 2] = ["customer_id", "signup_date"];
const CUSTOMER_OPTIONAL_COLUMNS: [&str; 5] = ["name", "gender", "age", "city", "state"];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Load both tables from `dir/customers.csv` and `dir/transactions.csv`.
pub fn load_ledger<P: AsRef<Path>>(dir: P) -> PipelineResult<Ledger> {
    let dir = dir.as_ref();
    let customers = load_customers_csv(dir.join(CUSTOMERS_FILE))?;
    let transactions = load_transactions_csv(dir.join(TRANSACTIONS_FILE))?;
    Ok(Ledger::new(customers, transactions))
}

pub fn load_transactions_csv<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<Transaction>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let transactions = load_transactions(file)?;
    log::info!("loaded {} transactions from {}", transactions.len(), path.display());
    Ok(transactions)
}

pub fn load_customers_csv<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<Customer>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let customers = load_customers(file)?;
    log::info!("loaded {} customers from {}", customers.len(), path.display());
    Ok(customers)
}

pub fn load_transactions<R: Read>(reader: R) -> PipelineResult<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = required_columns(&headers, TRANSACTIONS_TABLE, &TRANSACTION_COLUMNS)?;
    let [id_col, cust_col, date_col, amount_col, category_col, region_col] = cols[..] else {
        unreachable!("one index per required column");
    };

    let mut seen = HashSet::new();
    let mut transactions = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let transaction_id = parse_i64(TRANSACTIONS_TABLE, "transaction_id", row, field(id_col))?;
        if !seen.insert(transaction_id) {
            return Err(PipelineError::DuplicateKey {
                table:  TRANSACTIONS_TABLE.into(),
                column: "transaction_id".into(),
                key:    transaction_id.to_string(),
            });
        }

        let amount = parse_f64(TRANSACTIONS_TABLE, "amount", row, field(amount_col))?;
        if amount < 0.0 {
            return Err(PipelineError::NegativeAmount { row, value: amount });
        }

        transactions.push(Transaction {
            transaction_id,
            customer_id: parse_i64(TRANSACTIONS_TABLE, "customer_id", row, field(cust_col))?,
            transaction_date: parse_timestamp(
                TRANSACTIONS_TABLE,
                "transaction_date",
                row,
                field(date_col),
            )?,
            amount,
            category: field(category_col).to_string(),
            region: field(region_col).to_string(),
        });
    }
    Ok(transactions)
}

pub fn load_customers<R: Read>(reader: R) -> PipelineResult<Vec<Customer>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = required_columns(&headers, CUSTOMERS_TABLE, &CUSTOMER_COLUMNS)?;
    let [id_col, signup_col] = cols[..] else {
        unreachable!("one index per required column");
    };
    let optional: Vec<Option<usize>> = CUSTOMER_OPTIONAL_COLUMNS
        .iter()
        .map(|name| column_index(&headers, name))
        .collect();
    let [name_col, gender_col, age_col, city_col, state_col] = optional[..] else {
        unreachable!("one slot per optional column");
    };

    let mut seen = HashSet::new();
    let mut customers = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let text = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let customer_id =
            parse_i64(CUSTOMERS_TABLE, "customer_id", row, record.get(id_col).unwrap_or(""))?;
        if !seen.insert(customer_id) {
            return Err(PipelineError::DuplicateKey {
                table:  CUSTOMERS_TABLE.into(),
                column: "customer_id".into(),
                key:    customer_id.to_string(),
            });
        }

        let age = match text(age_col) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| PipelineError::InvalidNumber {
                table:  CUSTOMERS_TABLE.into(),
                column: "age".into(),
                row,
                value:  raw.clone(),
            })?),
            None => None,
        };

        let signup_date = parse_timestamp(
            CUSTOMERS_TABLE,
            "signup_date",
            row,
            record.get(signup_col).unwrap_or(""),
        )?
        .date();

        customers.push(Customer {
            customer_id,
            name: text(name_col),
            gender: text(gender_col),
            age,
            city: text(city_col),
            state: text(state_col),
            signup_date,
        });
    }
    Ok(customers)
}

// ── Field parsing ────────────────────────────────────────────────────────────

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim_start_matches('\u{feff}') == name)
}

fn required_columns(
    headers: &StringRecord,
    table: &str,
    required: &[&str],
) -> PipelineResult<Vec<usize>> {
    required
        .iter()
        .map(|name| {
            column_index(headers, name).ok_or_else(|| PipelineError::MissingColumn {
                table:  table.into(),
                column: name.to_string(),
            })
        })
        .collect()
}

fn parse_i64(table: &str, column: &str, row: usize, raw: &str) -> PipelineResult<i64> {
    raw.parse::<i64>().map_err(|_| PipelineError::InvalidNumber {
        table:  table.into(),
        column: column.into(),
        row,
        value:  raw.into(),
    })
}

fn parse_f64(table: &str, column: &str, row: usize, raw: &str) -> PipelineResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PipelineError::InvalidNumber {
            table:  table.into(),
            column: column.into(),
            row,
            value:  raw.into(),
        })
}

fn parse_timestamp(
    table: &str,
    column: &str,
    row: usize,
    raw: &str,
) -> PipelineResult<NaiveDateTime> {
    parse_timestamp_str(raw).ok_or_else(|| PipelineError::InvalidDate {
        table:  table.into(),
        column: column.into(),
        row,
        value:  raw.into(),
    })
}

/// Accepts `YYYY-MM-DD` (midnight) or a full timestamp with a space or `T`.
pub fn parse_timestamp_str(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
