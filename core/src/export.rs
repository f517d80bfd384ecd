//! CSV serialization of pipeline outputs and of generated ledgers.
//!
//! Every table is written with an explicit header row, even when empty.
//! Output bytes are a pure function of the rows: flags are 0/1, enums are
//! written by label, missing values are empty cells.

use crate::{
    engine::PipelineOutputs,
    error::PipelineResult,
    ledger::{format_timestamp, Customer, Ledger, Transaction},
    loader::{CUSTOMERS_FILE, TRANSACTIONS_FILE},
    retention::MonthlyRetention,
    rfm::CustomerSegment,
    risk_summary::CustomerRiskSummary,
    scoring::ScoredTransaction,
};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TRANSACTION_RISK_FILE: &str = "transaction_risk_flags.csv";
pub const CUSTOMER_RISK_FILE: &str = "customer_risk_summary.csv";
pub const TOP_SUSPICIOUS_FILE: &str = "top_suspicious_transactions.csv";
pub const CUSTOMER_SEGMENTS_FILE: &str = "customer_kpis_segments.csv";
pub const MONTHLY_RETENTION_FILE: &str = "monthly_retention.csv";

/// A serializable row with a fixed header. HEADERS must list the fields
/// in declaration order.
pub trait CsvRow: Serialize {
    const HEADERS: &'static [&'static str];
}

pub fn write_rows<W, R, I>(writer: W, rows: I) -> PipelineResult<()>
where
    W: Write,
    R: CsvRow,
    I: IntoIterator<Item = R>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(R::HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn flag(b: bool) -> u8 {
    u8::from(b)
}

// ── Transaction risk ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TransactionRiskRow<'a> {
    pub transaction_id:      i64,
    pub customer_id:         i64,
    pub transaction_date:    String,
    pub amount:              f64,
    pub category:            &'a str,
    pub region:              &'a str,
    pub cust_amt_mean:       f64,
    pub cust_amt_std:        f64,
    pub cust_txn_count:      u64,
    pub day:                 String,
    pub txns_that_day:       u32,
    pub z_score:             f64,
    pub flag_amount_anomaly: u8,
    pub flag_high_amount:    u8,
    pub flag_velocity:       u8,
    pub flag_risky_category: u8,
    pub risk_score:          u32,
    pub risk_level:          &'static str,
}

impl CsvRow for TransactionRiskRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "transaction_id", "customer_id", "transaction_date", "amount", "category", "region",
        "cust_amt_mean", "cust_amt_std", "cust_txn_count", "day", "txns_that_day", "z_score",
        "flag_amount_anomaly", "flag_high_amount", "flag_velocity", "flag_risky_category",
        "risk_score", "risk_level",
    ];
}

impl<'a> From<&'a ScoredTransaction> for TransactionRiskRow<'a> {
    fn from(s: &'a ScoredTransaction) -> Self {
        let agg = &s.flagged.aggregated;
        let t = &agg.transaction;
        let flags = s.flags();
        Self {
            transaction_id:      t.transaction_id,
            customer_id:         t.customer_id,
            transaction_date:    format_timestamp(&t.transaction_date),
            amount:              t.amount,
            category:            &t.category,
            region:              &t.region,
            cust_amt_mean:       agg.stats.mean_amount,
            cust_amt_std:        agg.stats.std_amount,
            cust_txn_count:      agg.stats.txn_count,
            day:                 agg.day.format("%Y-%m-%d").to_string(),
            txns_that_day:       agg.txns_that_day,
            z_score:             s.flagged.z_score,
            flag_amount_anomaly: flag(flags.amount_anomaly),
            flag_high_amount:    flag(flags.high_amount),
            flag_velocity:       flag(flags.velocity),
            flag_risky_category: flag(flags.risky_category),
            risk_score:          s.risk_score,
            risk_level:          s.risk_level.as_str(),
        }
    }
}

pub fn write_scored_transactions<W: Write>(w: W, scored: &[ScoredTransaction]) -> PipelineResult<()> {
    write_rows(w, scored.iter().map(TransactionRiskRow::from))
}

// ── Customer risk summary ────────────────────────────────────────────────────

impl CsvRow for &CustomerRiskSummary {
    const HEADERS: &'static [&'static str] = &[
        "customer_id", "total_txns", "total_spend", "total_risk_score", "max_risk_score",
        "high_risk_txns", "customer_risk_tier",
    ];
}

pub fn write_customer_risk<W: Write>(w: W, summary: &[CustomerRiskSummary]) -> PipelineResult<()> {
    write_rows(w, summary.iter())
}

// ── Customer KPIs and segments ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CustomerSegmentRow<'a> {
    pub customer_id:                  i64,
    pub name:                         Option<&'a str>,
    pub gender:                       Option<&'a str>,
    pub age:                          Option<u32>,
    pub city:                         Option<&'a str>,
    pub state:                        Option<&'a str>,
    pub signup_date:                  String,
    pub last_purchase:                Option<String>,
    pub first_purchase:               Option<String>,
    pub txn_count:                    u64,
    pub total_spend:                  f64,
    pub avg_txn_value:                f64,
    pub recency_days:                 i64,
    pub tenure_days:                  i64,
    pub purchase_frequency_per_month: f64,
    pub clv_simple:                   f64,
    pub is_churn_risk:                u8,
    #[serde(rename = "R")]
    pub r:                            Option<u8>,
    #[serde(rename = "F")]
    pub f:                            Option<u8>,
    #[serde(rename = "M")]
    pub m:                            Option<u8>,
    pub segment:                      &'static str,
}

impl CsvRow for CustomerSegmentRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "customer_id", "name", "gender", "age", "city", "state", "signup_date",
        "last_purchase", "first_purchase", "txn_count", "total_spend", "avg_txn_value",
        "recency_days", "tenure_days", "purchase_frequency_per_month", "clv_simple",
        "is_churn_risk", "R", "F", "M", "segment",
    ];
}

impl<'a> From<&'a CustomerSegment> for CustomerSegmentRow<'a> {
    fn from(s: &'a CustomerSegment) -> Self {
        let k = &s.kpi;
        let c = &k.customer;
        Self {
            customer_id:                  c.customer_id,
            name:                         c.name.as_deref(),
            gender:                       c.gender.as_deref(),
            age:                          c.age,
            city:                         c.city.as_deref(),
            state:                        c.state.as_deref(),
            signup_date:                  c.signup_date.format("%Y-%m-%d").to_string(),
            last_purchase:                k.last_purchase.as_ref().map(format_timestamp),
            first_purchase:               k.first_purchase.as_ref().map(format_timestamp),
            txn_count:                    k.txn_count,
            total_spend:                  k.total_spend,
            avg_txn_value:                k.avg_txn_value,
            recency_days:                 k.recency_days,
            tenure_days:                  k.tenure_days,
            purchase_frequency_per_month: k.purchase_frequency_per_month,
            clv_simple:                   k.clv_simple,
            is_churn_risk:                flag(k.is_churn_risk),
            r:                            s.rfm.map(|x| x.r),
            f:                            s.rfm.map(|x| x.f),
            m:                            s.rfm.map(|x| x.m),
            segment:                      s.segment.label(),
        }
    }
}

pub fn write_segments<W: Write>(w: W, segments: &[CustomerSegment]) -> PipelineResult<()> {
    write_rows(w, segments.iter().map(CustomerSegmentRow::from))
}

// ── Monthly retention ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RetentionRow {
    pub year_month:                String,
    pub active_customers:          u64,
    pub retained_next_month:       u64,
    pub retention_rate_next_month: f64,
}

impl CsvRow for RetentionRow {
    const HEADERS: &'static [&'static str] = &[
        "year_month", "active_customers", "retained_next_month", "retention_rate_next_month",
    ];
}

impl From<&MonthlyRetention> for RetentionRow {
    fn from(m: &MonthlyRetention) -> Self {
        Self {
            year_month:                m.year_month.to_string(),
            active_customers:          m.active_customers,
            retained_next_month:       m.retained_next_month,
            retention_rate_next_month: m.retention_rate_next_month,
        }
    }
}

pub fn write_retention<W: Write>(w: W, retention: &[MonthlyRetention]) -> PipelineResult<()> {
    write_rows(w, retention.iter().map(RetentionRow::from))
}

/// Write all five output tables into `dir`, creating it if needed.
pub fn write_all<P: AsRef<Path>>(dir: P, outputs: &PipelineOutputs) -> PipelineResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let paths: Vec<PathBuf> = [
        TRANSACTION_RISK_FILE,
        CUSTOMER_RISK_FILE,
        TOP_SUSPICIOUS_FILE,
        CUSTOMER_SEGMENTS_FILE,
        MONTHLY_RETENTION_FILE,
    ]
    .iter()
    .map(|f| dir.join(f))
    .collect();

    write_scored_transactions(File::create(&paths[0])?, &outputs.scored)?;
    write_customer_risk(File::create(&paths[1])?, &outputs.customer_risk)?;
    write_scored_transactions(File::create(&paths[2])?, &outputs.top_suspicious)?;
    write_segments(File::create(&paths[3])?, &outputs.segments)?;
    write_retention(File::create(&paths[4])?, &outputs.retention)?;

    log::info!("export: wrote {} tables to {}", paths.len(), dir.display());
    Ok(paths)
}

// ── Raw ledger ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CustomerCsvRow<'a> {
    customer_id: i64,
    name:        Option<&'a str>,
    gender:      Option<&'a str>,
    age:         Option<u32>,
    city:        Option<&'a str>,
    state:       Option<&'a str>,
    signup_date: String,
}

impl CsvRow for CustomerCsvRow<'_> {
    const HEADERS: &'static [&'static str] =
        &["customer_id", "name", "gender", "age", "city", "state", "signup_date"];
}

impl<'a> From<&'a Customer> for CustomerCsvRow<'a> {
    fn from(c: &'a Customer) -> Self {
        Self {
            customer_id: c.customer_id,
            name:        c.name.as_deref(),
            gender:      c.gender.as_deref(),
            age:         c.age,
            city:        c.city.as_deref(),
            state:       c.state.as_deref(),
            signup_date: c.signup_date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionCsvRow<'a> {
    transaction_id:   i64,
    customer_id:      i64,
    transaction_date: String,
    amount:           f64,
    category:         &'a str,
    region:           &'a str,
}

impl CsvRow for TransactionCsvRow<'_> {
    const HEADERS: &'static [&'static str] =
        &["transaction_id", "customer_id", "transaction_date", "amount", "category", "region"];
}

impl<'a> From<&'a Transaction> for TransactionCsvRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            transaction_id:   t.transaction_id,
            customer_id:      t.customer_id,
            transaction_date: format_timestamp(&t.transaction_date),
            amount:           t.amount,
            category:         &t.category,
            region:           &t.region,
        }
    }
}

/// Write `customers.csv` and `transactions.csv` in the layout the loader reads.
pub fn write_ledger<P: AsRef<Path>>(dir: P, ledger: &Ledger) -> PipelineResult<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    write_rows(
        File::create(dir.join(CUSTOMERS_FILE))?,
        ledger.customers.iter().map(CustomerCsvRow::from),
    )?;
    write_rows(
        File::create(dir.join(TRANSACTIONS_FILE))?,
        ledger.transactions.iter().map(TransactionCsvRow::from),
    )?;
    log::info!(
        "export: wrote ledger ({} customers, {} transactions) to {}",
        ledger.customers.len(),
        ledger.transactions.len(),
        dir.display()
    );
    Ok(())
}
