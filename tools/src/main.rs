//! pipeline-runner: headless driver for the ledgerscope pipeline.
//!
//! Usage:
//!   pipeline-runner generate --seed 42 --customers 2000 --as-of 2024-06-30 --out-dir ./data
//!   pipeline-runner run --data-dir ./data --out-dir ./outputs --db run.db --top-n 50

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use ledgerscope_core::{
    config::PipelineConfig,
    engine::{Pipeline, PipelineOutputs},
    export::{write_all, write_ledger},
    generator::{generate_ledger, GeneratorConfig},
    ledger::format_timestamp,
    loader::load_ledger,
    scoring::RiskLevel,
    store::OutputStore,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;

const USAGE: &str = "usage: pipeline-runner <generate|run> [--flag value ...]";

#[derive(Serialize)]
struct RunSummary {
    run_id:           String,
    reference_date:   Option<String>,
    transactions:     usize,
    customers:        usize,
    retention_months: usize,
    top_suspicious:   usize,
    risk_levels:      BTreeMap<String, usize>,
    customer_tiers:   BTreeMap<String, usize>,
    segments:         BTreeMap<String, usize>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("generate") => generate(&args),
        Some("run") => run(&args),
        Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
        None => bail!("{USAGE}"),
    }
}

fn generate(args: &[String]) -> Result<()> {
    let as_of = match arg_value(args, "--as-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--as-of must be YYYY-MM-DD, got '{raw}'"))?,
        None => Utc::now().date_naive(),
    };
    let mut config = GeneratorConfig::new(as_of);
    config.seed = parse_arg(args, "--seed", config.seed)?;
    config.customers = parse_arg(args, "--customers", config.customers)?;
    config.avg_txn_per_customer = parse_arg(args, "--avg-txns", config.avg_txn_per_customer)?;
    let out_dir = arg_value(args, "--out-dir").unwrap_or("./data");

    println!("ledgerscope: generate");
    println!("  seed:      {}", config.seed);
    println!("  customers: {}", config.customers);
    println!("  as_of:     {as_of}");
    println!("  out_dir:   {out_dir}");
    println!();

    let ledger = generate_ledger(&config);
    write_ledger(out_dir, &ledger)?;

    println!(
        "wrote {} customers and {} transactions",
        ledger.customers.len(),
        ledger.transactions.len()
    );
    Ok(())
}

fn run(args: &[String]) -> Result<()> {
    let data_dir = arg_value(args, "--data-dir").unwrap_or("./data");
    let out_dir = arg_value(args, "--out-dir").unwrap_or("./outputs");
    let db = arg_value(args, "--db");

    let mut config = match arg_value(args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.output.top_suspicious = parse_arg(args, "--top-n", config.output.top_suspicious)?;

    println!("ledgerscope: run");
    println!("  data_dir: {data_dir}");
    println!("  out_dir:  {out_dir}");
    println!("  db:       {}", db.unwrap_or("(none)"));
    println!();

    let ledger = load_ledger(data_dir)
        .with_context(|| format!("Failed to load ledger from {data_dir}"))?;
    let outputs = Pipeline::new(config).run(&ledger)?;

    // The run row is claimed before any file is written.
    let run_id = new_run_id(Utc::now());
    let store = match db {
        Some(db) => {
            let store = OutputStore::open(db)?;
            store.migrate()?;
            store.insert_run(&run_id, env!("CARGO_PKG_VERSION"), outputs.reference_date)?;
            Some(store)
        }
        None => None,
    };

    let written = write_all(out_dir, &outputs)?;
    for path in &written {
        log::info!("wrote {}", path.display());
    }

    if let Some(store) = &store {
        store.save_outputs(&run_id, &outputs)?;
    }

    let summary = summarize(&run_id, &outputs);
    print_summary(&summary);

    if let Some(path) = arg_value(args, "--summary-json") {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json).map_err(|e| anyhow!("Cannot write {path}: {e}"))?;
    }
    Ok(())
}

fn summarize(run_id: &str, outputs: &PipelineOutputs) -> RunSummary {
    let mut risk_levels = BTreeMap::new();
    for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
        risk_levels.insert(level.to_string(), 0);
    }
    for s in &outputs.scored {
        *risk_levels.entry(s.risk_level.to_string()).or_insert(0) += 1;
    }

    let mut customer_tiers = BTreeMap::new();
    for c in &outputs.customer_risk {
        *customer_tiers.entry(c.customer_risk_tier.to_string()).or_insert(0) += 1;
    }

    let mut segments = BTreeMap::new();
    for s in &outputs.segments {
        *segments.entry(s.segment.to_string()).or_insert(0) += 1;
    }

    RunSummary {
        run_id:           run_id.to_string(),
        reference_date:   outputs.reference_date.as_ref().map(format_timestamp),
        transactions:     outputs.scored.len(),
        customers:        outputs.segments.len(),
        retention_months: outputs.retention.len(),
        top_suspicious:   outputs.top_suspicious.len(),
        risk_levels,
        customer_tiers,
        segments,
    }
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:           {}", summary.run_id);
    println!(
        "  reference date:   {}",
        summary.reference_date.as_deref().unwrap_or("(no transactions)")
    );
    println!("  transactions:     {}", summary.transactions);
    println!("  customers:        {}", summary.customers);
    println!("  retention months: {}", summary.retention_months);
    println!("  top suspicious:   {}", summary.top_suspicious);

    println!();
    println!("=== TRANSACTION RISK LEVELS ===");
    for (level, n) in &summary.risk_levels {
        println!("  {level:<8} {n}");
    }

    println!();
    println!("=== CUSTOMER RISK TIERS ===");
    for (tier, n) in &summary.customer_tiers {
        println!("  {tier:<8} {n}");
    }

    println!();
    println!("=== SEGMENTS ===");
    if summary.segments.is_empty() {
        println!("  (No customers)");
    }
    for (segment, n) in &summary.segments {
        println!("  {segment:<20} {n}");
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `default` when the flag is absent; an error naming the flag when its value does not parse.
fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T> {
    match arg_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow!("invalid value '{raw}' for {flag}")),
        None => Ok(default),
    }
}

/// Microsecond resolution, so back-to-back runs get distinct ids.
fn new_run_id(now: DateTime<Utc>) -> String {
    format!("run-{}", now.format("%Y%m%dT%H%M%S%.6f"))
}
