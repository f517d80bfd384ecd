//! Scoring engine: weighted risk score, risk level and the top-N view.

use ledgerscope_core::{
    config::{PipelineConfig, RiskWeights},
    engine::Pipeline,
    flags::RiskFlags,
    ledger::{Customer, Ledger, Transaction},
    loader::parse_timestamp_str,
    scoring::{risk_score, top_suspicious, RiskLevel},
};

fn txn(id: i64, customer_id: i64, when: &str, amount: f64, category: &str) -> Transaction {
    Transaction {
        transaction_id: id,
        customer_id,
        transaction_date: parse_timestamp_str(when).unwrap(),
        amount,
        category: category.into(),
        region: "Midwest".into(),
    }
}

fn ledger(transactions: Vec<Transaction>) -> Ledger {
    let signup = parse_timestamp_str("2023-01-01").unwrap().date();
    let mut ids: Vec<i64> = transactions.iter().map(|t| t.customer_id).collect();
    ids.sort_unstable();
    ids.dedup();
    Ledger::new(ids.into_iter().map(|id| Customer::bare(id, signup)).collect(), transactions)
}

/// Every flag combination scores a subset sum of {50, 25, 15, 10}.
#[test]
fn score_is_a_subset_sum_of_weights() {
    let allowed = [0, 10, 15, 25, 35, 40, 50, 60, 65, 75, 85, 90, 100];
    let weights = RiskWeights::default();

    for bits in 0u8..16 {
        let flags = RiskFlags {
            amount_anomaly: bits & 1 != 0,
            high_amount:    bits & 2 != 0,
            velocity:       bits & 4 != 0,
            risky_category: bits & 8 != 0,
        };
        let score = risk_score(&flags, &weights);
        assert!(allowed.contains(&score), "unexpected score {score} for {flags:?}");
    }

    let all = RiskFlags { amount_anomaly: true, high_amount: true, velocity: true, risky_category: true };
    assert_eq!(risk_score(&all, &weights), 100);
    assert_eq!(risk_score(&RiskFlags::default(), &weights), 0);
}

/// Level boundaries sit at 24/25 and 49/50.
#[test]
fn level_boundaries() {
    assert_eq!(RiskLevel::from_score(24), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(25), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(49), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
}

/// Scores and levels flow through a full pipeline run.
#[test]
fn pipeline_scores_each_transaction() {
    let outputs = Pipeline::default()
        .run(&ledger(vec![
            txn(1, 1, "2024-01-01", 20.0, "Grocery"),      // nothing
            txn(2, 2, "2024-01-01", 20.0, "Travel"),       // risky
            txn(3, 3, "2024-01-01", 1500.0, "Fuel"),       // high amount
            txn(4, 4, "2024-01-01", 1500.0, "Electronics"), // high + risky
        ]))
        .unwrap();

    let got: Vec<(u32, RiskLevel)> =
        outputs.scored.iter().map(|s| (s.risk_score, s.risk_level)).collect();
    assert_eq!(
        got,
        vec![
            (0, RiskLevel::Low),
            (10, RiskLevel::Low),
            (25, RiskLevel::Medium),
            (35, RiskLevel::Medium),
        ]
    );
}

/// Top-N is sorted by score; ties keep their original order.
#[test]
fn top_suspicious_is_stable() {
    let outputs = Pipeline::default()
        .run(&ledger(vec![
            txn(1, 1, "2024-01-01", 20.0, "Travel"),
            txn(2, 2, "2024-01-01", 1500.0, "Fuel"),
            txn(3, 3, "2024-01-01", 20.0, "Electronics"),
            txn(4, 4, "2024-01-01", 20.0, "Grocery"),
        ]))
        .unwrap();

    let ids = |v: &[ledgerscope_core::scoring::ScoredTransaction]| -> Vec<i64> {
        v.iter().map(|s| s.flagged.aggregated.transaction.transaction_id).collect()
    };

    assert_eq!(ids(&top_suspicious(&outputs.scored, 3)), vec![2, 1, 3], "ties keep input order");
    assert_eq!(ids(&top_suspicious(&outputs.scored, 10)).len(), 4, "N larger than the table");
    assert!(top_suspicious(&outputs.scored, 0).is_empty());
    assert_eq!(outputs.top_suspicious.len(), 4, "default N is 50");
}

/// The top-N size comes from configuration.
#[test]
fn top_suspicious_size_follows_config() {
    let mut config = PipelineConfig::default();
    config.output.top_suspicious = 1;
    let outputs = Pipeline::new(config)
        .run(&ledger(vec![
            txn(1, 1, "2024-01-01", 20.0, "Grocery"),
            txn(2, 1, "2024-01-02", 2000.0, "Travel"),
        ]))
        .unwrap();

    assert_eq!(outputs.top_suspicious.len(), 1);
    assert_eq!(outputs.top_suspicious[0].flagged.aggregated.transaction.transaction_id, 2);
}

/// Weights whose full sum overflows are refused before any stage runs.
#[test]
fn overflowing_weights_fail_before_scoring() {
    let mut config = PipelineConfig::default();
    config.risk.weights.high_amount = u32::MAX;
    config.risk.weights.risky_category = u32::MAX;

    let result = Pipeline::new(config).run(&ledger(vec![txn(1, 1, "2024-01-01", 5000.0, "Travel")]));
    let err = result.expect_err("config must be rejected");
    assert!(err.to_string().contains("risk.weights"), "message names the setting: {err}");
}

/// Saturating arithmetic keeps the score function total.
#[test]
fn huge_weights_saturate() {
    let weights = RiskWeights { amount_anomaly: u32::MAX, high_amount: 1, velocity: 0, risky_category: 0 };
    let flags = RiskFlags { amount_anomaly: true, high_amount: true, ..RiskFlags::default() };
    assert_eq!(risk_score(&flags, &weights), u32::MAX);
}
