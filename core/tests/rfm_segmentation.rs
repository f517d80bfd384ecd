//! RFM segmentation: quantile scores and the ordered segment rules.

use chrono::{Duration, NaiveDate, NaiveTime};
use ledgerscope_core::{
    config::{PipelineConfig, SegmentationConfig, MAX_QUANTILE_BUCKETS},
    engine::Pipeline,
    kpi::compute_customer_kpis,
    ledger::{Customer, Ledger, Transaction},
    rfm::{segment_customers, RfmScores, Segment},
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn txn(id: i64, customer_id: i64, date: NaiveDate, amount: f64) -> Transaction {
    Transaction {
        transaction_id: id,
        customer_id,
        transaction_date: date.and_time(NaiveTime::MIN),
        amount,
        category: "Fashion".into(),
        region: "South".into(),
    }
}

/// Customers 1..=5 where customer i buys i times, spends 10*i each time,
/// and last bought on Jan (10 + i); customer 6 never buys.
fn graded_ledger() -> Ledger {
    let customers = (1..=6).map(|id| Customer::bare(id, day(2023, 1, 1))).collect();
    let mut transactions = Vec::new();
    let mut next_id = 1;
    for c in 1..=5i64 {
        let last = day(2024, 1, 10 + c as u32);
        for j in 0..c {
            transactions.push(txn(next_id, c, last - Duration::days(j), 10.0 * c as f64));
            next_id += 1;
        }
    }
    Ledger::new(customers, transactions)
}

fn segments_of(ledger: &Ledger) -> Vec<(Option<RfmScores>, Segment)> {
    let config = SegmentationConfig::default();
    let kpis = compute_customer_kpis(ledger, &config);
    segment_customers(&kpis, &config)
        .into_iter()
        .map(|s| (s.rfm, s.segment))
        .collect()
}

/// Strictly graded customers land in distinct quintiles.
#[test]
fn graded_customers_get_graded_scores() {
    let got = segments_of(&graded_ledger());
    let scores: Vec<Option<(u8, u8, u8)>> =
        got.iter().map(|(s, _)| s.map(|s| (s.r, s.f, s.m))).collect();

    assert_eq!(
        scores,
        vec![
            Some((1, 1, 1)),
            Some((2, 2, 2)),
            Some((3, 3, 3)),
            Some((4, 4, 4)),
            Some((5, 5, 5)),
            None,
        ]
    );
}

/// The first matching rule wins: a 4/4/4 customer also satisfies Loyal
/// but is labelled VIP.
#[test]
fn vip_wins_over_loyal() {
    let segments: Vec<Segment> = segments_of(&graded_ledger()).into_iter().map(|(_, s)| s).collect();
    assert_eq!(
        segments,
        vec![
            Segment::ChurnedCold,
            Segment::ChurnedCold,
            Segment::Regular,
            Segment::Vip,
            Segment::Vip,
            Segment::NoPurchases,
        ]
    );
}

/// Non-purchasers are "No Purchases" with no R/F/M at all.
#[test]
fn no_purchases_has_no_scores() {
    let got = segments_of(&graded_ledger());
    let (rfm, segment) = got.last().unwrap();
    assert!(rfm.is_none());
    assert_eq!(*segment, Segment::NoPurchases);
    assert_eq!(segment.label(), "No Purchases");
}

/// One row per KPI row, in the same order.
#[test]
fn one_segment_row_per_customer() {
    let outputs = Pipeline::default().run(&graded_ledger()).unwrap();
    assert_eq!(outputs.segments.len(), 6);
    let ids: Vec<i64> = outputs.segments.iter().map(|s| s.kpi.customer_id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
}

/// A single purchasing customer is scored without failing.
#[test]
fn single_scored_customer_degrades_gracefully() {
    let ledger = Ledger::new(
        vec![Customer::bare(1, day(2023, 1, 1)), Customer::bare(2, day(2023, 1, 1))],
        vec![txn(1, 1, day(2024, 2, 1), 99.0)],
    );
    let got = segments_of(&ledger);
    let scores = got[0].0.expect("purchaser is scored");
    assert_eq!(scores, RfmScores { r: 5, f: 1, m: 1 });
    assert_eq!(got[0].1, Segment::Regular);
    assert_eq!(got[1].1, Segment::NoPurchases);
}

/// With fewer distinct values than buckets every score stays in 1..=5.
#[test]
fn duplicate_values_stay_in_range() {
    let customers = (1..=8).map(|id| Customer::bare(id, day(2023, 1, 1))).collect();
    let transactions = (1..=8)
        .map(|id| txn(id, id, day(2024, 3, 1), 20.0))
        .collect();
    let got = segments_of(&Ledger::new(customers, transactions));

    for (rfm, segment) in &got {
        let s = rfm.expect("all customers purchased");
        for v in [s.r, s.f, s.m] {
            assert!((1..=5).contains(&v), "score {v} out of range");
        }
        assert_ne!(*segment, Segment::NoPurchases);
    }
    assert!(
        got.iter().all(|(s, _)| s.map(|s| s.r) == Some(5)),
        "identical recency collapses into the lowest recency bucket"
    );
}

/// An empty ledger yields no segment rows and no failure.
#[test]
fn empty_registry() {
    assert!(segments_of(&Ledger::default()).is_empty());
}

/// A bucket count whose inverted recency would not fit is refused up front.
#[test]
fn oversized_bucket_count_is_rejected() {
    let mut config = PipelineConfig::default();
    config.segmentation.quantile_buckets = u8::MAX;
    let err = Pipeline::new(config).run(&graded_ledger()).expect_err("255 buckets");
    assert!(err.to_string().contains("quantile_buckets"), "got: {err}");
}

/// The largest accepted bucket count scores recency without overflow.
#[test]
fn largest_bucket_count_runs() {
    let mut config = PipelineConfig::default();
    config.segmentation.quantile_buckets = MAX_QUANTILE_BUCKETS;
    let outputs = Pipeline::new(config).run(&graded_ledger()).expect("254 buckets");

    let most_recent = outputs.segments[4].rfm.expect("customer 5 purchased");
    assert_eq!(most_recent.r, MAX_QUANTILE_BUCKETS);
    let least_recent = outputs.segments[0].rfm.expect("customer 1 purchased");
    assert_eq!(least_recent.r, 1);
}
