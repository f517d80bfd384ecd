//! RFM segmentation engine: quantile-binned R/F/M and ordered segment rules.
//!
//! This stage:
//!   1. Restricts scoring to customers with at least one purchase
//!   2. Bins recency (ascending recency → descending score), the stable rank
//!      of frequency, and the stable rank of spend into quantile buckets
//!   3. Labels each scored customer with the FIRST matching segment rule
//!   4. Labels everyone else "No Purchases" with no R/F/M
//!
//! Buckets are computed over the scored subset only. With fewer distinct
//! values than buckets, duplicate edges leave buckets empty instead of
//! failing.

use crate::{
    config::SegmentationConfig,
    kpi::CustomerKpi,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "VIP")]
    Vip,
    #[serde(rename = "Loyal")]
    Loyal,
    #[serde(rename = "At-Risk Loyal")]
    AtRiskLoyal,
    #[serde(rename = "Churned/Cold")]
    ChurnedCold,
    #[serde(rename = "Big Spender (Rare)")]
    BigSpenderRare,
    #[serde(rename = "Regular")]
    Regular,
    #[serde(rename = "No Purchases")]
    NoPurchases,
}

impl Segment {
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Vip            => "VIP",
            Segment::Loyal          => "Loyal",
            Segment::AtRiskLoyal    => "At-Risk Loyal",
            Segment::ChurnedCold    => "Churned/Cold",
            Segment::BigSpenderRare => "Big Spender (Rare)",
            Segment::Regular        => "Regular",
            Segment::NoPurchases    => "No Purchases",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfmScores {
    pub r: u8,
    pub f: u8,
    pub m: u8,
}

/// One entry of the ordered classifier.
pub struct SegmentRule {
    pub segment: Segment,
    pub matches: fn(&RfmScores) -> bool,
}

/// Evaluated top to bottom; the first match wins and later rules are never
/// consulted. Anything left over is `Regular`.
pub const SEGMENT_RULES: [SegmentRule; 5] = [
    SegmentRule { segment: Segment::Vip,            matches: |s| s.r >= 4 && s.f >= 4 && s.m >= 4 },
    SegmentRule { segment: Segment::Loyal,          matches: |s| s.r >= 4 && s.f >= 3 },
    SegmentRule { segment: Segment::AtRiskLoyal,    matches: |s| s.r <= 2 && s.f >= 3 },
    SegmentRule { segment: Segment::ChurnedCold,    matches: |s| s.r <= 2 && s.f <= 2 },
    SegmentRule { segment: Segment::BigSpenderRare, matches: |s| s.f <= 2 && s.m >= 4 },
];

pub fn classify(scores: &RfmScores) -> Segment {
    SEGMENT_RULES
        .iter()
        .find(|rule| (rule.matches)(scores))
        .map(|rule| rule.segment)
        .unwrap_or(Segment::Regular)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub kpi:     CustomerKpi,
    pub rfm:     Option<RfmScores>,
    pub segment: Segment,
}

pub fn segment_customers(kpis: &[CustomerKpi], config: &SegmentationConfig) -> Vec<CustomerSegment> {
    let buckets = config.quantile_buckets;
    let scored: Vec<&CustomerKpi> = kpis.iter().filter(|k| k.has_purchases()).collect();

    let recency: Vec<f64> = scored.iter().map(|k| k.recency_days as f64).collect();
    let frequency: Vec<f64> = scored.iter().map(|k| k.txn_count as f64).collect();
    let monetary: Vec<f64> = scored.iter().map(|k| k.total_spend).collect();

    let r_bins = quantile_bins(&recency, buckets);
    let f_bins = quantile_bins(&first_occurrence_ranks(&frequency), buckets);
    let m_bins = quantile_bins(&first_occurrence_ranks(&monetary), buckets);

    log::debug!(
        "rfm: effective buckets r={} f={} m={}",
        distinct_count(&r_bins),
        distinct_count(&f_bins),
        distinct_count(&m_bins)
    );

    let mut scores = r_bins
        .iter()
        .zip(&f_bins)
        .zip(&m_bins)
        .map(|((&r, &f), &m)| RfmScores { r: buckets - r + 1, f, m });

    let out: Vec<CustomerSegment> = kpis
        .iter()
        .map(|kpi| {
            // `scores` yields in the same order as the filtered subset.
            let rfm = if kpi.has_purchases() { scores.next() } else { None };
            CustomerSegment {
                kpi: kpi.clone(),
                rfm,
                segment: rfm.as_ref().map(classify).unwrap_or(Segment::NoPurchases),
            }
        })
        .collect();

    log::info!("rfm: {} customers segmented, {} scored", out.len(), scored.len());
    out
}

/// 1-based rank by value; equal values rank in order of appearance.
pub fn first_occurrence_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = (rank + 1) as f64;
    }
    ranks
}

/// Equal-count quantile buckets, 1 = lowest values.
///
/// Edges sit at the i/buckets quantiles (linear interpolation). A value
/// lands in the first bucket whose upper edge is ≥ the value, so repeated
/// edges simply leave some buckets empty.
pub fn quantile_bins(values: &[f64], buckets: u8) -> Vec<u8> {
    if values.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let k = buckets as usize;
    let upper_edges: Vec<f64> = (1..=k)
        .map(|i| {
            // Position i*(n-1)/k, split into whole and remainder to keep
            // exact edges wherever the position is integral.
            let num = i * (n - 1);
            let lo = num / k;
            let rem = num % k;
            if rem == 0 {
                sorted[lo]
            } else {
                sorted[lo] + (sorted[lo + 1] - sorted[lo]) * rem as f64 / k as f64
            }
        })
        .collect();

    values
        .iter()
        .map(|v| {
            let bucket = upper_edges.iter().position(|edge| v <= edge).unwrap_or(k - 1);
            (bucket + 1) as u8
        })
        .collect()
}

fn distinct_count(bins: &[u8]) -> usize {
    bins.iter().collect::<BTreeSet<_>>().len()
}
