//! Scoring engine: weighted risk score and fixed-boundary risk level.
//!
//! Score = Σ weight(flag) over raised flags. Weights come from config;
//! level boundaries do not. They are fixed so the score stays explainable
//! and never rebins with the data.

use crate::{
    config::{RiskConfig, RiskWeights},
    flags::{FlaggedTransaction, RiskFlags},
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Level boundaries (inclusive upper bounds) ───────────────────────────────

pub const LOW_MAX_SCORE: u32 = 24;
pub const MEDIUM_MAX_SCORE: u32 = 49;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s <= LOW_MAX_SCORE    => RiskLevel::Low,
            s if s <= MEDIUM_MAX_SCORE => RiskLevel::Medium,
            _                          => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low    => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High   => "High",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low"    => Some(RiskLevel::Low),
            "Medium" => Some(RiskLevel::Medium),
            "High"   => Some(RiskLevel::High),
            _        => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTransaction {
    pub flagged:    FlaggedTransaction,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
}

impl ScoredTransaction {
    pub fn flags(&self) -> &RiskFlags {
        &self.flagged.flags
    }
}

pub fn risk_score(flags: &RiskFlags, weights: &RiskWeights) -> u32 {
    let mut score: u32 = 0;
    if flags.amount_anomaly {
        score = score.saturating_add(weights.amount_anomaly);
    }
    if flags.high_amount {
        score = score.saturating_add(weights.high_amount);
    }
    if flags.velocity {
        score = score.saturating_add(weights.velocity);
    }
    if flags.risky_category {
        score = score.saturating_add(weights.risky_category);
    }
    score
}

pub fn score_transactions(
    flagged: &[FlaggedTransaction],
    config: &RiskConfig,
) -> Vec<ScoredTransaction> {
    flagged
        .iter()
        .map(|txn| {
            let score = risk_score(&txn.flags, &config.weights);
            ScoredTransaction {
                flagged:    txn.clone(),
                risk_score: score,
                risk_level: RiskLevel::from_score(score),
            }
        })
        .collect()
}

/// The `n` highest-scoring transactions. Ties keep their input order.
pub fn top_suspicious(scored: &[ScoredTransaction], n: usize) -> Vec<ScoredTransaction> {
    let mut ranked: Vec<&ScoredTransaction> = scored.iter().collect();
    ranked.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    ranked.into_iter().take(n).cloned().collect()
}
