//! Pipeline configuration.
//!
//! Every threshold and weight the engines use is a named constant here.
//! `PipelineConfig::default()` reproduces the reference behaviour exactly;
//! a JSON file may override any subset of fields.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

// ── Risk defaults ────────────────────────────────────────────────────────────

pub const ANOMALY_Z_THRESHOLD: f64 = 3.0;
pub const HIGH_AMOUNT_THRESHOLD: f64 = 1000.0;
pub const VELOCITY_THRESHOLD: u32 = 8; // same-day transactions
pub const DEFAULT_RISKY_CATEGORIES: [&str; 2] = ["Electronics", "Travel"];

pub const WEIGHT_AMOUNT_ANOMALY: u32 = 50;
pub const WEIGHT_HIGH_AMOUNT: u32 = 25;
pub const WEIGHT_VELOCITY: u32 = 15;
pub const WEIGHT_RISKY_CATEGORY: u32 = 10;

// ── Segmentation defaults ────────────────────────────────────────────────────

pub const CHURN_WINDOW_DAYS: i64 = 90;
pub const RECENCY_SENTINEL_DAYS: i64 = 9999;
pub const DAYS_PER_MONTH: f64 = 30.0;
pub const QUANTILE_BUCKETS: u8 = 5;
pub const MAX_QUANTILE_BUCKETS: u8 = u8::MAX - 1; // R = buckets + 1 - bin must fit in u8

// ── Output defaults ──────────────────────────────────────────────────────────

pub const TOP_SUSPICIOUS_COUNT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub risk:         RiskConfig,
    pub segmentation: SegmentationConfig,
    pub output:       OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub anomaly_z_threshold:   f64,
    pub high_amount_threshold: f64,
    pub velocity_threshold:    u32,
    pub risky_categories:      BTreeSet<String>,
    pub weights:               RiskWeights,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            anomaly_z_threshold:   ANOMALY_Z_THRESHOLD,
            high_amount_threshold: HIGH_AMOUNT_THRESHOLD,
            velocity_threshold:    VELOCITY_THRESHOLD,
            risky_categories:      DEFAULT_RISKY_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            weights:               RiskWeights::default(),
        }
    }
}

/// Points contributed by each flag to the transaction risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub amount_anomaly: u32,
    pub high_amount:    u32,
    pub velocity:       u32,
    pub risky_category: u32,
}

impl RiskWeights {
    /// Score of a transaction with every flag raised. None if it overflows.
    pub fn total(&self) -> Option<u32> {
        self.amount_anomaly
            .checked_add(self.high_amount)?
            .checked_add(self.velocity)?
            .checked_add(self.risky_category)
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            amount_anomaly: WEIGHT_AMOUNT_ANOMALY,
            high_amount:    WEIGHT_HIGH_AMOUNT,
            velocity:       WEIGHT_VELOCITY,
            risky_category: WEIGHT_RISKY_CATEGORY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub churn_window_days:     i64,
    pub recency_sentinel_days: i64,
    pub days_per_month:        f64,
    pub quantile_buckets:      u8,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            churn_window_days:     CHURN_WINDOW_DAYS,
            recency_sentinel_days: RECENCY_SENTINEL_DAYS,
            days_per_month:        DAYS_PER_MONTH,
            quantile_buckets:      QUANTILE_BUCKETS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub top_suspicious: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { top_suspicious: TOP_SUSPICIOUS_COUNT }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Keys absent from the file keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no engine can run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.segmentation.quantile_buckets == 0 {
            bail!("segmentation.quantile_buckets must be at least 1");
        }
        if self.segmentation.quantile_buckets > MAX_QUANTILE_BUCKETS {
            bail!(
                "segmentation.quantile_buckets must be at most {MAX_QUANTILE_BUCKETS}, got {}",
                self.segmentation.quantile_buckets
            );
        }
        let days_per_month = self.segmentation.days_per_month;
        if days_per_month.is_nan() || days_per_month <= 0.0 {
            bail!(
                "segmentation.days_per_month must be positive, got {}",
                self.segmentation.days_per_month
            );
        }
        if self.risk.anomaly_z_threshold.is_nan() || self.risk.high_amount_threshold.is_nan() {
            bail!("risk thresholds must be numbers");
        }
        if self.risk.weights.total().is_none() {
            bail!("risk.weights must sum to at most {}", u32::MAX);
        }
        Ok(())
    }
}
