//! The run log: an ordered record of what each stage produced.
//!
//! RULE: Events carry no wall-clock data. Two runs over the same ledger
//! must produce identical logs.

use crate::types::RunId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        transactions: usize,
        customers:    usize,
    },
    StageCompleted {
        stage: Stage,
        rows:  usize,
    },
    RunCompleted {
        reference_date: Option<NaiveDateTime>,
    },
}

impl PipelineEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            PipelineEvent::RunStarted { .. }     => "run_started",
            PipelineEvent::StageCompleted { .. } => "stage_completed",
            PipelineEvent::RunCompleted { .. }   => "run_completed",
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Aggregation,
    Flags,
    Scoring,
    CustomerRiskSummary,
    TopSuspicious,
    Kpi,
    RfmSegmentation,
    Retention,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Aggregation         => "aggregation",
            Stage::Flags               => "flags",
            Stage::Scoring             => "scoring",
            Stage::CustomerRiskSummary => "customer_risk_summary",
            Stage::TopSuspicious       => "top_suspicious",
            Stage::Kpi                 => "kpi",
            Stage::RfmSegmentation     => "rfm_segmentation",
            Stage::Retention           => "retention",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        u64,
    pub event_type: String,
    pub payload:    String, // JSON-serialized PipelineEvent
}
