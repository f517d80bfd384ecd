//! The pipeline engine: runs every stage over one immutable ledger.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Aggregation            (customer stats + daily velocity)
//!   2. Flags
//!   3. Scoring
//!   4. Customer risk summary
//!   5. Top-N suspicious view
//!   6. KPIs                   (reads the raw ledger, not stages 1-5)
//!   7. RFM segmentation
//!   8. Retention              (reads the raw ledger)
//!
//! RULES:
//!   - The ledger is borrowed, never mutated; each stage returns a fresh table.
//!   - The risk half (1-5) and the segmentation half (6-8) share only the ledger.
//!   - No randomness, no wall clock. Same ledger + config = same outputs.

use crate::{
    aggregation::aggregate,
    config::PipelineConfig,
    error::PipelineResult,
    event::{PipelineEvent, Stage},
    flags::flag_transactions,
    kpi::{compute_customer_kpis, reference_date},
    ledger::Ledger,
    retention::{monthly_retention, MonthlyRetention},
    rfm::{segment_customers, CustomerSegment},
    risk_summary::{summarize_customers, CustomerRiskSummary},
    scoring::{score_transactions, top_suspicious, ScoredTransaction},
};
use chrono::NaiveDateTime;

/// Everything a run produces, ready for export or persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutputs {
    pub scored:         Vec<ScoredTransaction>,
    pub customer_risk:  Vec<CustomerRiskSummary>,
    pub top_suspicious: Vec<ScoredTransaction>,
    pub segments:       Vec<CustomerSegment>,
    pub retention:      Vec<MonthlyRetention>,
    pub reference_date: Option<NaiveDateTime>,
    pub events:         Vec<PipelineEvent>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage in the documented order.
    pub fn run(&self, ledger: &Ledger) -> PipelineResult<PipelineOutputs> {
        self.config.validate()?;

        let mut events = vec![PipelineEvent::RunStarted {
            transactions: ledger.transactions.len(),
            customers:    ledger.customers.len(),
        }];
        let mut completed = |stage: Stage, rows: usize| {
            log::debug!("stage {stage} completed: {rows} rows");
            events.push(PipelineEvent::StageCompleted { stage, rows });
        };

        // Risk half.
        let aggregated = aggregate(&ledger.transactions);
        completed(Stage::Aggregation, aggregated.len());

        let flagged = flag_transactions(&aggregated, &self.config.risk);
        completed(Stage::Flags, flagged.len());

        let scored = score_transactions(&flagged, &self.config.risk);
        completed(Stage::Scoring, scored.len());

        let customer_risk = summarize_customers(&scored);
        completed(Stage::CustomerRiskSummary, customer_risk.len());

        let top = top_suspicious(&scored, self.config.output.top_suspicious);
        completed(Stage::TopSuspicious, top.len());

        // Segmentation half.
        let kpis = compute_customer_kpis(ledger, &self.config.segmentation);
        completed(Stage::Kpi, kpis.len());

        let segments = segment_customers(&kpis, &self.config.segmentation);
        completed(Stage::RfmSegmentation, segments.len());

        let retention = monthly_retention(&ledger.transactions);
        completed(Stage::Retention, retention.len());

        let reference_date = reference_date(&ledger.transactions);
        events.push(PipelineEvent::RunCompleted { reference_date });

        log::info!(
            "pipeline: scored {} transactions, {} customer risk rows, {} segment rows, {} retention months",
            scored.len(),
            customer_risk.len(),
            segments.len(),
            retention.len()
        );

        Ok(PipelineOutputs {
            scored,
            customer_risk,
            top_suspicious: top,
            segments,
            retention,
            reference_date,
            events,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
