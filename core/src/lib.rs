//! ledgerscope-core: batch transaction-risk and customer-segmentation pipeline.
//!
//! A run borrows one immutable [`ledger::Ledger`] and produces five tables:
//! transaction risk flags, customer risk summary, top suspicious
//! transactions, customer KPIs with RFM segments, and monthly retention.

pub mod aggregation;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod export;
pub mod flags;
pub mod generator;
pub mod kpi;
pub mod ledger;
pub mod loader;
pub mod name_generator;
pub mod retention;
pub mod rfm;
pub mod risk_summary;
pub mod rng;
pub mod scoring;
pub mod store;
pub mod types;

pub use config::PipelineConfig;
pub use engine::{Pipeline, PipelineOutputs};
pub use error::{PipelineError, PipelineResult};
pub use ledger::{Customer, Ledger, Transaction};
