//! # EdgeIQ Engine
//!
//! Orchestrates the pure analytics and behavior crates over trades fetched
//! from the record store.
//!
//! - `AnalyticsService`: the metrics views, read through the cache.
//! - `TradeJournal`: trade writes, with cache invalidation and a queued
//!   behavior analysis after each one.
//! - `BehaviorAnalyzer` / `AnalysisQueue`: detector and scorer runs, recorded
//!   as snapshots, on demand or in the background.
//! - `ReportAssembler`: period reports written by the narrative generator.

mod cached;
pub mod analyzer;
pub mod error;
pub mod journal;
pub mod report;
pub mod service;

pub use analyzer::{AnalysisHandle, AnalysisQueue, BehaviorAnalyzer};
pub use error::EngineError;
pub use journal::{DEFAULT_PAGE_SIZE, MAX_IMPORT, MAX_PAGE_SIZE, TradeJournal, TradePage};
pub use report::{GeneratedReport, ReportAssembler, weekly_period};
pub use service::AnalyticsService;
