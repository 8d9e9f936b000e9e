//! # EdgeIQ Metrics Engine
//!
//! This crate turns a trader's raw trade history into performance statistics:
//! the headline summary, the equity curve, and the grouped breakdowns used by
//! the session, strategy, calendar, mistake and emotion views.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage or
//!   caching. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `MetricsEngine` is a stateless calculator. It takes
//!   an immutable slice of trades and returns fresh report structs, so the same input
//!   always yields the same output.
//! - **No Failure on Empty Input:** Every view defines an explicit zero result for an
//!   empty trade set. Divisions are guarded; nothing produces NaN.
//!
//! ## Public API
//!
//! - `MetricsEngine`: The calculator.
//! - `PerformanceSummary`, `EquityPoint`, `GroupPerformance`, `DailyPnl`, `MistakeStat`,
//!   `EmotionStat`, `PeriodDigest`: The report structs.
//! - `AnalyticsError`: Returned only for invalid caller input.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use report::{
    DailyPnl, EmotionStat, EquityPoint, Granularity, GroupPerformance, MistakeStat,
    PerformanceSummary, PeriodDigest, ProfitFactor, SessionPerformance, StrategyPerformance,
};
