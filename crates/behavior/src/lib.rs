//! # EdgeIQ Behavior Analysis
//!
//! Rule-based detection of risky trading habits and the scores derived from
//! them. Like `analytics`, this is a pure Layer 1 crate: callers fetch the
//! trades and snapshots, this crate only computes.
//!
//! - `PatternDetector` evaluates the five behavior rules over a look-back window.
//! - `Scorer` turns the detected flags into a discipline score and rates the
//!   stability of recent win rates as a consistency score.
//! - `BehaviorEngine` runs both and yields a `BehaviorAnalysis`, or nothing for
//!   an empty window.
//! - `trend::summarize` condenses stored snapshots into a `BehaviorTrend`.

pub mod analysis;
pub mod detector;
pub mod scorer;
pub mod trend;

pub use analysis::{AnalysisInput, BehaviorAnalysis, BehaviorEngine};
pub use detector::PatternDetector;
pub use scorer::Scorer;
pub use trend::{BehaviorTrend, FlagCounts, TrendPoint, summarize};
