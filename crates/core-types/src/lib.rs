//! # EdgeIQ Core Types
//!
//! The shared vocabulary of the workspace: the `Trade` record with its
//! enumerated tags, the behavior snapshot produced by each analysis run, and
//! the period report persisted by the report assembler.
//!
//! As a Layer 0 crate it has no knowledge of storage, transport, or the
//! analytics themselves. The only logic that lives here is the derived-field
//! recomputation of a trade, so that the invariant between prices and
//! `pnl`/`status`/`r_multiple` can be audited in one place.

pub mod behavior;
pub mod enums;
pub mod error;
pub mod range;
pub mod report;
pub mod rounding;
pub mod trade;

// Re-export the core types to provide a clean public API.
pub use behavior::{BehaviorFlags, BehaviorKind, BehaviorSnapshot};
pub use enums::{
    Direction, EmotionAfter, EmotionBefore, Market, MistakeTag, Session, Severity, Strategy,
    TradeStatus,
};
pub use error::CoreError;
pub use range::{DateRange, RangePreset};
pub use report::{FlagSummary, PeriodReport, PeriodStats};
pub use trade::{NewTrade, Trade, TradeEdit};
