use crate::enums::Severity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregated numbers for one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub total_trades: u32,
    pub win_count: u32,
    pub loss_count: u32,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub avg_r_multiple: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    /// Taken from the narrative generator's rating; zero when it gave none.
    pub discipline_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
    pub severity: Severity,
}

/// A stored report. At most one exists per `(owner_id, period_start)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub stats: PeriodStats,
    pub behavioral_flags: Vec<FlagSummary>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
