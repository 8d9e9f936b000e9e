use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The closed set of behavioral patterns the detector looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Overtrading,
    RevengeTrade,
    Fomo,
    InconsistentRisk,
    EmotionalBias,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 5] = [
        BehaviorKind::Overtrading,
        BehaviorKind::RevengeTrade,
        BehaviorKind::Fomo,
        BehaviorKind::InconsistentRisk,
        BehaviorKind::EmotionalBias,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::Overtrading => "overtrading",
            BehaviorKind::RevengeTrade => "revenge_trade",
            BehaviorKind::Fomo => "fomo",
            BehaviorKind::InconsistentRisk => "inconsistent_risk",
            BehaviorKind::EmotionalBias => "emotional_bias",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one detector run: one flag per [`BehaviorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BehaviorFlags {
    pub overtrading: bool,
    pub revenge_trade: bool,
    pub fomo: bool,
    pub inconsistent_risk: bool,
    pub emotional_bias: bool,
}

impl BehaviorFlags {
    pub fn is_set(&self, kind: BehaviorKind) -> bool {
        match kind {
            BehaviorKind::Overtrading => self.overtrading,
            BehaviorKind::RevengeTrade => self.revenge_trade,
            BehaviorKind::Fomo => self.fomo,
            BehaviorKind::InconsistentRisk => self.inconsistent_risk,
            BehaviorKind::EmotionalBias => self.emotional_bias,
        }
    }

    /// The kinds that were detected, in declaration order.
    pub fn active(&self) -> impl Iterator<Item = BehaviorKind> + '_ {
        BehaviorKind::ALL.into_iter().filter(|kind| self.is_set(*kind))
    }

    pub fn any(&self) -> bool {
        self.active().next().is_some()
    }
}

/// The persisted result of one analysis run. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub flags: BehaviorFlags,
    /// 0 to 100.
    pub discipline_score: Decimal,
    /// 0 to 100, one decimal.
    pub consistency_score: Decimal,
    /// Number of trades inside the look-back window.
    pub trade_count: u32,
}
