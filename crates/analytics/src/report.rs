use chrono::NaiveDate;
use core_types::{EmotionBefore, MistakeTag, Session, Strategy, TradeStatus};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gross profit over gross loss.
///
/// A trade set with profits and no losses has an unbounded profit factor,
/// which no `Decimal` can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitFactor {
    Finite(Decimal),
    Infinite,
}

impl ProfitFactor {
    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            ProfitFactor::Finite(value) => Some(*value),
            ProfitFactor::Infinite => None,
        }
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Finite(Decimal::ZERO)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(value) => write!(f, "{value}"),
            ProfitFactor::Infinite => f.write_str("Infinity"),
        }
    }
}

// The infinite case travels as the string "Infinity", as JSON has no infinity.
impl Serialize for ProfitFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Finite(value) => Serialize::serialize(value, serializer),
            ProfitFactor::Infinite => serializer.serialize_str("Infinity"),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) if text == "Infinity" => Ok(ProfitFactor::Infinite),
            Repr::Text(text) => text
                .parse::<Decimal>()
                .map(ProfitFactor::Finite)
                .map_err(de::Error::custom),
            Repr::Number(number) => Decimal::try_from(number)
                .map(ProfitFactor::Finite)
                .map_err(de::Error::custom),
        }
    }
}

/// The headline statistics for one owner over one date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: Decimal,
    /// Percent of closed trades that won.
    pub win_rate: Decimal,
    pub avg_r_multiple: Decimal,
    pub profit_factor: ProfitFactor,
    /// Largest decline from the cumulative pnl peak, in percent of that peak.
    pub max_drawdown: Decimal,
    pub current_streak: usize,
    pub streak_type: Option<TradeStatus>,
    pub avg_win: Decimal,
    /// Positive magnitude of the average losing trade.
    pub avg_loss: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
}

impl PerformanceSummary {
    /// Creates a zeroed-out summary, which is the answer for an empty range.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            closed_trades: 0,
            wins: 0,
            losses: 0,
            total_pnl: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            avg_r_multiple: Decimal::ZERO,
            profit_factor: ProfitFactor::default(),
            max_drawdown: Decimal::ZERO,
            current_streak: 0,
            streak_type: None,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            best_trade: Decimal::ZERO,
            worst_trade: Decimal::ZERO,
        }
    }
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// How equity-curve points are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One point per closed trade.
    #[default]
    Trade,
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Trade => "trade",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cumulative_pnl: Decimal,
    pub trade_pnl: Decimal,
}

/// Closed-trade performance for one value of a grouping tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPerformance<K> {
    pub group: K,
    pub total_trades: usize,
    pub wins: usize,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    /// Mean over the trades that have an R-multiple; `None` when none do.
    pub avg_r_multiple: Option<Decimal>,
}

pub type SessionPerformance = GroupPerformance<Session>;
pub type StrategyPerformance = GroupPerformance<Strategy>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub pnl: Decimal,
    pub trades: usize,
    pub wins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeStat {
    pub tag: MistakeTag,
    pub count: usize,
    /// Sum of the negative pnl of the tagged trades (zero or below).
    pub total_pnl_lost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionStat {
    pub emotion: EmotionBefore,
    pub trades: usize,
    pub wins: usize,
    pub pnl: Decimal,
    pub win_rate: Decimal,
}

/// The closed-trade aggregates handed to the narrative generator for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDigest {
    pub total_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub avg_r_multiple: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    /// Mistake tag frequencies, most frequent first.
    pub mistakes: Vec<(MistakeTag, usize)>,
    pub strategies: Vec<Strategy>,
    pub sessions: Vec<Session>,
    /// Pre-trade emotion of every trade, in chronological order.
    pub emotions: Vec<EmotionBefore>,
}
