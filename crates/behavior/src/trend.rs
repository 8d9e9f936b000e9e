use chrono::{DateTime, Utc};
use core_types::rounding::round_pct;
use core_types::{BehaviorFlags, BehaviorKind, BehaviorSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often each behavior was flagged across the sampled snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagCounts {
    pub overtrading: u32,
    pub revenge_trade: u32,
    pub fomo: u32,
    pub inconsistent_risk: u32,
    pub emotional_bias: u32,
}

impl FlagCounts {
    fn record(&mut self, flags: &BehaviorFlags) {
        for kind in flags.active() {
            let slot = match kind {
                BehaviorKind::Overtrading => &mut self.overtrading,
                BehaviorKind::RevengeTrade => &mut self.revenge_trade,
                BehaviorKind::Fomo => &mut self.fomo,
                BehaviorKind::InconsistentRisk => &mut self.inconsistent_risk,
                BehaviorKind::EmotionalBias => &mut self.emotional_bias,
            };
            *slot += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub taken_at: DateTime<Utc>,
    pub discipline_score: Decimal,
    pub consistency_score: Decimal,
}

/// A summary of an owner's recent behavior snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTrend {
    /// Flags of the most recent snapshot.
    pub current: BehaviorFlags,
    pub avg_discipline_score: Decimal,
    pub avg_consistency_score: Decimal,
    pub flag_counts: FlagCounts,
    /// The most recent snapshots, newest first.
    pub trend: Vec<TrendPoint>,
    /// Number of snapshots the averages and counts were taken over.
    pub sample_size: usize,
}

/// Summarizes up to `sample_size` of the newest `snapshots`.
///
/// Returns `None` when there are no snapshots; an owner without history has
/// no trend rather than a zero one.
pub fn summarize(
    snapshots: &[BehaviorSnapshot],
    sample_size: usize,
    series_len: usize,
) -> Option<BehaviorTrend> {
    let mut newest: Vec<&BehaviorSnapshot> = snapshots.iter().collect();
    newest.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
    newest.truncate(sample_size);

    let latest = newest.first()?;
    let n = Decimal::from(newest.len());

    let mut flag_counts = FlagCounts::default();
    let mut discipline = Decimal::ZERO;
    let mut consistency = Decimal::ZERO;
    for snapshot in &newest {
        flag_counts.record(&snapshot.flags);
        discipline += snapshot.discipline_score;
        consistency += snapshot.consistency_score;
    }

    Some(BehaviorTrend {
        current: latest.flags,
        avg_discipline_score: round_pct(discipline / n),
        avg_consistency_score: round_pct(consistency / n),
        flag_counts,
        trend: newest
            .iter()
            .take(series_len)
            .map(|s| TrendPoint {
                taken_at: s.taken_at,
                discipline_score: s.discipline_score,
                consistency_score: s.consistency_score,
            })
            .collect(),
        sample_size: newest.len(),
    })
}
