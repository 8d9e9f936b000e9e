use crate::detector::PatternDetector;
use crate::scorer::Scorer;
use chrono::{DateTime, Utc};
use configuration::BehaviorSettings;
use core_types::{BehaviorFlags, BehaviorSnapshot, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// The outcome of one detector and scorer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorAnalysis {
    pub flags: BehaviorFlags,
    pub discipline_score: Decimal,
    pub consistency_score: Decimal,
    /// Trades inside the look-back window.
    pub trade_count: u32,
}

impl BehaviorAnalysis {
    pub fn into_snapshot(self, owner_id: Uuid, taken_at: DateTime<Utc>) -> BehaviorSnapshot {
        BehaviorSnapshot {
            id: Uuid::new_v4(),
            owner_id,
            taken_at,
            flags: self.flags,
            discipline_score: self.discipline_score,
            consistency_score: self.consistency_score,
            trade_count: self.trade_count,
        }
    }
}

/// The trades one analysis run looks at, already fetched for a single owner.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    /// Trades created inside the look-back window.
    pub window: &'a [Trade],
    /// Most recent trades by creation time, any status.
    pub recent: &'a [Trade],
    /// Most recent closed trades by trade date.
    pub recent_closed: &'a [Trade],
}

/// Combines the pattern detector with the scorer.
#[derive(Debug, Clone)]
pub struct BehaviorEngine {
    detector: PatternDetector,
    scorer: Scorer,
    settings: BehaviorSettings,
}

impl BehaviorEngine {
    pub fn new(settings: BehaviorSettings) -> Self {
        Self {
            detector: PatternDetector::new(settings.clone()),
            scorer: Scorer::new(settings.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &BehaviorSettings {
        &self.settings
    }

    pub fn detector(&self) -> &PatternDetector {
        &self.detector
    }

    /// Runs every detector and both scorers.
    ///
    /// Returns `None` when the look-back window is empty: an inactive period
    /// produces no result at all rather than an all-clear one.
    pub fn analyze(&self, input: AnalysisInput<'_>) -> Option<BehaviorAnalysis> {
        if input.window.is_empty() {
            return None;
        }

        let flags = self.detector.detect(input.window, input.recent);
        let discipline_score = self.scorer.discipline_score(&flags, input.window);
        let consistency_score = self.scorer.consistency_score(input.recent_closed);
        debug!(
            ?flags,
            %discipline_score,
            %consistency_score,
            window = input.window.len(),
            "Behavior analysis complete"
        );

        Some(BehaviorAnalysis {
            flags,
            discipline_score,
            consistency_score,
            trade_count: u32::try_from(input.window.len()).unwrap_or(u32::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::{Direction, EmotionBefore, NewTrade};
    use rust_decimal_macros::dec;

    fn trade_at(minute: i64, exit: Option<Decimal>) -> Trade {
        let when = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + Duration::minutes(minute);
        let input = NewTrade {
            exit_price: exit,
            stop_loss: Some(dec!(1.0950)),
            trade_date: Some(when),
            ..NewTrade::new("EURUSD", Direction::Long, dec!(1.1000), dec!(1))
        };
        Trade::open(Uuid::new_v4(), input, when).unwrap()
    }

    #[test]
    fn empty_window_produces_nothing() {
        let engine = BehaviorEngine::new(BehaviorSettings::default());
        let history = vec![trade_at(0, Some(dec!(1.1050)))];
        let input = AnalysisInput {
            window: &[],
            recent: &history,
            recent_closed: &history,
        };
        assert!(engine.analyze(input).is_none());
    }

    #[test]
    fn loss_then_quick_fomo_entry() {
        let engine = BehaviorEngine::new(BehaviorSettings::default());
        let mut chase = trade_at(5, None);
        chase.emotion_before = EmotionBefore::Fomo;
        let window = vec![trade_at(0, Some(dec!(1.0960))), chase];

        let analysis = engine
            .analyze(AnalysisInput {
                window: &window,
                recent: &window,
                recent_closed: &window[..1],
            })
            .unwrap();

        assert!(analysis.flags.revenge_trade);
        assert!(analysis.flags.fomo);
        // One of two window trades is FOMO: above the 30% share.
        assert!(analysis.flags.emotional_bias);
        assert!(!analysis.flags.overtrading);
        // 100 - 25 - 15 - 10 + 5 (every trade has a stop).
        assert_eq!(analysis.discipline_score, dec!(55));
        assert_eq!(analysis.consistency_score, dec!(50));
        assert_eq!(analysis.trade_count, 2);

        let owner = Uuid::new_v4();
        let snapshot = analysis.clone().into_snapshot(owner, Utc::now());
        assert_eq!(snapshot.owner_id, owner);
        assert_eq!(snapshot.flags, analysis.flags);
    }
}
