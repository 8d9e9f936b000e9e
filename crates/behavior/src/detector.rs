use chrono::{DateTime, Duration, Utc};
use configuration::BehaviorSettings;
use core_types::{BehaviorFlags, EmotionBefore, Trade, TradeStatus};
use rust_decimal::prelude::*;

/// Rule-based detection of risky trading behavior.
///
/// The sequence-dependent rules (overtrading, revenge trading) order trades by
/// `created_at` themselves, so callers may pass trades in any order.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    settings: BehaviorSettings,
}

impl PatternDetector {
    pub fn new(settings: BehaviorSettings) -> Self {
        Self { settings }
    }

    /// Start of the look-back window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(self.settings.lookback_hours)
    }

    /// Evaluates every rule.
    ///
    /// # Arguments
    ///
    /// * `window` - Trades created inside the look-back window.
    /// * `recent` - The owner's most recent trades by creation time, of any status,
    ///   used for the position-size check.
    pub fn detect(&self, window: &[Trade], recent: &[Trade]) -> BehaviorFlags {
        let ordered = by_creation(window);
        BehaviorFlags {
            overtrading: self.overtrading(&ordered),
            revenge_trade: self.revenge_trade(&ordered),
            fomo: self.fomo(window),
            inconsistent_risk: self.inconsistent_risk(recent),
            emotional_bias: self.emotional_bias(window),
        }
    }

    /// Any run of `overtrading_trade_count` consecutive trades spanning no more
    /// than `overtrading_span_minutes`.
    fn overtrading(&self, ordered: &[&Trade]) -> bool {
        let span = Duration::minutes(self.settings.overtrading_span_minutes);
        ordered
            .windows(self.settings.overtrading_trade_count)
            .any(|run| match (run.first(), run.last()) {
                (Some(first), Some(last)) => last.created_at - first.created_at <= span,
                _ => false,
            })
    }

    /// A loss followed by the next trade within `revenge_gap_minutes`.
    fn revenge_trade(&self, ordered: &[&Trade]) -> bool {
        let gap = Duration::minutes(self.settings.revenge_gap_minutes);
        ordered.windows(2).any(|pair| {
            pair[0].status == TradeStatus::Loss && pair[1].created_at - pair[0].created_at <= gap
        })
    }

    fn fomo(&self, window: &[Trade]) -> bool {
        window.iter().any(|t| {
            t.emotion_before == EmotionBefore::Fomo
                || t.mistake_tag.is_some_and(|tag| tag.is_fomo())
        })
    }

    /// Coefficient of variation of position size above `risk_cv_threshold_pct`.
    fn inconsistent_risk(&self, recent: &[Trade]) -> bool {
        let ordered = by_creation(recent);
        let sizes: Vec<Decimal> = ordered
            .iter()
            .rev()
            .take(self.settings.risk_sample_size)
            .map(|t| t.position_size)
            .filter(|size| !size.is_zero())
            .collect();

        if sizes.len() < self.settings.risk_min_trades {
            return false;
        }
        match coefficient_of_variation(&sizes) {
            Some(cv) => cv > self.settings.risk_cv_threshold_pct,
            None => false,
        }
    }

    /// Share of window trades entered in a negative emotional state above
    /// `emotional_bias_ratio`.
    fn emotional_bias(&self, window: &[Trade]) -> bool {
        if window.is_empty() {
            return false;
        }
        let negative = window.iter().filter(|t| t.emotion_before.is_negative()).count();
        Decimal::from(negative) / Decimal::from(window.len()) > self.settings.emotional_bias_ratio
    }
}

fn by_creation(trades: &[Trade]) -> Vec<&Trade> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.created_at);
    ordered
}

/// Population standard deviation over mean, in percent. `None` unless the mean is positive.
pub(crate) fn coefficient_of_variation(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let n = Decimal::from(values.len());
    let mean = values.iter().copied().sum::<Decimal>() / n;
    if mean <= Decimal::ZERO {
        return None;
    }
    let variance = values
        .iter()
        .map(|v| (*v - mean) * (*v - mean))
        .sum::<Decimal>()
        / n;
    let std_dev = variance.sqrt()?;
    Some(std_dev / mean * Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::{Direction, MistakeTag, NewTrade};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 8, 0, 0).unwrap()
    }

    fn logged(minutes_after: i64, size: Decimal, exit: Option<Decimal>) -> Trade {
        let created = base() + Duration::minutes(minutes_after);
        let input = NewTrade {
            exit_price: exit,
            ..NewTrade::new("XAUUSD", Direction::Long, dec!(100), size)
        };
        Trade::open(Uuid::new_v4(), input, created).unwrap()
    }

    fn detector() -> PatternDetector {
        PatternDetector::new(BehaviorSettings::default())
    }

    #[test]
    fn five_trades_in_three_hours_is_overtrading() {
        let tight: Vec<Trade> = (0..5).map(|i| logged(i * 45, dec!(1), None)).collect();
        assert!(detector().detect(&tight, &[]).overtrading);

        let spread: Vec<Trade> = (0..5).map(|i| logged(i * 75, dec!(1), None)).collect();
        assert!(!detector().detect(&spread, &[]).overtrading);
    }

    #[test]
    fn overtrading_needs_enough_trades() {
        let four: Vec<Trade> = (0..4).map(|i| logged(i, dec!(1), None)).collect();
        assert!(!detector().detect(&four, &[]).overtrading);
    }

    #[test]
    fn trade_soon_after_a_loss_is_revenge() {
        let loss = logged(0, dec!(1), Some(dec!(90)));
        let quick = vec![logged(10, dec!(1), None), loss.clone()];
        assert!(detector().detect(&quick, &[]).revenge_trade);

        let patient = vec![loss, logged(20, dec!(1), None)];
        assert!(!detector().detect(&patient, &[]).revenge_trade);
    }

    #[test]
    fn fomo_from_emotion_or_mistake_tag() {
        let mut emotional = logged(0, dec!(1), None);
        emotional.emotion_before = EmotionBefore::Fomo;
        assert!(detector().detect(&[emotional], &[]).fomo);

        let mut late = logged(0, dec!(1), None);
        late.mistake_tag = Some(MistakeTag::LateEntry);
        assert!(detector().detect(&[late], &[]).fomo);

        let mut other = logged(0, dec!(1), None);
        other.mistake_tag = Some(MistakeTag::EarlyExit);
        assert!(!detector().detect(&[other], &[]).fomo);
    }

    #[test]
    fn erratic_sizing_is_inconsistent_risk() {
        let erratic: Vec<Trade> = [1, 10, 1, 10, 1]
            .iter()
            .enumerate()
            .map(|(i, size)| logged(i as i64, Decimal::from(*size), None))
            .collect();
        assert!(detector().detect(&[], &erratic).inconsistent_risk);

        let steady: Vec<Trade> = (0..5).map(|i| logged(i, dec!(2), None)).collect();
        assert!(!detector().detect(&[], &steady).inconsistent_risk);

        // Too few trades to judge.
        assert!(!detector().detect(&[], &erratic[..4]).inconsistent_risk);
    }

    #[test]
    fn emotional_bias_above_thirty_percent() {
        let mut trades: Vec<Trade> = (0..10).map(|i| logged(i, dec!(1), None)).collect();
        for t in trades.iter_mut().take(3) {
            t.emotion_before = EmotionBefore::Anxious;
        }
        assert!(!detector().detect(&trades, &[]).emotional_bias);

        trades[3].emotion_before = EmotionBefore::Fearful;
        assert!(detector().detect(&trades, &[]).emotional_bias);
    }

    #[test]
    fn cv_of_constant_series_is_zero() {
        assert_eq!(coefficient_of_variation(&[dec!(3), dec!(3)]), Some(Decimal::ZERO));
        assert_eq!(coefficient_of_variation(&[]), None);
    }
}
