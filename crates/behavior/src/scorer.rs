use configuration::BehaviorSettings;
use core_types::rounding::round_pct;
use core_types::{BehaviorFlags, BehaviorKind, Trade, TradeStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const MAX_SCORE: Decimal = Decimal::ONE_HUNDRED;

/// Minimum share of trades with a stop-loss before discipline is penalised.
const STOP_LOSS_MIN_RATIO: Decimal = dec!(0.5);
const STOP_LOSS_PENALTY: Decimal = dec!(10);
const STOP_LOSS_BONUS: Decimal = dec!(5);

/// Maps rolling win-rate variance (on a 0..1 scale) onto the 0..100 score.
const VARIANCE_WEIGHT: Decimal = dec!(200);

/// Points deducted from the discipline score for a detected behavior.
pub fn penalty(kind: BehaviorKind) -> Decimal {
    match kind {
        BehaviorKind::Overtrading => dec!(20),
        BehaviorKind::RevengeTrade => dec!(25),
        BehaviorKind::Fomo => dec!(15),
        BehaviorKind::InconsistentRisk => dec!(20),
        BehaviorKind::EmotionalBias => dec!(10),
    }
}

/// Turns detector output and trade history into the discipline and consistency scores.
#[derive(Debug, Clone)]
pub struct Scorer {
    settings: BehaviorSettings,
}

impl Scorer {
    pub fn new(settings: BehaviorSettings) -> Self {
        Self { settings }
    }

    /// 100 minus the penalty of every detected behavior, adjusted for how
    /// consistently the `window` trades carried a stop-loss, clamped to 0..=100.
    pub fn discipline_score(&self, flags: &BehaviorFlags, window: &[Trade]) -> Decimal {
        let mut score = MAX_SCORE;
        for kind in flags.active() {
            score -= penalty(kind);
        }

        if !window.is_empty() {
            let with_stop = window.iter().filter(|t| t.stop_loss.is_some()).count();
            let ratio = Decimal::from(with_stop) / Decimal::from(window.len());
            if ratio < STOP_LOSS_MIN_RATIO {
                score -= STOP_LOSS_PENALTY;
            } else if with_stop == window.len() {
                score += STOP_LOSS_BONUS;
            }
        }

        score.clamp(Decimal::ZERO, MAX_SCORE)
    }

    /// Stability of the win rate across rolling windows of the most recent
    /// closed trades (newest first by `trade_date`).
    ///
    /// Returns `consistency_default` when there are fewer closed trades than
    /// one window.
    pub fn consistency_score(&self, recent: &[Trade]) -> Decimal {
        let window = self.settings.consistency_window;

        let mut closed: Vec<&Trade> = recent.iter().filter(|t| t.is_closed()).collect();
        closed.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
        closed.truncate(self.settings.consistency_sample_size);

        if closed.len() < window {
            return self.settings.consistency_default;
        }

        let rates: Vec<Decimal> = closed
            .windows(window)
            .map(|run| {
                let wins = run.iter().filter(|t| t.status == TradeStatus::Win).count();
                Decimal::from(wins) / Decimal::from(window)
            })
            .collect();

        let n = Decimal::from(rates.len());
        let mean = rates.iter().copied().sum::<Decimal>() / n;
        let variance = rates
            .iter()
            .map(|r| (*r - mean) * (*r - mean))
            .sum::<Decimal>()
            / n;

        round_pct((MAX_SCORE - variance * VARIANCE_WEIGHT).max(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::{Direction, NewTrade};
    use uuid::Uuid;

    fn closed(day: i64, won: bool, stop: bool) -> Trade {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(day);
        let input = NewTrade {
            exit_price: Some(if won { dec!(110) } else { dec!(95) }),
            stop_loss: stop.then_some(dec!(90)),
            trade_date: Some(when),
            ..NewTrade::new("NAS100", Direction::Long, dec!(100), dec!(1))
        };
        Trade::open(Uuid::new_v4(), input, when).unwrap()
    }

    fn scorer() -> Scorer {
        Scorer::new(BehaviorSettings::default())
    }

    #[test]
    fn clean_window_with_stops_earns_the_bonus_but_stays_capped() {
        let window = vec![closed(0, true, true), closed(1, false, true)];
        assert_eq!(scorer().discipline_score(&BehaviorFlags::default(), &window), dec!(100));

        let flags = BehaviorFlags {
            fomo: true,
            ..Default::default()
        };
        assert_eq!(scorer().discipline_score(&flags, &window), dec!(90));
    }

    #[test]
    fn missing_stops_and_every_flag_clamp_at_zero() {
        let window = vec![closed(0, true, false), closed(1, true, false)];
        let flags = BehaviorFlags {
            overtrading: true,
            revenge_trade: true,
            fomo: true,
            inconsistent_risk: true,
            emotional_bias: true,
        };
        assert_eq!(scorer().discipline_score(&flags, &window), Decimal::ZERO);

        let flags = BehaviorFlags {
            revenge_trade: true,
            ..Default::default()
        };
        assert_eq!(scorer().discipline_score(&flags, &window), dec!(65));
    }

    #[test]
    fn half_the_trades_with_stops_is_neutral() {
        let window = vec![closed(0, true, true), closed(1, true, false)];
        assert_eq!(scorer().discipline_score(&BehaviorFlags::default(), &window), dec!(100));
    }

    #[test]
    fn fewer_than_five_closed_trades_score_fifty() {
        let trades: Vec<Trade> = (0..4).map(|d| closed(d, d % 2 == 0, true)).collect();
        assert_eq!(scorer().consistency_score(&trades), dec!(50));
    }

    #[test]
    fn steady_win_rate_scores_full_marks() {
        let trades: Vec<Trade> = (0..10).map(|d| closed(d, true, true)).collect();
        assert_eq!(scorer().consistency_score(&trades), dec!(100.0));
    }

    #[test]
    fn swinging_win_rate_lowers_consistency() {
        // Newest first: five wins then five losses.
        let trades: Vec<Trade> = (0..10).map(|d| closed(d, d >= 5, true)).collect();
        let score = scorer().consistency_score(&trades);
        assert!(score < dec!(100));
        assert!(score >= Decimal::ZERO);
        // Window rates 1, .8, .6, .4, .2, 0 have a variance of 0.1167.
        assert_eq!(score, dec!(76.7));
    }
}
