use crate::error::AnalyticsError;
use crate::report::{
    DailyPnl, EmotionStat, EquityPoint, Granularity, GroupPerformance, MistakeStat,
    PerformanceSummary, PeriodDigest, ProfitFactor, SessionPerformance, StrategyPerformance,
};
use chrono::{Datelike, Duration, NaiveDate};
use core_types::rounding::{percentage, round_money, round_pct, round_ratio};
use core_types::{DateRange, EmotionBefore, MistakeTag, Trade, TradeStatus};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A stateless calculator for deriving performance metrics from a trade history.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the headline statistics for the trades inside `range`.
    ///
    /// # Arguments
    ///
    /// * `trades` - One owner's trades. Trades outside `range` are ignored.
    /// * `range` - Inclusive bounds on `trade_date`; an unbounded range keeps every trade.
    ///
    /// # Returns
    ///
    /// A `PerformanceSummary`. An empty input yields the zeroed summary with no streak type.
    pub fn summary(&self, trades: &[Trade], range: &DateRange) -> PerformanceSummary {
        let mut report = PerformanceSummary::new();
        let in_range = chronological(trades.iter().filter(|t| range.contains(t.trade_date)));

        if in_range.is_empty() {
            return report;
        }

        self.calculate_profitability(&in_range, &mut report);
        self.calculate_drawdown(&in_range, &mut report);
        self.calculate_streak(&in_range, &mut report);

        report
    }

    /// Counts, pnl, win/loss averages and the profit factor.
    fn calculate_profitability(&self, trades: &[&Trade], report: &mut PerformanceSummary) {
        report.total_trades = trades.len();

        let mut total_pnl = Decimal::ZERO;
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut r_sum = Decimal::ZERO;
        let mut best = trades[0].pnl;
        let mut worst = trades[0].pnl;

        for trade in trades {
            total_pnl += trade.pnl;
            best = best.max(trade.pnl);
            worst = worst.min(trade.pnl);

            if trade.is_closed() {
                report.closed_trades += 1;
                r_sum += trade.r_multiple.unwrap_or(Decimal::ZERO);
            }
            match trade.status {
                TradeStatus::Win => {
                    report.wins += 1;
                    gross_profit += trade.pnl;
                }
                TradeStatus::Loss => {
                    report.losses += 1;
                    gross_loss += trade.pnl;
                }
                TradeStatus::Open | TradeStatus::Breakeven => {}
            }
        }
        let gross_loss = gross_loss.abs();

        report.total_pnl = round_money(total_pnl);
        report.win_rate = round_pct(percentage(report.wins, report.closed_trades));
        if report.closed_trades > 0 {
            report.avg_r_multiple = round_ratio(r_sum / Decimal::from(report.closed_trades));
        }

        report.profit_factor = if gross_loss > Decimal::ZERO {
            ProfitFactor::Finite(round_ratio(gross_profit / gross_loss))
        } else if gross_profit > Decimal::ZERO {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(Decimal::ZERO)
        };

        if report.wins > 0 {
            report.avg_win = round_money(gross_profit / Decimal::from(report.wins));
        }
        if report.losses > 0 {
            report.avg_loss = round_money(gross_loss / Decimal::from(report.losses));
        }
        report.best_trade = round_money(best);
        report.worst_trade = round_money(worst);
    }

    /// Maximum decline of cumulative pnl from its running peak, in percent of the peak.
    ///
    /// The peak starts at zero, so no drawdown is recorded before the first profit.
    fn calculate_drawdown(&self, trades: &[&Trade], report: &mut PerformanceSummary) {
        let mut running = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        for trade in trades {
            running += trade.pnl;
            if running > peak {
                peak = running;
            }
            if peak > Decimal::ZERO {
                let drawdown = (peak - running) / peak * Decimal::ONE_HUNDRED;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        report.max_drawdown = round_pct(max_drawdown);
    }

    /// Walks back from the most recent closed trade while the status repeats.
    fn calculate_streak(&self, trades: &[&Trade], report: &mut PerformanceSummary) {
        let mut closed = trades.iter().rev().filter(|t| t.is_closed());

        let Some(latest) = closed.next() else {
            return;
        };
        let streak_type = latest.status;
        report.current_streak = 1 + closed.take_while(|t| t.status == streak_type).count();
        report.streak_type = Some(streak_type);
    }

    /// The cumulative pnl of closed trades inside `range`, oldest first.
    ///
    /// With `Granularity::Trade` every closed trade is one point. The coarser
    /// granularities merge the trades of one calendar bucket into a single point
    /// dated at the start of the bucket (Monday for weeks).
    pub fn equity_curve(
        &self,
        trades: &[Trade],
        range: &DateRange,
        granularity: Granularity,
    ) -> Vec<EquityPoint> {
        let closed = chronological(
            trades
                .iter()
                .filter(|t| t.is_closed() && range.contains(t.trade_date)),
        );

        let mut curve: Vec<EquityPoint> = Vec::with_capacity(closed.len());
        let mut running = Decimal::ZERO;
        let mut bucket_pnl = Decimal::ZERO;

        for trade in closed {
            running += trade.pnl;
            let date = bucket_start(trade.trade_date.date_naive(), granularity);

            match curve.last_mut() {
                Some(last) if granularity != Granularity::Trade && last.date == date => {
                    bucket_pnl += trade.pnl;
                    last.trade_pnl = round_money(bucket_pnl);
                    last.cumulative_pnl = round_money(running);
                }
                _ => {
                    bucket_pnl = trade.pnl;
                    curve.push(EquityPoint {
                        date,
                        cumulative_pnl: round_money(running),
                        trade_pnl: round_money(trade.pnl),
                    });
                }
            }
        }

        curve
    }

    /// Closed-trade performance per session, best total pnl first.
    pub fn session_performance(&self, trades: &[Trade]) -> Vec<SessionPerformance> {
        group_performance(trades, |t| t.session)
    }

    /// Closed-trade performance per strategy, best total pnl first.
    pub fn strategy_performance(&self, trades: &[Trade]) -> Vec<StrategyPerformance> {
        group_performance(trades, |t| t.strategy)
    }

    /// Closed trades of one calendar year, or of one month when `month` is given,
    /// summed per UTC calendar day.
    pub fn daily_pnl(
        &self,
        trades: &[Trade],
        year: i32,
        month: Option<u32>,
    ) -> Result<Vec<DailyPnl>, AnalyticsError> {
        let (start, end) = calendar_bounds(year, month)?;

        let mut days: BTreeMap<NaiveDate, DailyPnl> = BTreeMap::new();
        for trade in trades.iter().filter(|t| t.is_closed()) {
            let date = trade.trade_date.date_naive();
            if date < start || date >= end {
                continue;
            }
            let day = days.entry(date).or_insert_with(|| DailyPnl {
                date,
                pnl: Decimal::ZERO,
                trades: 0,
                wins: 0,
            });
            day.pnl += trade.pnl;
            day.trades += 1;
            if trade.status == TradeStatus::Win {
                day.wins += 1;
            }
        }

        Ok(days
            .into_values()
            .map(|mut day| {
                day.pnl = round_money(day.pnl);
                day
            })
            .collect())
    }

    /// Tagged mistakes with how often they occurred and what the losing ones cost.
    pub fn mistake_breakdown(&self, trades: &[Trade]) -> Vec<MistakeStat> {
        let mut tags: BTreeMap<MistakeTag, MistakeStat> = BTreeMap::new();
        for trade in trades {
            let Some(tag) = trade.mistake_tag else {
                continue;
            };
            let stat = tags.entry(tag).or_insert_with(|| MistakeStat {
                tag,
                count: 0,
                total_pnl_lost: Decimal::ZERO,
            });
            stat.count += 1;
            if trade.pnl < Decimal::ZERO {
                stat.total_pnl_lost += trade.pnl;
            }
        }

        let mut stats: Vec<MistakeStat> = tags
            .into_values()
            .map(|mut stat| {
                stat.total_pnl_lost = round_money(stat.total_pnl_lost);
                stat
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }

    /// Closed-trade outcomes grouped by the emotion reported before entry.
    pub fn emotion_performance(&self, trades: &[Trade]) -> Vec<EmotionStat> {
        let mut emotions: BTreeMap<EmotionBefore, EmotionStat> = BTreeMap::new();
        for trade in trades.iter().filter(|t| t.is_closed()) {
            let stat = emotions
                .entry(trade.emotion_before)
                .or_insert_with(|| EmotionStat {
                    emotion: trade.emotion_before,
                    trades: 0,
                    wins: 0,
                    pnl: Decimal::ZERO,
                    win_rate: Decimal::ZERO,
                });
            stat.trades += 1;
            stat.pnl += trade.pnl;
            if trade.status == TradeStatus::Win {
                stat.wins += 1;
            }
        }

        let mut stats: Vec<EmotionStat> = emotions
            .into_values()
            .map(|mut stat| {
                stat.pnl = round_money(stat.pnl);
                stat.win_rate = round_pct(percentage(stat.wins, stat.trades));
                stat
            })
            .collect();
        stats.sort_by(|a, b| b.trades.cmp(&a.trades));
        stats
    }

    /// The closed-trade aggregates of a reporting period.
    ///
    /// Returns `None` when the period has no closed trades, in which case no
    /// report should be produced.
    pub fn period_digest(&self, trades: &[Trade]) -> Option<PeriodDigest> {
        let closed = chronological(trades.iter().filter(|t| t.is_closed()));
        if closed.is_empty() {
            return None;
        }

        let win_count = closed.iter().filter(|t| t.status == TradeStatus::Win).count();
        let loss_count = closed.iter().filter(|t| t.status == TradeStatus::Loss).count();
        let total_pnl: Decimal = closed.iter().map(|t| t.pnl).sum();
        let r_sum: Decimal = closed
            .iter()
            .map(|t| t.r_multiple.unwrap_or(Decimal::ZERO))
            .sum();
        let best_trade = closed.iter().map(|t| t.pnl).max().unwrap_or_default();
        let worst_trade = closed.iter().map(|t| t.pnl).min().unwrap_or_default();

        let mut mistake_counts: BTreeMap<MistakeTag, usize> = BTreeMap::new();
        for tag in closed.iter().filter_map(|t| t.mistake_tag) {
            *mistake_counts.entry(tag).or_default() += 1;
        }
        let mut mistakes: Vec<(MistakeTag, usize)> = mistake_counts.into_iter().collect();
        mistakes.sort_by(|a, b| b.1.cmp(&a.1));

        let mut strategies: Vec<_> = closed.iter().map(|t| t.strategy).collect();
        strategies.sort();
        strategies.dedup();
        let mut sessions: Vec<_> = closed.iter().map(|t| t.session).collect();
        sessions.sort();
        sessions.dedup();

        Some(PeriodDigest {
            total_trades: closed.len(),
            win_count,
            loss_count,
            win_rate: round_pct(percentage(win_count, closed.len())),
            total_pnl: round_money(total_pnl),
            avg_r_multiple: round_ratio(r_sum / Decimal::from(closed.len())),
            best_trade: round_money(best_trade),
            worst_trade: round_money(worst_trade),
            mistakes,
            strategies,
            sessions,
            emotions: closed.iter().map(|t| t.emotion_before).collect(),
        })
    }
}

/// Sorts borrowed trades by `trade_date`, falling back to `created_at` for ties.
fn chronological<'a>(trades: impl Iterator<Item = &'a Trade>) -> Vec<&'a Trade> {
    let mut sorted: Vec<&Trade> = trades.collect();
    sorted.sort_by(|a, b| {
        a.trade_date
            .cmp(&b.trade_date)
            .then(a.created_at.cmp(&b.created_at))
    });
    sorted
}

fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Trade | Granularity::Day => date,
        Granularity::Week => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Half-open `[start, end)` day bounds of a calendar year or month.
fn calendar_bounds(
    year: i32,
    month: Option<u32>,
) -> Result<(NaiveDate, NaiveDate), AnalyticsError> {
    let invalid = || match month {
        Some(m) => AnalyticsError::InvalidPeriod(format!("{year}-{m:02}")),
        None => AnalyticsError::InvalidPeriod(year.to_string()),
    };

    let (start, end) = match month {
        Some(m) => {
            let start = NaiveDate::from_ymd_opt(year, m, 1).ok_or_else(invalid)?;
            let (next_year, next_month) = if m == 12 { (year + 1, 1) } else { (year, m + 1) };
            (start, NaiveDate::from_ymd_opt(next_year, next_month, 1))
        }
        None => (
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
            NaiveDate::from_ymd_opt(year + 1, 1, 1),
        ),
    };
    Ok((start, end.ok_or_else(invalid)?))
}

fn group_performance<K, F>(trades: &[Trade], key: F) -> Vec<GroupPerformance<K>>
where
    K: Ord + Copy,
    F: Fn(&Trade) -> K,
{
    struct Acc {
        trades: usize,
        wins: usize,
        pnl: Decimal,
        r_sum: Decimal,
        r_count: usize,
    }

    let mut groups: BTreeMap<K, Acc> = BTreeMap::new();
    for trade in trades.iter().filter(|t| t.is_closed()) {
        let acc = groups.entry(key(trade)).or_insert(Acc {
            trades: 0,
            wins: 0,
            pnl: Decimal::ZERO,
            r_sum: Decimal::ZERO,
            r_count: 0,
        });
        acc.trades += 1;
        acc.pnl += trade.pnl;
        if trade.status == TradeStatus::Win {
            acc.wins += 1;
        }
        if let Some(r) = trade.r_multiple {
            acc.r_sum += r;
            acc.r_count += 1;
        }
    }

    let mut rows: Vec<GroupPerformance<K>> = groups
        .into_iter()
        .map(|(group, acc)| GroupPerformance {
            group,
            total_trades: acc.trades,
            wins: acc.wins,
            win_rate: round_pct(percentage(acc.wins, acc.trades)),
            total_pnl: round_money(acc.pnl),
            avg_r_multiple: (acc.r_count > 0)
                .then(|| round_ratio(acc.r_sum / Decimal::from(acc.r_count))),
        })
        .collect();
    rows.sort_by(|a, b| b.total_pnl.cmp(&a.total_pnl));
    rows
}
