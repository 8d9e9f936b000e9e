use crate::error::EngineError;
use crate::journal::MAX_PAGE_SIZE;
use analytics::{MetricsEngine, PeriodDigest};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use core_types::{DateRange, FlagSummary, PeriodReport, PeriodStats, Severity};
use database::{RecordStore, TradeQuery};
use narrator::{Narrative, NarrativeGenerator, NarratorError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// A stored period report together with the full narrative it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub report: PeriodReport,
    pub narrative: Narrative,
}

/// The Monday 00:00 to Sunday 23:59:59 UTC week containing `now`.
pub fn weekly_period(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let since_monday = i64::from(now.weekday().num_days_from_monday());
    let start = (now.date_naive() - Duration::days(since_monday))
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, start + Duration::days(7) - Duration::seconds(1))
}

/// Builds period reports: aggregates closed trades, asks the narrative
/// generator for a review, and upserts the result.
pub struct ReportAssembler {
    store: Arc<dyn RecordStore>,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
    metrics: MetricsEngine,
}

impl ReportAssembler {
    /// `narrator` is `None` when no generator is configured; generation then
    /// fails with `NarratorError::NotConfigured` for periods that have trades.
    pub fn new(
        store: Arc<dyn RecordStore>,
        narrator: Option<Arc<dyn NarrativeGenerator>>,
    ) -> Self {
        Self {
            store,
            narrator,
            metrics: MetricsEngine::new(),
        }
    }

    /// Generates and stores the report for `[start, end]`.
    ///
    /// Returns `Ok(None)` without storing anything when the period has no
    /// closed trades. Generating the same period again overwrites the stored
    /// report in place.
    pub async fn generate(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<GeneratedReport>, EngineError> {
        if start > end {
            return Err(EngineError::InvalidRequest(
                "period start is after period end".to_string(),
            ));
        }

        let trades = self
            .store
            .find_trades(
                &TradeQuery::for_owner(owner_id)
                    .closed()
                    .within(DateRange::between(start, end)),
            )
            .await?;
        let Some(digest) = self.metrics.period_digest(&trades) else {
            info!(%owner_id, %start, %end, "No closed trades in period; no report generated.");
            return Ok(None);
        };

        let narrator = self.narrator.as_ref().ok_or(NarratorError::NotConfigured)?;
        let narrative = narrator.generate(&digest).await.map_err(|e| {
            error!(%owner_id, generator = narrator.name(), error = %e, "Report generation failed.");
            e
        })?;

        let report = assemble(owner_id, start, end, &digest, &narrative, now);
        let stored = self.store.upsert_report(&report).await?;
        info!(%owner_id, report_id = %stored.id, %start, "Period report stored.");

        Ok(Some(GeneratedReport {
            report: stored,
            narrative,
        }))
    }

    /// Stored reports, newest period first. `page` starts at 1.
    pub async fn list_reports(
        &self,
        owner_id: Uuid,
        page: usize,
        limit: usize,
    ) -> Result<Vec<PeriodReport>, EngineError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = page.saturating_sub(1).saturating_mul(limit);
        Ok(self.store.list_reports(owner_id, offset, limit).await?)
    }

    pub async fn get_report(&self, owner_id: Uuid, id: Uuid) -> Result<PeriodReport, EngineError> {
        self.store
            .get_report(owner_id, id)
            .await?
            .ok_or(EngineError::ReportNotFound(id))
    }
}

fn assemble(
    owner_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    digest: &PeriodDigest,
    narrative: &Narrative,
    now: DateTime<Utc>,
) -> PeriodReport {
    let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    PeriodReport {
        id: Uuid::new_v4(),
        owner_id,
        period_start: start,
        period_end: end,
        stats: PeriodStats {
            total_trades: count(digest.total_trades),
            win_count: count(digest.win_count),
            loss_count: count(digest.loss_count),
            win_rate: digest.win_rate,
            total_pnl: digest.total_pnl,
            avg_r_multiple: digest.avg_r_multiple,
            best_trade: digest.best_trade,
            worst_trade: digest.worst_trade,
            discipline_score: narrative
                .discipline_score
                .unwrap_or(Decimal::ZERO)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
        },
        behavioral_flags: narrative
            .behavioral_warnings
            .iter()
            .map(|warning| FlagSummary {
                kind: warning.clone(),
                count: 1,
                severity: Severity::Medium,
            })
            .collect(),
        summary: narrative.summary.clone(),
        recommendations: narrative.recommendations.clone(),
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn week_runs_monday_to_sunday() {
        // 2024-07-04 is a Thursday.
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 15, 30, 0).unwrap();
        let (start, end) = weekly_period(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 7, 7, 23, 59, 59).unwrap());
    }

    #[test]
    fn monday_midnight_starts_its_own_week() {
        let now = Utc.with_ymd_and_hms(2024, 7, 8, 0, 0, 0).unwrap();
        assert_eq!(weekly_period(now).0, now);
    }
}
