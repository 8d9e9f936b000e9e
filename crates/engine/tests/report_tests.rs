mod harness;

use core_types::Severity;
use engine::{EngineError, weekly_period};
use harness::scripted_narrator::ScriptedNarrator;
use harness::{Harness, closed, minutes, open};
use narrator::{Narrative, NarrativeGenerator, NarratorError};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

fn narrative() -> Narrative {
    Narrative {
        summary: "Two clean wins, one impulsive loss.".to_string(),
        recommendations: vec!["Wait fifteen minutes after a loss".to_string()],
        discipline_score: Some(dec!(72)),
        consistency_score: Some(dec!(60)),
        behavioral_warnings: vec!["Revenge trading".to_string(), "Oversized entries".to_string()],
        ..Narrative::default()
    }
}

fn harness_with(narrator: Arc<ScriptedNarrator>) -> Harness {
    let shared: Arc<dyn NarrativeGenerator> = narrator;
    Harness::with_narrator(Some(shared))
}

#[tokio::test]
async fn empty_period_stores_nothing() {
    let narrator = Arc::new(ScriptedNarrator::returning(narrative()));
    let h = harness_with(narrator.clone());
    h.journal.log_trade(h.owner, open(minutes(0)), minutes(0)).await.unwrap();

    let (start, end) = weekly_period(minutes(0));
    let outcome = h.reports.generate(h.owner, start, end, minutes(10)).await.unwrap();
    assert!(outcome.is_none());
    assert_eq!(narrator.calls(), 0);
    assert_eq!(h.store.report_count(), 0);
}

#[tokio::test]
async fn report_carries_digest_and_narrative() {
    let narrator = Arc::new(ScriptedNarrator::returning(narrative()));
    let h = harness_with(narrator.clone());
    h.journal.log_trade(h.owner, closed(dec!(40), minutes(0)), minutes(0)).await.unwrap();
    h.journal.log_trade(h.owner, closed(dec!(-10), minutes(60)), minutes(60)).await.unwrap();
    h.journal.log_trade(h.owner, open(minutes(90)), minutes(90)).await.unwrap();

    let (start, end) = weekly_period(minutes(0));
    let generated = h
        .reports
        .generate(h.owner, start, end, minutes(120))
        .await
        .unwrap()
        .unwrap();

    let digest = narrator.last_digest().unwrap();
    assert_eq!(digest.total_trades, 2);

    let report = &generated.report;
    assert_eq!(report.period_start, start);
    assert_eq!(report.stats.total_trades, 2);
    assert_eq!(report.stats.win_count, 1);
    assert_eq!(report.stats.win_rate, dec!(50.0));
    assert_eq!(report.stats.total_pnl, dec!(30.00));
    assert_eq!(report.stats.best_trade, dec!(40));
    assert_eq!(report.stats.discipline_score, dec!(72));
    assert_eq!(report.summary, "Two clean wins, one impulsive loss.");
    assert_eq!(report.behavioral_flags.len(), 2);
    assert_eq!(report.behavioral_flags[0].kind, "Revenge trading");
    assert_eq!(report.behavioral_flags[0].severity, Severity::Medium);
    assert_eq!(report.behavioral_flags[0].count, 1);
    assert_eq!(generated.narrative.consistency_score, Some(dec!(60)));
}

#[tokio::test]
async fn regenerating_a_period_overwrites_it() {
    let narrator = Arc::new(ScriptedNarrator::returning(narrative()));
    let h = harness_with(narrator);
    let (start, end) = weekly_period(minutes(0));

    h.journal.log_trade(h.owner, closed(dec!(10), minutes(0)), minutes(0)).await.unwrap();
    let first = h.reports.generate(h.owner, start, end, minutes(10)).await.unwrap().unwrap();

    h.journal.log_trade(h.owner, closed(dec!(15), minutes(20)), minutes(20)).await.unwrap();
    let second = h.reports.generate(h.owner, start, end, minutes(30)).await.unwrap().unwrap();

    assert_eq!(h.store.report_count(), 1);
    assert_eq!(second.report.id, first.report.id);
    assert_eq!(second.report.stats.total_trades, 2);

    let listed = h.reports.list_reports(h.owner, 1, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].stats.total_pnl, dec!(25));
    assert_eq!(h.reports.list_reports(h.owner, 0, 10).await.unwrap().len(), 1);
    assert!(h.reports.list_reports(h.owner, usize::MAX, 1000).await.unwrap().is_empty());
    let fetched = h.reports.get_report(h.owner, first.report.id).await.unwrap();
    assert_eq!(fetched.generated_at, minutes(30));
}

#[tokio::test]
async fn missing_discipline_rating_falls_back_to_zero() {
    let quiet = Narrative {
        summary: "Fine.".to_string(),
        ..Narrative::default()
    };
    let h = harness_with(Arc::new(ScriptedNarrator::returning(quiet)));
    h.journal.log_trade(h.owner, closed(dec!(10), minutes(0)), minutes(0)).await.unwrap();

    let (start, end) = weekly_period(minutes(0));
    let generated = h.reports.generate(h.owner, start, end, minutes(5)).await.unwrap().unwrap();
    assert_eq!(generated.report.stats.discipline_score, dec!(0));
    assert!(generated.report.behavioral_flags.is_empty());
}

#[tokio::test]
async fn narrator_failure_aborts_without_storing() {
    let h = harness_with(Arc::new(ScriptedNarrator::failing()));
    h.journal.log_trade(h.owner, closed(dec!(10), minutes(0)), minutes(0)).await.unwrap();

    let (start, end) = weekly_period(minutes(0));
    let result = h.reports.generate(h.owner, start, end, minutes(5)).await;
    assert!(matches!(
        result,
        Err(EngineError::Narrator(NarratorError::ApiError(_)))
    ));
    assert_eq!(h.store.report_count(), 0);

    // The metrics views are unaffected.
    let summary = h
        .analytics
        .summary(h.owner, core_types::RangePreset::All, minutes(5))
        .await
        .unwrap();
    assert_eq!(summary.total_pnl, dec!(10));
}

#[tokio::test]
async fn unconfigured_narrator_is_reported() {
    let h = Harness::new();
    let (start, end) = weekly_period(minutes(0));
    assert!(h.reports.generate(h.owner, start, end, minutes(5)).await.unwrap().is_none());

    h.journal.log_trade(h.owner, closed(dec!(10), minutes(0)), minutes(0)).await.unwrap();
    assert!(matches!(
        h.reports.generate(h.owner, start, end, minutes(5)).await,
        Err(EngineError::Narrator(NarratorError::NotConfigured))
    ));
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let h = Harness::new();
    let (start, end) = weekly_period(minutes(0));
    assert!(matches!(
        h.reports.generate(h.owner, end, start, minutes(5)).await,
        Err(EngineError::InvalidRequest(_))
    ));
    assert!(matches!(
        h.reports.get_report(h.owner, Uuid::new_v4()).await,
        Err(EngineError::ReportNotFound(_))
    ));
}
