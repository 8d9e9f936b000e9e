use crate::{AppState, error::AppError, owner::Owner};
use analytics::{
    DailyPnl, EmotionStat, EquityPoint, Granularity, MistakeStat, PerformanceSummary,
    SessionPerformance, StrategyPerformance,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use behavior::{BehaviorAnalysis, BehaviorTrend};
use chrono::{DateTime, Datelike, Utc};
use core_types::{
    DateRange, NewTrade, PeriodReport, RangePreset, Session, Strategy, Trade, TradeEdit,
    TradeStatus,
};
use database::{TradeQuery, TradeSort};
use engine::{DEFAULT_PAGE_SIZE, GeneratedReport, MAX_PAGE_SIZE, TradePage, weekly_period};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A result that may legitimately be absent, e.g. no trades in the window.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Ready(T),
    NoData { data: Option<T>, message: &'static str },
}

impl<T> Outcome<T> {
    fn from_option(value: Option<T>, message: &'static str) -> Self {
        match value {
            Some(value) => Outcome::Ready(value),
            None => Outcome::NoData {
                data: None,
                message,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TradeListParams {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_trade_limit")]
    limit: usize,
    status: Option<TradeStatus>,
    strategy: Option<Strategy>,
    session: Option<Session>,
    symbol: Option<String>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
    #[serde(default)]
    sort: TradeSort,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_report_limit")]
    limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_trade_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_report_limit() -> usize {
    12
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(default)]
    range: RangePreset,
    #[serde(default)]
    granularity: Granularity,
}

#[derive(Debug, Deserialize)]
pub struct DailyParams {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    trades: Vec<NewTrade>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
}

impl TradeListParams {
    fn into_query(self, owner_id: Uuid) -> TradeQuery {
        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        TradeQuery {
            status: self.status,
            strategy: self.strategy,
            session: self.session,
            symbol: self.symbol.filter(|s| !s.trim().is_empty()),
            trade_date: DateRange {
                from: self.date_from,
                to: self.date_to,
            },
            ..TradeQuery::for_owner(owner_id)
                .sorted(self.sort)
                .page(self.page.saturating_sub(1).saturating_mul(limit), limit)
        }
    }
}

/// # GET /api/trades
pub async fn list_trades(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Query(params): Query<TradeListParams>,
) -> Result<Json<TradePage>, AppError> {
    let page = state
        .journal
        .list_trades(owner_id, params.into_query(owner_id))
        .await?;
    Ok(Json(page))
}

/// # POST /api/trades
pub async fn create_trade(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewTrade>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    let trade = state.journal.log_trade(owner_id, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// # POST /api/trades/import
pub async fn import_trades(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let trades = state
        .journal
        .bulk_import(owner_id, request.trades, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            count: trades.len(),
        }),
    ))
}

/// # GET /api/trades/:id
pub async fn get_trade(
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Trade>, AppError> {
    Ok(Json(state.journal.get_trade(owner_id, id).await?))
}

/// # PATCH /api/trades/:id
pub async fn update_trade(
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(edit): Json<TradeEdit>,
) -> Result<Json<Trade>, AppError> {
    let trade = state
        .journal
        .edit_trade(owner_id, id, edit, Utc::now())
        .await?;
    Ok(Json(trade))
}

/// # DELETE /api/trades/:id
pub async fn delete_trade(
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.journal.delete_trade(owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/analytics/summary
pub async fn get_summary(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<PerformanceSummary>, AppError> {
    let summary = state
        .analytics
        .summary(owner_id, params.range, Utc::now())
        .await?;
    Ok(Json(summary))
}

/// # GET /api/analytics/equity
pub async fn get_equity_curve(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<EquityPoint>>, AppError> {
    let curve = state
        .analytics
        .equity_curve(owner_id, params.range, params.granularity, Utc::now())
        .await?;
    Ok(Json(curve))
}

/// # GET /api/analytics/sessions
pub async fn get_session_performance(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionPerformance>>, AppError> {
    Ok(Json(state.analytics.session_performance(owner_id).await?))
}

/// # GET /api/analytics/strategies
pub async fn get_strategy_performance(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StrategyPerformance>>, AppError> {
    Ok(Json(state.analytics.strategy_performance(owner_id).await?))
}

/// # GET /api/analytics/daily
/// Defaults to the current year.
pub async fn get_daily_pnl(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DailyParams>,
) -> Result<Json<Vec<DailyPnl>>, AppError> {
    let year = params.year.unwrap_or_else(|| Utc::now().year());
    let days = state
        .analytics
        .daily_pnl(owner_id, year, params.month)
        .await?;
    Ok(Json(days))
}

/// # GET /api/analytics/mistakes
pub async fn get_mistake_breakdown(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MistakeStat>>, AppError> {
    Ok(Json(state.analytics.mistake_breakdown(owner_id).await?))
}

/// # GET /api/analytics/emotions
pub async fn get_emotion_performance(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmotionStat>>, AppError> {
    Ok(Json(state.analytics.emotion_performance(owner_id).await?))
}

/// # POST /api/behavior/analyze
pub async fn analyze_behavior(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Outcome<BehaviorAnalysis>>, AppError> {
    let analysis = state.analyzer.analyze(owner_id, Utc::now()).await?;
    Ok(Json(Outcome::from_option(analysis, "No trades in the last 24 hours.")))
}

/// # GET /api/behavior/summary
pub async fn get_behavior_summary(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Outcome<BehaviorTrend>>, AppError> {
    let trend = state.analyzer.summary(owner_id).await?;
    Ok(Json(Outcome::from_option(trend, "No behavior data yet.")))
}

/// # POST /api/reports
/// Without a body period, reports on the current week.
pub async fn generate_report(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    request: Option<Json<ReportRequest>>,
) -> Result<(StatusCode, Json<Outcome<GeneratedReport>>), AppError> {
    let now = Utc::now();
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let (week_start, week_end) = weekly_period(now);
    let start = request.period_start.unwrap_or(week_start);
    let end = request.period_end.unwrap_or(week_end);

    let generated = state.reports.generate(owner_id, start, end, now).await?;
    let status = if generated.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(Outcome::from_option(
            generated,
            "No closed trades in this period.",
        )),
    ))
}

/// # GET /api/reports
pub async fn list_reports(
    Owner(owner_id): Owner,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<PeriodReport>>, AppError> {
    if pagination.limit == 0 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    let reports = state
        .reports
        .list_reports(owner_id, pagination.page, pagination.limit)
        .await?;
    Ok(Json(reports))
}

/// # GET /api/reports/:id
pub async fn get_report(
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PeriodReport>, AppError> {
    Ok(Json(state.reports.get_report(owner_id, id).await?))
}
