use crate::cached::read_through;
use crate::error::EngineError;
use analytics::{
    DailyPnl, EmotionStat, EquityPoint, Granularity, MetricsEngine, MistakeStat,
    PerformanceSummary, SessionPerformance, StrategyPerformance,
};
use cache::{Cache, keys};
use chrono::{DateTime, Utc};
use configuration::CacheSettings;
use core_types::{RangePreset, Trade};
use database::{RecordStore, TradeQuery};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// The read side of the engine: every metrics view of one owner's trades.
///
/// Summary, equity curve and the session/strategy breakdowns are served
/// through the read-through cache; the remaining views are always computed.
pub struct AnalyticsService {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn Cache>,
    settings: CacheSettings,
    metrics: MetricsEngine,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn Cache>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
            metrics: MetricsEngine::new(),
        }
    }

    pub async fn summary(
        &self,
        owner_id: Uuid,
        preset: RangePreset,
        now: DateTime<Utc>,
    ) -> Result<PerformanceSummary, EngineError> {
        let key = keys::summary(owner_id, preset.as_str());
        read_through(self.cache.as_ref(), &key, self.summary_ttl(), async {
            let range = preset.resolve(now);
            let trades = self
                .fetch(TradeQuery::for_owner(owner_id).within(range))
                .await?;
            Ok(self.metrics.summary(&trades, &range))
        })
        .await
    }

    pub async fn equity_curve(
        &self,
        owner_id: Uuid,
        preset: RangePreset,
        granularity: Granularity,
        now: DateTime<Utc>,
    ) -> Result<Vec<EquityPoint>, EngineError> {
        let key = keys::equity(owner_id, preset.as_str(), granularity.as_str());
        read_through(self.cache.as_ref(), &key, self.summary_ttl(), async {
            let range = preset.resolve(now);
            let trades = self
                .fetch(TradeQuery::for_owner(owner_id).closed().within(range))
                .await?;
            Ok(self.metrics.equity_curve(&trades, &range, granularity))
        })
        .await
    }

    pub async fn session_performance(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<SessionPerformance>, EngineError> {
        let key = keys::sessions(owner_id);
        read_through(self.cache.as_ref(), &key, self.grouped_ttl(), async {
            let trades = self.closed_trades(owner_id).await?;
            Ok(self.metrics.session_performance(&trades))
        })
        .await
    }

    pub async fn strategy_performance(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<StrategyPerformance>, EngineError> {
        let key = keys::strategies(owner_id);
        read_through(self.cache.as_ref(), &key, self.grouped_ttl(), async {
            let trades = self.closed_trades(owner_id).await?;
            Ok(self.metrics.strategy_performance(&trades))
        })
        .await
    }

    pub async fn daily_pnl(
        &self,
        owner_id: Uuid,
        year: i32,
        month: Option<u32>,
    ) -> Result<Vec<DailyPnl>, EngineError> {
        // Reject a bad period before touching the store.
        self.metrics.daily_pnl(&[], year, month)?;
        let trades = self.closed_trades(owner_id).await?;
        Ok(self.metrics.daily_pnl(&trades, year, month)?)
    }

    pub async fn mistake_breakdown(&self, owner_id: Uuid) -> Result<Vec<MistakeStat>, EngineError> {
        let trades = self.fetch(TradeQuery::for_owner(owner_id)).await?;
        Ok(self.metrics.mistake_breakdown(&trades))
    }

    pub async fn emotion_performance(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<EmotionStat>, EngineError> {
        let trades = self.closed_trades(owner_id).await?;
        Ok(self.metrics.emotion_performance(&trades))
    }

    async fn closed_trades(&self, owner_id: Uuid) -> Result<Vec<Trade>, EngineError> {
        self.fetch(TradeQuery::for_owner(owner_id).closed()).await
    }

    async fn fetch(&self, query: TradeQuery) -> Result<Vec<Trade>, EngineError> {
        let trades = self.store.find_trades(&query).await?;
        debug!(owner_id = %query.owner_id, count = trades.len(), "Fetched trades for analytics.");
        Ok(trades)
    }

    fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.settings.summary_ttl_secs)
    }

    fn grouped_ttl(&self) -> Duration {
        Duration::from_secs(self.settings.grouped_ttl_secs)
    }
}
