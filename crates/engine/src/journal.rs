use crate::analyzer::AnalysisHandle;
use crate::cached::{invalidate_owner, read_through};
use crate::error::EngineError;
use cache::{Cache, keys};
use chrono::{DateTime, Utc};
use configuration::CacheSettings;
use core_types::{NewTrade, Trade, TradeEdit};
use database::{RecordStore, TradeQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Most trades accepted by one bulk import.
pub const MAX_IMPORT: usize = 500;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of a trade listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePage {
    pub trades: Vec<Trade>,
    /// Matching trades across all pages.
    pub total: u64,
    pub offset: usize,
    pub limit: usize,
}

/// The write side of the engine.
///
/// Every write invalidates the owner's cached views before it returns, and
/// log, edit and import then queue a behavior analysis without waiting on it.
pub struct TradeJournal {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn Cache>,
    settings: CacheSettings,
    analysis: Option<AnalysisHandle>,
}

impl TradeJournal {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn Cache>,
        settings: CacheSettings,
        analysis: Option<AnalysisHandle>,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
            analysis,
        }
    }

    pub async fn log_trade(
        &self,
        owner_id: Uuid,
        input: NewTrade,
        now: DateTime<Utc>,
    ) -> Result<Trade, EngineError> {
        let trade = Trade::open(owner_id, input, now)?;
        self.store.insert_trade(&trade).await?;
        info!(
            %owner_id,
            trade_id = %trade.id,
            symbol = %trade.symbol,
            status = %trade.status,
            "Trade logged."
        );

        self.after_write(owner_id, true).await;
        Ok(trade)
    }

    pub async fn edit_trade(
        &self,
        owner_id: Uuid,
        id: Uuid,
        edit: TradeEdit,
        now: DateTime<Utc>,
    ) -> Result<Trade, EngineError> {
        let mut trade = self.get_trade(owner_id, id).await?;
        trade.apply_edit(edit, now)?;
        self.store.update_trade(&trade).await?;
        info!(%owner_id, trade_id = %id, status = %trade.status, "Trade updated.");

        self.after_write(owner_id, true).await;
        Ok(trade)
    }

    pub async fn delete_trade(&self, owner_id: Uuid, id: Uuid) -> Result<(), EngineError> {
        if !self.store.delete_trade(owner_id, id).await? {
            return Err(EngineError::TradeNotFound(id));
        }
        info!(%owner_id, trade_id = %id, "Trade deleted.");

        self.after_write(owner_id, false).await;
        Ok(())
    }

    /// Validates every input first; nothing is stored unless all of them pass.
    pub async fn bulk_import(
        &self,
        owner_id: Uuid,
        inputs: Vec<NewTrade>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Trade>, EngineError> {
        if inputs.is_empty() {
            return Err(EngineError::InvalidRequest("no trades to import".to_string()));
        }
        if inputs.len() > MAX_IMPORT {
            return Err(EngineError::InvalidRequest(format!(
                "at most {MAX_IMPORT} trades per import, got {}",
                inputs.len()
            )));
        }

        let trades = inputs
            .into_iter()
            .map(|input| Trade::open(owner_id, input, now))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.insert_trades(&trades).await?;
        info!(%owner_id, count = trades.len(), "Trades imported.");

        self.after_write(owner_id, true).await;
        Ok(trades)
    }

    pub async fn get_trade(&self, owner_id: Uuid, id: Uuid) -> Result<Trade, EngineError> {
        self.store
            .get_trade(owner_id, id)
            .await?
            .ok_or(EngineError::TradeNotFound(id))
    }

    /// A page of the owner's trades. The query is re-scoped to `owner_id`, and
    /// its limit defaults to `DEFAULT_PAGE_SIZE` and is capped at `MAX_PAGE_SIZE`.
    pub async fn list_trades(
        &self,
        owner_id: Uuid,
        query: TradeQuery,
    ) -> Result<TradePage, EngineError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let query = TradeQuery {
            owner_id,
            ..query.limit(limit)
        };

        let key = keys::trade_listing(owner_id, &query.fingerprint());
        let ttl = Duration::from_secs(self.settings.listing_ttl_secs);
        read_through(self.cache.as_ref(), &key, ttl, async {
            let trades = self.store.find_trades(&query).await?;
            let total = self.store.count_trades(&query).await?;
            Ok(TradePage {
                trades,
                total,
                offset: query.offset,
                limit,
            })
        })
        .await
    }

    async fn after_write(&self, owner_id: Uuid, analyze: bool) {
        invalidate_owner(self.cache.as_ref(), owner_id).await;
        if !analyze {
            return;
        }
        if let Some(analysis) = &self.analysis {
            analysis.submit(owner_id);
        }
    }
}
