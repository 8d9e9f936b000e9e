use async_trait::async_trait;
use core_types::{BehaviorSnapshot, PeriodReport, Trade};
use database::{DbError, MemoryStore, ReportStore, SnapshotStore, TradeQuery, TradeStore};
use std::sync::Arc;
use uuid::Uuid;

/// A memory store whose snapshot writes always fail.
pub struct FailingSnapshots(pub Arc<MemoryStore>);

#[async_trait]
impl TradeStore for FailingSnapshots {
    async fn find_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError> {
        self.0.find_trades(query).await
    }

    async fn count_trades(&self, query: &TradeQuery) -> Result<u64, DbError> {
        self.0.count_trades(query).await
    }

    async fn get_trade(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Trade>, DbError> {
        self.0.get_trade(owner_id, id).await
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), DbError> {
        self.0.insert_trade(trade).await
    }

    async fn insert_trades(&self, trades: &[Trade]) -> Result<(), DbError> {
        self.0.insert_trades(trades).await
    }

    async fn update_trade(&self, trade: &Trade) -> Result<(), DbError> {
        self.0.update_trade(trade).await
    }

    async fn delete_trade(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DbError> {
        self.0.delete_trade(owner_id, id).await
    }
}

#[async_trait]
impl SnapshotStore for FailingSnapshots {
    async fn append_snapshot(&self, _snapshot: &BehaviorSnapshot) -> Result<(), DbError> {
        Err(DbError::NotFound)
    }

    async fn recent_snapshots(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BehaviorSnapshot>, DbError> {
        self.0.recent_snapshots(owner_id, limit).await
    }
}

#[async_trait]
impl ReportStore for FailingSnapshots {
    async fn upsert_report(&self, report: &PeriodReport) -> Result<PeriodReport, DbError> {
        self.0.upsert_report(report).await
    }

    async fn list_reports(
        &self,
        owner_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PeriodReport>, DbError> {
        self.0.list_reports(owner_id, offset, limit).await
    }

    async fn get_report(&self, owner_id: Uuid, id: Uuid) -> Result<Option<PeriodReport>, DbError> {
        self.0.get_report(owner_id, id).await
    }
}
