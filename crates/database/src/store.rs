//! Record-store ports.
//!
//! The engine depends on these traits rather than on a concrete database, so
//! the PostgreSQL repository and the in-memory store are interchangeable.

use crate::error::DbError;
use crate::query::TradeQuery;
use async_trait::async_trait;
use core_types::{BehaviorSnapshot, PeriodReport, Trade};
use uuid::Uuid;

/// Owner-scoped access to trade records.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Trades matching `query`, ordered and paged as it asks.
    async fn find_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError>;

    /// Number of trades matching `query`, ignoring its paging.
    async fn count_trades(&self, query: &TradeQuery) -> Result<u64, DbError>;

    async fn get_trade(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Trade>, DbError>;

    async fn insert_trade(&self, trade: &Trade) -> Result<(), DbError>;

    /// Inserts every trade or none of them.
    async fn insert_trades(&self, trades: &[Trade]) -> Result<(), DbError>;

    /// Replaces a stored trade. Fails with `DbError::NotFound` if it does not exist.
    async fn update_trade(&self, trade: &Trade) -> Result<(), DbError>;

    /// Returns whether a trade was removed.
    async fn delete_trade(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DbError>;
}

/// Append-only history of behavior analysis runs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn append_snapshot(&self, snapshot: &BehaviorSnapshot) -> Result<(), DbError>;

    /// The owner's newest snapshots first, at most `limit` of them.
    async fn recent_snapshots(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BehaviorSnapshot>, DbError>;
}

/// Period reports, unique per `(owner_id, period_start)`.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Inserts the report, or overwrites the one stored for the same owner and
    /// period start. The stored row is returned; on overwrite it keeps its
    /// original id.
    async fn upsert_report(&self, report: &PeriodReport) -> Result<PeriodReport, DbError>;

    /// Newest period first.
    async fn list_reports(
        &self,
        owner_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PeriodReport>, DbError>;

    async fn get_report(&self, owner_id: Uuid, id: Uuid) -> Result<Option<PeriodReport>, DbError>;
}

/// Everything the engine needs from persistence.
pub trait RecordStore: TradeStore + SnapshotStore + ReportStore {}

impl<T: TradeStore + SnapshotStore + ReportStore> RecordStore for T {}
