//! In-process record store, used by the test suites and the database-less CLI mode.

use crate::error::DbError;
use crate::query::TradeQuery;
use crate::store::{ReportStore, SnapshotStore, TradeStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{BehaviorSnapshot, PeriodReport, Trade};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    trades: RwLock<HashMap<Uuid, Trade>>,
    snapshots: RwLock<Vec<BehaviorSnapshot>>,
    reports: RwLock<HashMap<(Uuid, DateTime<Utc>), PeriodReport>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots across all owners.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Number of stored reports across all owners.
    pub fn report_count(&self) -> usize {
        self.reports.read().len()
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn find_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError> {
        let mut found: Vec<Trade> = self
            .trades
            .read()
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        found.sort_by(|a, b| query.sort.compare(a, b));

        let page = found.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    async fn count_trades(&self, query: &TradeQuery) -> Result<u64, DbError> {
        let count = self.trades.read().values().filter(|t| query.matches(t)).count();
        Ok(count as u64)
    }

    async fn get_trade(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Trade>, DbError> {
        Ok(self
            .trades
            .read()
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), DbError> {
        self.trades.write().insert(trade.id, trade.clone());
        Ok(())
    }

    async fn insert_trades(&self, trades: &[Trade]) -> Result<(), DbError> {
        let mut stored = self.trades.write();
        for trade in trades {
            stored.insert(trade.id, trade.clone());
        }
        Ok(())
    }

    async fn update_trade(&self, trade: &Trade) -> Result<(), DbError> {
        let mut stored = self.trades.write();
        match stored.get_mut(&trade.id) {
            Some(existing) if existing.owner_id == trade.owner_id => {
                *existing = trade.clone();
                Ok(())
            }
            _ => Err(DbError::NotFound),
        }
    }

    async fn delete_trade(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DbError> {
        let mut stored = self.trades.write();
        if stored.get(&id).is_some_and(|t| t.owner_id == owner_id) {
            stored.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn append_snapshot(&self, snapshot: &BehaviorSnapshot) -> Result<(), DbError> {
        self.snapshots.write().push(snapshot.clone());
        Ok(())
    }

    async fn recent_snapshots(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BehaviorSnapshot>, DbError> {
        let mut owned: Vec<BehaviorSnapshot> = self
            .snapshots
            .read()
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
        owned.truncate(limit);
        Ok(owned)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn upsert_report(&self, report: &PeriodReport) -> Result<PeriodReport, DbError> {
        let mut reports = self.reports.write();
        let key = (report.owner_id, report.period_start);
        let stored = match reports.get(&key) {
            Some(existing) => PeriodReport {
                id: existing.id,
                ..report.clone()
            },
            None => report.clone(),
        };
        reports.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_reports(
        &self,
        owner_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PeriodReport>, DbError> {
        let mut owned: Vec<PeriodReport> = self
            .reports
            .read()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.period_start.cmp(&a.period_start));
        Ok(owned.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_report(&self, owner_id: Uuid, id: Uuid) -> Result<Option<PeriodReport>, DbError> {
        Ok(self
            .reports
            .read()
            .values()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .cloned())
    }
}
