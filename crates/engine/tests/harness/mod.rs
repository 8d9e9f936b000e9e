#![allow(dead_code)]

pub mod failing_snapshots;
pub mod scripted_narrator;

use cache::{Cache, MemoryCache};
use chrono::{DateTime, Duration, TimeZone, Utc};
use configuration::{BehaviorSettings, CacheSettings};
use core_types::{Direction, NewTrade};
use database::{MemoryStore, RecordStore};
use engine::{AnalyticsService, BehaviorAnalyzer, ReportAssembler, TradeJournal};
use narrator::NarrativeGenerator;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Every engine service wired to one in-memory store and one in-process cache.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub analytics: AnalyticsService,
    pub journal: TradeJournal,
    pub analyzer: Arc<BehaviorAnalyzer>,
    pub reports: ReportAssembler,
    pub owner: Uuid,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_narrator(None)
    }

    pub fn with_narrator(narrator: Option<Arc<dyn NarrativeGenerator>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let records: Arc<dyn RecordStore> = store.clone();
        let shared_cache: Arc<dyn Cache> = cache.clone();

        Self {
            analytics: AnalyticsService::new(
                records.clone(),
                shared_cache.clone(),
                CacheSettings::default(),
            ),
            journal: TradeJournal::new(
                records.clone(),
                shared_cache,
                CacheSettings::default(),
                None,
            ),
            analyzer: Arc::new(BehaviorAnalyzer::new(
                records.clone(),
                behavior::BehaviorEngine::new(BehaviorSettings::default()),
            )),
            reports: ReportAssembler::new(records, narrator),
            store,
            cache,
            owner: Uuid::new_v4(),
        }
    }
}

/// Monday 2024-07-01 09:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
}

pub fn minutes(n: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(n)
}

/// A long trade of one unit entered at 100 and closed at `100 + pnl`.
pub fn closed(pnl: Decimal, at: DateTime<Utc>) -> NewTrade {
    NewTrade {
        exit_price: Some(Decimal::ONE_HUNDRED + pnl),
        stop_loss: Some(Decimal::from(90)),
        trade_date: Some(at),
        ..NewTrade::new("EURUSD", Direction::Long, Decimal::ONE_HUNDRED, Decimal::ONE)
    }
}

pub fn open(at: DateTime<Utc>) -> NewTrade {
    NewTrade {
        trade_date: Some(at),
        ..NewTrade::new("EURUSD", Direction::Long, Decimal::ONE_HUNDRED, Decimal::ONE)
    }
}
