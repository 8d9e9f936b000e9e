use crate::error::DbError;
use crate::query::TradeQuery;
use crate::store::{ReportStore, SnapshotStore, TradeStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    BehaviorFlags, BehaviorSnapshot, FlagSummary, MistakeTag, PeriodReport, PeriodStats, Trade,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgPool, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

const TRADE_COLUMNS: &str = "id, owner_id, symbol, market, direction, entry_price, exit_price, \
     stop_loss, take_profit, position_size, pnl, pnl_percent, risk_reward, r_multiple, status, \
     strategy, session, trade_date, duration_minutes, emotion_before, emotion_after, mistake_tag, \
     notes, tags, created_at, updated_at";

const REPORT_COLUMNS: &str = "id, owner_id, period_start, period_end, total_trades, win_count, \
     loss_count, win_rate, total_pnl, avg_r_multiple, best_trade, worst_trade, discipline_score, \
     behavioral_flags, summary, recommendations, generated_at";

/// The `DbRepository` provides the PostgreSQL implementation of the record-store
/// ports. It encapsulates all SQL and row mapping.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A row of the `trades` table. Enumerated tags are stored as their wire text.
#[derive(Debug, Clone, FromRow)]
pub struct DbTrade {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub symbol: String,
    pub market: String,
    pub direction: String,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub position_size: Decimal,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub risk_reward: Option<Decimal>,
    pub r_multiple: Option<Decimal>,
    pub status: String,
    pub strategy: String,
    pub session: String,
    pub trade_date: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub emotion_before: String,
    pub emotion_after: String,
    pub mistake_tag: Option<String>,
    pub notes: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTrade> for Trade {
    type Error = DbError;

    fn try_from(row: DbTrade) -> Result<Self, Self::Error> {
        Ok(Trade {
            id: row.id,
            owner_id: row.owner_id,
            symbol: row.symbol,
            market: row.market.parse()?,
            direction: row.direction.parse()?,
            entry_price: row.entry_price,
            exit_price: row.exit_price,
            stop_loss: row.stop_loss,
            take_profit: row.take_profit,
            position_size: row.position_size,
            pnl: row.pnl,
            pnl_percent: row.pnl_percent,
            risk_reward: row.risk_reward,
            r_multiple: row.r_multiple,
            status: row.status.parse()?,
            strategy: row.strategy.parse()?,
            session: row.session.parse()?,
            trade_date: row.trade_date,
            duration_minutes: row.duration_minutes,
            emotion_before: row.emotion_before.parse()?,
            emotion_after: row.emotion_after.parse()?,
            mistake_tag: row
                .mistake_tag
                .as_deref()
                .map(str::parse::<MistakeTag>)
                .transpose()?,
            notes: row.notes,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbSnapshot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub overtrading: bool,
    pub revenge_trade: bool,
    pub fomo: bool,
    pub inconsistent_risk: bool,
    pub emotional_bias: bool,
    pub discipline_score: Decimal,
    pub consistency_score: Decimal,
    pub trade_count: i32,
}

impl From<DbSnapshot> for BehaviorSnapshot {
    fn from(row: DbSnapshot) -> Self {
        BehaviorSnapshot {
            id: row.id,
            owner_id: row.owner_id,
            taken_at: row.taken_at,
            flags: BehaviorFlags {
                overtrading: row.overtrading,
                revenge_trade: row.revenge_trade,
                fomo: row.fomo,
                inconsistent_risk: row.inconsistent_risk,
                emotional_bias: row.emotional_bias,
            },
            discipline_score: row.discipline_score,
            consistency_score: row.consistency_score,
            trade_count: u32::try_from(row.trade_count).unwrap_or_default(),
        }
    }
}

/// A row of `period_reports`. Flag summaries and recommendations live in JSONB columns.
#[derive(Debug, Clone, FromRow)]
pub struct DbReport {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_trades: i32,
    pub win_count: i32,
    pub loss_count: i32,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub avg_r_multiple: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    pub discipline_score: Decimal,
    pub behavioral_flags: Json<Vec<FlagSummary>>,
    pub summary: String,
    pub recommendations: Json<Vec<String>>,
    pub generated_at: DateTime<Utc>,
}

impl From<DbReport> for PeriodReport {
    fn from(row: DbReport) -> Self {
        let count = |value: i32| u32::try_from(value).unwrap_or_default();
        PeriodReport {
            id: row.id,
            owner_id: row.owner_id,
            period_start: row.period_start,
            period_end: row.period_end,
            stats: PeriodStats {
                total_trades: count(row.total_trades),
                win_count: count(row.win_count),
                loss_count: count(row.loss_count),
                win_rate: row.win_rate,
                total_pnl: row.total_pnl,
                avg_r_multiple: row.avg_r_multiple,
                best_trade: row.best_trade,
                worst_trade: row.worst_trade,
                discipline_score: row.discipline_score,
            },
            behavioral_flags: row.behavioral_flags.0,
            summary: row.summary,
            recommendations: row.recommendations.0,
            generated_at: row.generated_at,
        }
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// An `ILIKE` pattern matching `needle` anywhere, with its wildcards and
/// the escape character taken literally.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Appends the `WHERE` clause for `query` to `builder`.
fn push_trade_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &TradeQuery) {
    builder.push(" WHERE owner_id = ").push_bind(query.owner_id);
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if query.closed_only {
        builder.push(" AND status <> 'open'");
    }
    if let Some(strategy) = query.strategy {
        builder.push(" AND strategy = ").push_bind(strategy.as_str());
    }
    if let Some(session) = query.session {
        builder.push(" AND session = ").push_bind(session.as_str());
    }
    if let Some(symbol) = &query.symbol {
        builder
            .push(" AND symbol ILIKE ")
            .push_bind(contains_pattern(symbol));
    }
    if let Some(from) = query.trade_date.from {
        builder.push(" AND trade_date >= ").push_bind(from);
    }
    if let Some(to) = query.trade_date.to {
        builder.push(" AND trade_date <= ").push_bind(to);
    }
    if let Some(since) = query.created_since {
        builder.push(" AND created_at >= ").push_bind(since);
    }
}

fn insert_trade_query(trade: &Trade) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO trades (
            id, owner_id, symbol, market, direction, entry_price, exit_price, stop_loss,
            take_profit, position_size, pnl, pnl_percent, risk_reward, r_multiple, status,
            strategy, session, trade_date, duration_minutes, emotion_before, emotion_after,
            mistake_tag, notes, tags, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
            $19, $20, $21, $22, $23, $24, $25, $26
        )
        "#,
    )
    .bind(trade.id)
    .bind(trade.owner_id)
    .bind(&trade.symbol)
    .bind(trade.market.as_str())
    .bind(trade.direction.as_str())
    .bind(trade.entry_price)
    .bind(trade.exit_price)
    .bind(trade.stop_loss)
    .bind(trade.take_profit)
    .bind(trade.position_size)
    .bind(trade.pnl)
    .bind(trade.pnl_percent)
    .bind(trade.risk_reward)
    .bind(trade.r_multiple)
    .bind(trade.status.as_str())
    .bind(trade.strategy.as_str())
    .bind(trade.session.as_str())
    .bind(trade.trade_date)
    .bind(trade.duration_minutes)
    .bind(trade.emotion_before.as_str())
    .bind(trade.emotion_after.as_str())
    .bind(trade.mistake_tag.as_ref().map(|tag| tag.as_str()))
    .bind(&trade.notes)
    .bind(&trade.tags)
    .bind(trade.created_at)
    .bind(trade.updated_at)
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TradeStore for DbRepository {
    async fn find_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {TRADE_COLUMNS} FROM trades"));
        push_trade_filters(&mut builder, query);
        builder.push(" ORDER BY ").push(query.sort.order_by());
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(to_i64(limit));
        }
        if query.offset > 0 {
            builder.push(" OFFSET ").push_bind(to_i64(query.offset));
        }

        let rows = builder
            .build_query_as::<DbTrade>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Trade::try_from).collect()
    }

    async fn count_trades(&self, query: &TradeQuery) -> Result<u64, DbError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM trades");
        push_trade_filters(&mut builder, query);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn get_trade(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Trade>, DbError> {
        let row = sqlx::query_as::<_, DbTrade>(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Trade::try_from).transpose()
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), DbError> {
        insert_trade_query(trade).execute(&self.pool).await?;
        Ok(())
    }

    /// Saves a batch of trades within a single transaction for atomicity.
    async fn insert_trades(&self, trades: &[Trade]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for trade in trades {
            insert_trade_query(trade).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_trade(&self, trade: &Trade) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE trades SET
                symbol = $3, market = $4, direction = $5, entry_price = $6, exit_price = $7,
                stop_loss = $8, take_profit = $9, position_size = $10, pnl = $11,
                pnl_percent = $12, risk_reward = $13, r_multiple = $14, status = $15,
                strategy = $16, session = $17, trade_date = $18, duration_minutes = $19,
                emotion_before = $20, emotion_after = $21, mistake_tag = $22, notes = $23,
                tags = $24, updated_at = $25
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(trade.id)
        .bind(trade.owner_id)
        .bind(&trade.symbol)
        .bind(trade.market.as_str())
        .bind(trade.direction.as_str())
        .bind(trade.entry_price)
        .bind(trade.exit_price)
        .bind(trade.stop_loss)
        .bind(trade.take_profit)
        .bind(trade.position_size)
        .bind(trade.pnl)
        .bind(trade.pnl_percent)
        .bind(trade.risk_reward)
        .bind(trade.r_multiple)
        .bind(trade.status.as_str())
        .bind(trade.strategy.as_str())
        .bind(trade.session.as_str())
        .bind(trade.trade_date)
        .bind(trade.duration_minutes)
        .bind(trade.emotion_before.as_str())
        .bind(trade.emotion_after.as_str())
        .bind(trade.mistake_tag.as_ref().map(|tag| tag.as_str()))
        .bind(&trade.notes)
        .bind(&trade.tags)
        .bind(trade.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn delete_trade(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SnapshotStore for DbRepository {
    async fn append_snapshot(&self, snapshot: &BehaviorSnapshot) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO behavior_snapshots (
                id, owner_id, taken_at, overtrading, revenge_trade, fomo, inconsistent_risk,
                emotional_bias, discipline_score, consistency_score, trade_count
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(snapshot.id)
        .bind(snapshot.owner_id)
        .bind(snapshot.taken_at)
        .bind(snapshot.flags.overtrading)
        .bind(snapshot.flags.revenge_trade)
        .bind(snapshot.flags.fomo)
        .bind(snapshot.flags.inconsistent_risk)
        .bind(snapshot.flags.emotional_bias)
        .bind(snapshot.discipline_score)
        .bind(snapshot.consistency_score)
        .bind(to_i32(snapshot.trade_count))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_snapshots(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<BehaviorSnapshot>, DbError> {
        let rows = sqlx::query_as::<_, DbSnapshot>(
            r#"
            SELECT id, owner_id, taken_at, overtrading, revenge_trade, fomo, inconsistent_risk,
                   emotional_bias, discipline_score, consistency_score, trade_count
            FROM behavior_snapshots
            WHERE owner_id = $1
            ORDER BY taken_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(to_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BehaviorSnapshot::from).collect())
    }
}

#[async_trait]
impl ReportStore for DbRepository {
    async fn upsert_report(&self, report: &PeriodReport) -> Result<PeriodReport, DbError> {
        let stats = &report.stats;
        let row = sqlx::query_as::<_, DbReport>(&format!(
            r#"
            INSERT INTO period_reports (
                id, owner_id, period_start, period_end, total_trades, win_count, loss_count,
                win_rate, total_pnl, avg_r_multiple, best_trade, worst_trade, discipline_score,
                behavioral_flags, summary, recommendations, generated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (owner_id, period_start) DO UPDATE SET
                period_end = EXCLUDED.period_end,
                total_trades = EXCLUDED.total_trades,
                win_count = EXCLUDED.win_count,
                loss_count = EXCLUDED.loss_count,
                win_rate = EXCLUDED.win_rate,
                total_pnl = EXCLUDED.total_pnl,
                avg_r_multiple = EXCLUDED.avg_r_multiple,
                best_trade = EXCLUDED.best_trade,
                worst_trade = EXCLUDED.worst_trade,
                discipline_score = EXCLUDED.discipline_score,
                behavioral_flags = EXCLUDED.behavioral_flags,
                summary = EXCLUDED.summary,
                recommendations = EXCLUDED.recommendations,
                generated_at = EXCLUDED.generated_at
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.id)
        .bind(report.owner_id)
        .bind(report.period_start)
        .bind(report.period_end)
        .bind(to_i32(stats.total_trades))
        .bind(to_i32(stats.win_count))
        .bind(to_i32(stats.loss_count))
        .bind(stats.win_rate)
        .bind(stats.total_pnl)
        .bind(stats.avg_r_multiple)
        .bind(stats.best_trade)
        .bind(stats.worst_trade)
        .bind(stats.discipline_score)
        .bind(Json(&report.behavioral_flags))
        .bind(&report.summary)
        .bind(Json(&report.recommendations))
        .bind(report.generated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_reports(
        &self,
        owner_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PeriodReport>, DbError> {
        let rows = sqlx::query_as::<_, DbReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM period_reports WHERE owner_id = $1 \
             ORDER BY period_start DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PeriodReport::from).collect())
    }

    async fn get_report(&self, owner_id: Uuid, id: Uuid) -> Result<Option<PeriodReport>, DbError> {
        let row = sqlx::query_as::<_, DbReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM period_reports WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PeriodReport::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_pattern_escapes_wildcards_and_backslash() {
        assert_eq!(contains_pattern("xau"), "%xau%");
        assert_eq!(contains_pattern("a_b%"), r"%a\_b\%%");
        assert_eq!(contains_pattern(r"eur\usd"), r"%eur\\usd%");
        assert_eq!(contains_pattern(r"\%"), r"%\\\%%");
    }

    #[test]
    fn oversized_paging_saturates() {
        assert_eq!(to_i64(usize::MAX), i64::MAX);
        assert_eq!(to_i64(20), 20);
    }
}
