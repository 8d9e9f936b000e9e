use chrono::{DateTime, Utc};
use core_types::{DateRange, Session, Strategy, Trade, TradeStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Result ordering for trade queries. Ties are broken by the other timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSort {
    #[default]
    TradeDateDesc,
    TradeDateAsc,
    CreatedAtDesc,
    CreatedAtAsc,
    PnlDesc,
    PnlAsc,
}

impl TradeSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSort::TradeDateDesc => "trade_date_desc",
            TradeSort::TradeDateAsc => "trade_date_asc",
            TradeSort::CreatedAtDesc => "created_at_desc",
            TradeSort::CreatedAtAsc => "created_at_asc",
            TradeSort::PnlDesc => "pnl_desc",
            TradeSort::PnlAsc => "pnl_asc",
        }
    }

    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            TradeSort::TradeDateDesc => "trade_date DESC, created_at DESC",
            TradeSort::TradeDateAsc => "trade_date ASC, created_at ASC",
            TradeSort::CreatedAtDesc => "created_at DESC, trade_date DESC",
            TradeSort::CreatedAtAsc => "created_at ASC, trade_date ASC",
            TradeSort::PnlDesc => "pnl DESC, trade_date DESC",
            TradeSort::PnlAsc => "pnl ASC, trade_date DESC",
        }
    }

    pub(crate) fn compare(&self, a: &Trade, b: &Trade) -> Ordering {
        match self {
            TradeSort::TradeDateDesc => b
                .trade_date
                .cmp(&a.trade_date)
                .then(b.created_at.cmp(&a.created_at)),
            TradeSort::TradeDateAsc => a
                .trade_date
                .cmp(&b.trade_date)
                .then(a.created_at.cmp(&b.created_at)),
            TradeSort::CreatedAtDesc => b
                .created_at
                .cmp(&a.created_at)
                .then(b.trade_date.cmp(&a.trade_date)),
            TradeSort::CreatedAtAsc => a
                .created_at
                .cmp(&b.created_at)
                .then(a.trade_date.cmp(&b.trade_date)),
            TradeSort::PnlDesc => b.pnl.cmp(&a.pnl).then(b.trade_date.cmp(&a.trade_date)),
            TradeSort::PnlAsc => a.pnl.cmp(&b.pnl).then(b.trade_date.cmp(&a.trade_date)),
        }
    }
}

/// A filter over one owner's trades, with ordering and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuery {
    pub owner_id: Uuid,
    pub status: Option<TradeStatus>,
    /// Excludes open trades.
    pub closed_only: bool,
    pub strategy: Option<Strategy>,
    pub session: Option<Session>,
    /// Case-insensitive substring of the symbol.
    pub symbol: Option<String>,
    /// Inclusive bounds on `trade_date`.
    pub trade_date: DateRange,
    /// Only trades logged at or after this instant.
    pub created_since: Option<DateTime<Utc>>,
    pub sort: TradeSort,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl TradeQuery {
    /// Every trade of `owner_id`, newest trade date first.
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            status: None,
            closed_only: false,
            strategy: None,
            session: None,
            symbol: None,
            trade_date: DateRange::all(),
            created_since: None,
            sort: TradeSort::default(),
            offset: 0,
            limit: None,
        }
    }

    pub fn closed(mut self) -> Self {
        self.closed_only = true;
        self
    }

    pub fn within(mut self, range: DateRange) -> Self {
        self.trade_date = range;
        self
    }

    pub fn created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    pub fn sorted(mut self, sort: TradeSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `trade` passes every filter. Paging is not considered.
    pub fn matches(&self, trade: &Trade) -> bool {
        trade.owner_id == self.owner_id
            && self.status.is_none_or(|status| trade.status == status)
            && (!self.closed_only || trade.is_closed())
            && self.strategy.is_none_or(|strategy| trade.strategy == strategy)
            && self.session.is_none_or(|session| trade.session == session)
            && self.symbol.as_deref().is_none_or(|needle| {
                trade
                    .symbol
                    .to_ascii_lowercase()
                    .contains(&needle.to_ascii_lowercase())
            })
            && self.trade_date.contains(trade.trade_date)
            && self.created_since.is_none_or(|since| trade.created_at >= since)
    }

    /// A stable textual key for the filters, sort and page, used in cache keys.
    pub fn fingerprint(&self) -> String {
        let opt = |value: Option<&str>| value.unwrap_or("-").to_string();
        let ts = |value: Option<DateTime<Utc>>| {
            value.map_or_else(|| "-".to_string(), |t| t.timestamp_millis().to_string())
        };
        format!(
            "status={}|closed={}|strategy={}|session={}|symbol={}|from={}|to={}|since={}|sort={}|offset={}|limit={}",
            opt(self.status.as_ref().map(TradeStatus::as_str)),
            self.closed_only,
            opt(self.strategy.as_ref().map(Strategy::as_str)),
            opt(self.session.as_ref().map(Session::as_str)),
            opt(self.symbol.as_deref()),
            ts(self.trade_date.from),
            ts(self.trade_date.to),
            ts(self.created_since),
            self.sort.as_str(),
            self.offset,
            self.limit.map_or_else(|| "-".to_string(), |l| l.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::{Direction, NewTrade};
    use rust_decimal_macros::dec;

    fn trade(owner: Uuid, symbol: &str, exit: Option<rust_decimal::Decimal>) -> Trade {
        let now = Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap();
        let input = NewTrade {
            exit_price: exit,
            ..NewTrade::new(symbol, Direction::Short, dec!(50), dec!(2))
        };
        Trade::open(owner, input, now).unwrap()
    }

    #[test]
    fn filters_combine() {
        let owner = Uuid::new_v4();
        let open_gold = trade(owner, "xauusd", None);
        let closed_gold = trade(owner, "XAUUSD", Some(dec!(45)));
        let stranger = trade(Uuid::new_v4(), "XAUUSD", Some(dec!(45)));

        let query = TradeQuery {
            symbol: Some("xau".to_string()),
            ..TradeQuery::for_owner(owner).closed()
        };
        assert!(!query.matches(&open_gold));
        assert!(query.matches(&closed_gold));
        assert!(!query.matches(&stranger));

        let winners = TradeQuery {
            status: Some(TradeStatus::Win),
            ..TradeQuery::for_owner(owner)
        };
        assert!(winners.matches(&closed_gold));
    }

    #[test]
    fn fingerprint_distinguishes_pages() {
        let owner = Uuid::new_v4();
        let first = TradeQuery::for_owner(owner).page(0, 20);
        let second = TradeQuery::for_owner(owner).page(20, 20);
        assert_ne!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint(), first.clone().fingerprint());
    }
}
