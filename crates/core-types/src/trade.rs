use crate::enums::{
    Direction, EmotionAfter, EmotionBefore, Market, MistakeTag, Session, Strategy, TradeStatus,
};
use crate::error::CoreError;
use crate::rounding::{round_money, round_ratio};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

const MAX_SYMBOL_LEN: usize = 20;
const MAX_NOTES_LEN: usize = 2000;

/// One logged position, open or closed.
///
/// `pnl`, `pnl_percent`, `risk_reward`, `r_multiple` and `status` are derived
/// from the price fields by [`Trade::recompute_derived`]. Every path that
/// changes prices, direction or size goes through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub symbol: String,
    pub market: Market,
    pub direction: Direction,

    // Prices
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub position_size: Decimal,

    // Derived
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub risk_reward: Option<Decimal>,
    pub r_multiple: Option<Decimal>,
    pub status: TradeStatus,

    // Context
    pub strategy: Strategy,
    pub session: Session,
    pub trade_date: DateTime<Utc>,
    pub duration_minutes: Option<i32>,

    // Psychology
    pub emotion_before: EmotionBefore,
    pub emotion_after: EmotionAfter,
    pub mistake_tag: Option<MistakeTag>,
    pub notes: String,
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a trader supplies when logging a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub symbol: String,
    #[serde(default)]
    pub market: Market,
    pub direction: Direction,
    pub entry_price: Decimal,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    pub position_size: Decimal,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub session: Session,
    /// Defaults to the logging time.
    #[serde(default)]
    pub trade_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub emotion_before: EmotionBefore,
    #[serde(default)]
    pub emotion_after: EmotionAfter,
    #[serde(default)]
    pub mistake_tag: Option<MistakeTag>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewTrade {
    /// An input with only the required fields set; every tag takes its default.
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        entry_price: Decimal,
        position_size: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            market: Market::default(),
            direction,
            entry_price,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            position_size,
            strategy: Strategy::default(),
            session: Session::default(),
            trade_date: None,
            duration_minutes: None,
            emotion_before: EmotionBefore::default(),
            emotion_after: EmotionAfter::default(),
            mistake_tag: None,
            notes: String::new(),
            tags: Vec::new(),
        }
    }
}

/// A partial update. Nullable fields distinguish "leave as is" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradeEdit {
    pub symbol: Option<String>,
    pub market: Option<Market>,
    pub direction: Option<Direction>,
    pub entry_price: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    pub exit_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    pub stop_loss: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    pub take_profit: Option<Option<Decimal>>,
    pub position_size: Option<Decimal>,
    pub strategy: Option<Strategy>,
    pub session: Option<Session>,
    pub trade_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present")]
    pub duration_minutes: Option<Option<i32>>,
    pub emotion_before: Option<EmotionBefore>,
    pub emotion_after: Option<EmotionAfter>,
    #[serde(default, deserialize_with = "present")]
    pub mistake_tag: Option<Option<MistakeTag>>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Maps a present JSON key (including an explicit `null`) to `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Trade {
    /// Builds a validated trade for `owner_id` from trader input.
    pub fn open(owner_id: Uuid, input: NewTrade, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let mut trade = Self {
            id: Uuid::new_v4(),
            owner_id,
            symbol: normalize_symbol(&input.symbol),
            market: input.market,
            direction: input.direction,
            entry_price: input.entry_price,
            exit_price: input.exit_price,
            stop_loss: input.stop_loss,
            take_profit: input.take_profit,
            position_size: input.position_size,
            pnl: Decimal::ZERO,
            pnl_percent: Decimal::ZERO,
            risk_reward: None,
            r_multiple: None,
            status: TradeStatus::Open,
            strategy: input.strategy,
            session: input.session,
            trade_date: input.trade_date.unwrap_or(now),
            duration_minutes: input.duration_minutes,
            emotion_before: input.emotion_before,
            emotion_after: input.emotion_after,
            mistake_tag: input.mistake_tag,
            notes: input.notes,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        trade.validate()?;
        trade.recompute_derived()?;
        Ok(trade)
    }

    /// Applies a partial update and re-derives the computed fields.
    ///
    /// The trade is left untouched when the result would be invalid.
    pub fn apply_edit(&mut self, edit: TradeEdit, now: DateTime<Utc>) -> Result<(), CoreError> {
        let mut next = self.clone();
        if let Some(symbol) = edit.symbol {
            next.symbol = normalize_symbol(&symbol);
        }
        if let Some(market) = edit.market {
            next.market = market;
        }
        if let Some(direction) = edit.direction {
            next.direction = direction;
        }
        if let Some(entry_price) = edit.entry_price {
            next.entry_price = entry_price;
        }
        if let Some(exit_price) = edit.exit_price {
            next.exit_price = exit_price;
        }
        if let Some(stop_loss) = edit.stop_loss {
            next.stop_loss = stop_loss;
        }
        if let Some(take_profit) = edit.take_profit {
            next.take_profit = take_profit;
        }
        if let Some(position_size) = edit.position_size {
            next.position_size = position_size;
        }
        if let Some(strategy) = edit.strategy {
            next.strategy = strategy;
        }
        if let Some(session) = edit.session {
            next.session = session;
        }
        if let Some(trade_date) = edit.trade_date {
            next.trade_date = trade_date;
        }
        if let Some(duration_minutes) = edit.duration_minutes {
            next.duration_minutes = duration_minutes;
        }
        if let Some(emotion_before) = edit.emotion_before {
            next.emotion_before = emotion_before;
        }
        if let Some(emotion_after) = edit.emotion_after {
            next.emotion_after = emotion_after;
        }
        if let Some(mistake_tag) = edit.mistake_tag {
            next.mistake_tag = mistake_tag;
        }
        if let Some(notes) = edit.notes {
            next.notes = notes;
        }
        if let Some(tags) = edit.tags {
            next.tags = tags;
        }

        next.validate()?;
        next.recompute_derived()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Re-derives `pnl`, `pnl_percent`, `risk_reward`, `r_multiple` and `status`
    /// from the price fields.
    ///
    /// A trade without an exit is open and carries no realised result. The
    /// planned risk/reward only needs a stop and a target, so it is set on open
    /// trades too. Fails without touching the trade when a derived value does
    /// not fit in a `Decimal`.
    pub fn recompute_derived(&mut self) -> Result<(), CoreError> {
        let risk_per_unit = self
            .stop_loss
            .map(|stop| (self.entry_price - stop).abs())
            .filter(|risk| !risk.is_zero());

        let risk_reward = match (risk_per_unit, self.take_profit) {
            (Some(risk), Some(target)) => Some(round_ratio(checked(
                "risk_reward",
                (target - self.entry_price).abs().checked_div(risk),
            )?)),
            _ => None,
        };

        let Some(exit) = self.exit_price else {
            self.risk_reward = risk_reward;
            self.pnl = Decimal::ZERO;
            self.pnl_percent = Decimal::ZERO;
            self.r_multiple = None;
            self.status = TradeStatus::Open;
            return Ok(());
        };

        let diff = match self.direction {
            Direction::Long => exit.checked_sub(self.entry_price),
            Direction::Short => self.entry_price.checked_sub(exit),
        };
        let diff = checked("exit_price", diff)?;
        let pnl = round_money(checked("pnl", diff.checked_mul(self.position_size))?);
        let pnl_percent = if self.entry_price.is_zero() {
            Decimal::ZERO
        } else {
            round_money(checked(
                "pnl_percent",
                diff.checked_div(self.entry_price)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED)),
            )?)
        };
        let r_multiple = match risk_per_unit {
            Some(risk) => Some(round_ratio(checked("r_multiple", diff.checked_div(risk))?)),
            None => None,
        };

        self.risk_reward = risk_reward;
        self.pnl = pnl;
        self.pnl_percent = pnl_percent;
        self.r_multiple = r_multiple;
        self.status = if pnl > Decimal::ZERO {
            TradeStatus::Win
        } else if pnl < Decimal::ZERO {
            TradeStatus::Loss
        } else {
            TradeStatus::Breakeven
        };
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.is_empty() || self.symbol.chars().count() > MAX_SYMBOL_LEN {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                format!("must be 1 to {MAX_SYMBOL_LEN} characters"),
            ));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "entry_price".to_string(),
                "must be greater than 0".to_string(),
            ));
        }
        if self.position_size <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "position_size".to_string(),
                "must be greater than 0".to_string(),
            ));
        }
        for (field, price) in [
            ("exit_price", self.exit_price),
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
        ] {
            if price.is_some_and(|p| p < Decimal::ZERO) {
                return Err(CoreError::InvalidInput(
                    field.to_string(),
                    "must not be negative".to_string(),
                ));
            }
        }
        if self.notes.chars().count() > MAX_NOTES_LEN {
            return Err(CoreError::InvalidInput(
                "notes".to_string(),
                format!("must be at most {MAX_NOTES_LEN} characters"),
            ));
        }
        Ok(())
    }
}

fn checked(field: &str, value: Option<Decimal>) -> Result<Decimal, CoreError> {
    value.ok_or_else(|| {
        CoreError::InvalidInput(field.to_string(), "result is out of range".to_string())
    })
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn input(direction: Direction, entry: Decimal, exit: Option<Decimal>) -> NewTrade {
        NewTrade {
            symbol: " eurusd ".to_string(),
            market: Market::Forex,
            direction,
            entry_price: entry,
            exit_price: exit,
            stop_loss: None,
            take_profit: None,
            position_size: dec!(10),
            strategy: Strategy::Breakout,
            session: Session::London,
            trade_date: None,
            duration_minutes: None,
            emotion_before: EmotionBefore::Neutral,
            emotion_after: EmotionAfter::Neutral,
            mistake_tag: None,
            notes: String::new(),
            tags: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).unwrap()
    }

    #[test]
    fn trade_without_exit_is_open_with_zero_pnl() {
        let trade = Trade::open(Uuid::new_v4(), input(Direction::Long, dec!(100), None), now())
            .unwrap();
        assert_eq!(trade.symbol, "EURUSD");
        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.pnl, Decimal::ZERO);
        assert_eq!(trade.r_multiple, None);
        assert_eq!(trade.trade_date, now());
    }

    #[test]
    fn long_and_short_pnl_follow_direction() {
        let long =
            Trade::open(Uuid::new_v4(), input(Direction::Long, dec!(100), Some(dec!(105))), now())
                .unwrap();
        assert_eq!(long.pnl, dec!(50));
        assert_eq!(long.pnl_percent, dec!(5));
        assert_eq!(long.status, TradeStatus::Win);

        let short =
            Trade::open(Uuid::new_v4(), input(Direction::Short, dec!(100), Some(dec!(105))), now())
                .unwrap();
        assert_eq!(short.pnl, dec!(-50));
        assert_eq!(short.status, TradeStatus::Loss);

        let flat =
            Trade::open(Uuid::new_v4(), input(Direction::Short, dec!(100), Some(dec!(100))), now())
                .unwrap();
        assert_eq!(flat.status, TradeStatus::Breakeven);
    }

    #[test]
    fn r_multiple_requires_a_non_zero_stop_distance() {
        let mut new = input(Direction::Long, dec!(100), Some(dec!(90)));
        new.stop_loss = Some(dec!(95));
        new.take_profit = Some(dec!(115));
        let trade = Trade::open(Uuid::new_v4(), new.clone(), now()).unwrap();
        assert_eq!(trade.r_multiple, Some(dec!(-2)));
        assert_eq!(trade.risk_reward, Some(dec!(3)));

        new.stop_loss = Some(dec!(100));
        let trade = Trade::open(Uuid::new_v4(), new, now()).unwrap();
        assert_eq!(trade.r_multiple, None);
        assert_eq!(trade.risk_reward, None);
    }

    #[test]
    fn editing_prices_recomputes_status() {
        let mut trade =
            Trade::open(Uuid::new_v4(), input(Direction::Long, dec!(100), None), now()).unwrap();
        let later = now() + chrono::Duration::hours(2);

        trade
            .apply_edit(
                TradeEdit {
                    exit_price: Some(Some(dec!(98))),
                    ..Default::default()
                },
                later,
            )
            .unwrap();
        assert_eq!(trade.status, TradeStatus::Loss);
        assert_eq!(trade.pnl, dec!(-20));
        assert_eq!(trade.updated_at, later);

        trade
            .apply_edit(
                TradeEdit {
                    exit_price: Some(None),
                    ..Default::default()
                },
                later,
            )
            .unwrap();
        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.pnl, Decimal::ZERO);
    }

    #[test]
    fn invalid_edit_leaves_trade_unchanged() {
        let mut trade =
            Trade::open(Uuid::new_v4(), input(Direction::Long, dec!(100), None), now()).unwrap();
        let before = trade.clone();
        let result = trade.apply_edit(
            TradeEdit {
                position_size: Some(Decimal::ZERO),
                ..Default::default()
            },
            now(),
        );
        assert!(result.is_err());
        assert_eq!(trade, before);
    }

    #[test]
    fn explicit_null_clears_a_nullable_field() {
        let edit: TradeEdit = serde_json::from_str(r#"{"stop_loss": null}"#).unwrap();
        assert_eq!(edit.stop_loss, Some(None));
        let edit: TradeEdit = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(edit.stop_loss, None);
    }

    #[test]
    fn out_of_range_results_are_rejected() {
        let mut tight_stop = input(Direction::Long, dec!(1), Some(dec!(1000000000000)));
        tight_stop.position_size = dec!(1);
        tight_stop.stop_loss = Some(dec!(0.9999999999999999999999999999));
        let err = Trade::open(Uuid::new_v4(), tight_stop, now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref field, _) if field == "r_multiple"));

        let mut huge = input(Direction::Long, dec!(1), Some(Decimal::MAX));
        huge.position_size = Decimal::MAX;
        let err = Trade::open(Uuid::new_v4(), huge, now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref field, _) if field == "pnl"));
    }

    #[test]
    fn out_of_range_edit_leaves_trade_unchanged() {
        let mut trade =
            Trade::open(Uuid::new_v4(), input(Direction::Long, dec!(100), None), now()).unwrap();
        let before = trade.clone();
        let result = trade.apply_edit(
            TradeEdit {
                exit_price: Some(Some(Decimal::MAX)),
                position_size: Some(Decimal::MAX),
                ..Default::default()
            },
            now(),
        );
        assert!(result.is_err());
        assert_eq!(trade, before);
    }

    #[test]
    fn large_but_representable_trades_still_derive() {
        let mut new = input(Direction::Short, dec!(50000), Some(dec!(49000)));
        new.position_size = dec!(1000000);
        let trade = Trade::open(Uuid::new_v4(), new, now()).unwrap();
        assert_eq!(trade.pnl, dec!(1000000000));
        assert_eq!(trade.pnl_percent, dec!(2));
    }
}
