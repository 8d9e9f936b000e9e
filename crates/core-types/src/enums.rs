use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed set of tags that travel as fixed strings: in JSON, in the
/// database `TEXT` columns, and in cache keys.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::UnknownTag(stringify!($name), other.to_string())),
                }
            }
        }
    };
}

string_enum! {
    /// The side of a trade.
    pub enum Direction {
        Long => "LONG",
        Short => "SHORT",
    }
}

string_enum! {
    /// Lifecycle state of a trade. Always derived, never supplied by a caller.
    pub enum TradeStatus {
        Open => "open",
        Win => "win",
        Loss => "loss",
        Breakeven => "breakeven",
    }
}

string_enum! {
    pub enum Market {
        Forex => "forex",
        Crypto => "crypto",
        Stocks => "stocks",
        Indices => "indices",
        Commodities => "commodities",
        Futures => "futures",
    }
}

string_enum! {
    /// The setup a trader attributes the trade to.
    pub enum Strategy {
        Breakout => "Breakout",
        Reversal => "Reversal",
        TrendFollow => "Trend Follow",
        HtfRejection => "HTF Rejection",
        Momentum => "Momentum",
        Scalp => "Scalp",
        News => "News",
        Other => "Other",
    }
}

string_enum! {
    /// The market session the trade was taken in.
    pub enum Session {
        London => "London",
        NewYork => "New York",
        Asia => "Asia",
        Overlap => "Overlap",
        OffHours => "Off-Hours",
    }
}

string_enum! {
    /// Self-reported state of mind before entering.
    pub enum EmotionBefore {
        Confident => "Confident",
        Neutral => "Neutral",
        Anxious => "Anxious",
        Fomo => "FOMO",
        Revenge => "Revenge",
        Excited => "Excited",
        Bored => "Bored",
        Fearful => "Fearful",
    }
}

string_enum! {
    /// Self-reported state of mind after the trade.
    pub enum EmotionAfter {
        Satisfied => "Satisfied",
        Neutral => "Neutral",
        Frustrated => "Frustrated",
        Relieved => "Relieved",
        Regretful => "Regretful",
        Euphoric => "Euphoric",
        Disappointed => "Disappointed",
    }
}

string_enum! {
    /// The execution mistake a trader tagged on a trade.
    pub enum MistakeTag {
        FomoEntry => "FOMO Entry",
        RevengeTrade => "Revenge Trade",
        Overtrading => "Overtrading",
        MovedStop => "Moved Stop",
        EarlyExit => "Early Exit",
        LateEntry => "Late Entry",
        NoSetup => "No Setup",
        SizedTooBig => "Sized Too Big",
    }
}

string_enum! {
    pub enum Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl TradeStatus {
    pub fn is_closed(&self) -> bool {
        !matches!(self, TradeStatus::Open)
    }
}

impl EmotionBefore {
    /// Emotions counted towards emotional bias.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            EmotionBefore::Anxious
                | EmotionBefore::Revenge
                | EmotionBefore::Fomo
                | EmotionBefore::Fearful
        )
    }
}

impl MistakeTag {
    /// Mistakes that indicate chasing a move.
    pub fn is_fomo(&self) -> bool {
        matches!(self, MistakeTag::FomoEntry | MistakeTag::LateEntry)
    }
}

impl Default for Market {
    fn default() -> Self {
        Market::Forex
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Other
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::London
    }
}

impl Default for EmotionBefore {
    fn default() -> Self {
        EmotionBefore::Neutral
    }
}

impl Default for EmotionAfter {
    fn default() -> Self {
        EmotionAfter::Neutral
    }
}
