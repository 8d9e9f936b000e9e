use crate::error::CoreError;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An inclusive time range. A missing bound is open on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// The unbounded range; every timestamp falls inside it.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| ts >= from) && self.to.is_none_or(|to| ts <= to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Named look-back windows offered to callers of the summary and equity views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangePreset {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl RangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::Week => "7d",
            RangePreset::Month => "30d",
            RangePreset::Quarter => "90d",
            RangePreset::Year => "1y",
            RangePreset::All => "all",
        }
    }

    /// Resolves the preset into a concrete range ending at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateRange {
        let from = match self {
            RangePreset::Week => now - Duration::days(7),
            RangePreset::Month => now - Duration::days(30),
            RangePreset::Quarter => now - Duration::days(90),
            RangePreset::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            RangePreset::All => return DateRange::all(),
        };
        DateRange::between(from, now)
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(RangePreset::Week),
            "30d" => Ok(RangePreset::Month),
            "90d" => Ok(RangePreset::Quarter),
            "1y" => Ok(RangePreset::Year),
            "all" => Ok(RangePreset::All),
            other => Err(CoreError::UnknownTag("RangePreset", other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bounds_are_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let range = DateRange::between(from, to);
        assert!(range.contains(from));
        assert!(range.contains(to));
        assert!(!range.contains(to + Duration::seconds(1)));
    }

    #[test]
    fn all_preset_is_unbounded() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert!(RangePreset::All.resolve(now).is_unbounded());
        let week = RangePreset::Week.resolve(now);
        assert_eq!(week.from, Some(now - Duration::days(7)));
        assert_eq!(week.to, Some(now));
        assert_eq!("1y".parse::<RangePreset>().unwrap(), RangePreset::Year);
    }
}
