//! Factor period definitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::DateRange;

/// The period a normalized factor describes.
///
/// Week and month periods are *to-date*: a trailing window of calendar days
/// ending on (and including) the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FactorPeriod {
    /// A single calendar day.
    #[default]
    Day,
    /// Trailing 7-day window ending on the reference date.
    Week,
    /// Trailing 30-day window ending on the reference date.
    Month,
}

impl FactorPeriod {
    /// Returns the day offset defining this period's trailing window.
    ///
    /// The window is the inclusive range `[date + days_back + 1, date]`:
    /// `-7` yields the 7 calendar days ending on the reference date.
    #[must_use]
    pub const fn days_back(&self) -> i64 {
        match self {
            Self::Day => 0,
            Self::Week => -7,
            Self::Month => -30,
        }
    }

    /// Returns the trailing window ending on `date`, or `None` when the
    /// period has no window (the day period covers no trailing days).
    #[must_use]
    pub fn window(&self, date: NaiveDate) -> Option<DateRange> {
        DateRange::trailing(date, self.days_back())
    }

    /// Returns the period as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Returns all available periods.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Day, Self::Week, Self::Month]
    }
}

impl std::fmt::Display for FactorPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FactorPeriod {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Self::Day),
            "w" | "week" | "weekly" => Ok(Self::Week),
            "m" | "month" | "monthly" => Ok(Self::Month),
            _ => Err(PeriodParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid period string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodParseError(String);

impl std::fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid period '{}', expected one of: day, week, month", self.0)
    }
}

impl std::error::Error for PeriodParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_back() {
        assert_eq!(FactorPeriod::Day.days_back(), 0);
        assert_eq!(FactorPeriod::Week.days_back(), -7);
        assert_eq!(FactorPeriod::Month.days_back(), -30);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("day".parse::<FactorPeriod>().unwrap(), FactorPeriod::Day);
        assert_eq!("WEEK".parse::<FactorPeriod>().unwrap(), FactorPeriod::Week);
        assert_eq!("m".parse::<FactorPeriod>().unwrap(), FactorPeriod::Month);
        assert!("fortnight".parse::<FactorPeriod>().is_err());
    }

    #[test]
    fn test_window_spans() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 10).unwrap();

        let week = FactorPeriod::Week.window(date).unwrap();
        assert_eq!(week.start, NaiveDate::from_ymd_opt(2022, 1, 4).unwrap());
        assert_eq!(week.end, date);
        assert_eq!(week.total_days(), 7);

        let month = FactorPeriod::Month.window(date).unwrap();
        assert_eq!(month.total_days(), 30);

        assert!(FactorPeriod::Day.window(date).is_none());
    }
}
