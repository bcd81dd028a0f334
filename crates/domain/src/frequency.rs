use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use tracing::warn;

/// How often a `RecurringSchedule` generates a new document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: `{0}`. Expected one of WEEKLY, BIWEEKLY, MONTHLY, QUARTERLY, YEARLY")]
pub struct InvalidFrequencyError(pub String);

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Biweekly => "BIWEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency read back from storage. Unknown values are
    /// treated as `Monthly` instead of failing the whole schedule.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown stored frequency: {}, falling back to {}",
                value,
                Self::Monthly
            );
            Self::Monthly
        })
    }

    /// The date following `from` for this frequency.
    ///
    /// Calendar months and years are added with overflow forward normalization,
    /// e.g. Jan 31 + 1 month is Mar 3 (Mar 2 in leap years) and
    /// Feb 29 + 1 year is Mar 1.
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        match self {
            Self::Weekly => add_days(from, 7),
            Self::Biweekly => add_days(from, 14),
            Self::Monthly => add_months(from, 1),
            Self::Quarterly => add_months(from, 3),
            Self::Yearly => add_months(from, 12),
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::Monthly
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = InvalidFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(Self::Weekly),
            "BIWEEKLY" => Ok(Self::Biweekly),
            "MONTHLY" => Ok(Self::Monthly),
            "QUARTERLY" => Ok(Self::Quarterly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(InvalidFrequencyError(s.to_string())),
        }
    }
}

/// Next date for the given frequency, see `Frequency::advance`
pub fn advance(from: NaiveDate, frequency: Frequency) -> NaiveDate {
    frequency.advance(from)
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

// Day of month is carried over as an offset from the first day of the target
// month, so days that do not exist in that month spill into the next one.
fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total_months = date.year() * 12 + date.month0() as i32 + months;
    let year = total_months.div_euclid(12);
    let month = total_months.rem_euclid(12) as u32 + 1;

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_signed(Duration::days(date.day0() as i64)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn advances_by_fixed_days() {
        assert_eq!(advance(date(2025, 1, 15), Frequency::Weekly), date(2025, 1, 22));
        assert_eq!(advance(date(2025, 12, 29), Frequency::Weekly), date(2026, 1, 5));
        assert_eq!(advance(date(2025, 1, 15), Frequency::Biweekly), date(2025, 1, 29));
        assert_eq!(advance(date(2024, 2, 20), Frequency::Biweekly), date(2024, 3, 5));
    }

    #[test]
    fn advances_by_calendar_months() {
        assert_eq!(advance(date(2025, 1, 15), Frequency::Monthly), date(2025, 2, 15));
        assert_eq!(advance(date(2025, 12, 15), Frequency::Monthly), date(2026, 1, 15));
        assert_eq!(advance(date(2025, 1, 15), Frequency::Quarterly), date(2025, 4, 15));
        assert_eq!(advance(date(2025, 11, 30), Frequency::Quarterly), date(2026, 3, 2));
        assert_eq!(advance(date(2025, 6, 1), Frequency::Yearly), date(2026, 6, 1));
    }

    #[test]
    fn month_overflow_spills_forward() {
        assert_eq!(advance(date(2025, 1, 31), Frequency::Monthly), date(2025, 3, 3));
        assert_eq!(advance(date(2024, 1, 31), Frequency::Monthly), date(2024, 3, 2));
        assert_eq!(advance(date(2025, 3, 31), Frequency::Monthly), date(2025, 5, 1));
        assert_eq!(advance(date(2024, 2, 29), Frequency::Yearly), date(2025, 3, 1));
    }

    #[test]
    fn advance_is_deterministic() {
        let from = date(2025, 1, 31);
        for frequency in &[
            Frequency::Weekly,
            Frequency::Biweekly,
            Frequency::Monthly,
            Frequency::Quarterly,
            Frequency::Yearly,
        ] {
            assert_eq!(advance(from, *frequency), advance(from, *frequency));
        }
    }

    #[test]
    fn parses_frequencies() {
        assert_eq!("weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!("QUARTERLY".parse::<Frequency>(), Ok(Frequency::Quarterly));
        assert!("DAILY".parse::<Frequency>().is_err());
    }

    #[test]
    fn unknown_stored_frequency_is_monthly() {
        assert_eq!(Frequency::from_stored("FORTNIGHTLY"), Frequency::Monthly);
        assert_eq!(Frequency::from_stored("BIWEEKLY"), Frequency::Biweekly);
    }
}
