//! Customer birthdays with the minimum-age rule.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a [`Birthday`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BirthdayError {
    #[error("birthday is not a recognised date: {0}")]
    Unparseable(String),
    #[error("customer must be at least {min_age} years old")]
    TooYoung { min_age: u32 },
}

/// A date of birth at least [`Birthday::MINIMUM_AGE_YEARS`] before a reference day.
///
/// Accepts ISO dates (`1990-04-21`) and the browser `Date.toDateString()`
/// form the sign-up form submits (`Sat Apr 21 1990`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Birthday(NaiveDate);

impl Birthday {
    pub const MINIMUM_AGE_YEARS: u32 = 18;

    const FORMATS: [&'static str; 2] = ["%Y-%m-%d", "%a %b %d %Y"];

    /// Parse a birthday and check the minimum age as of `today`.
    ///
    /// Someone whose 18th birthday is `today` is old enough.
    ///
    /// # Errors
    ///
    /// Returns [`BirthdayError::Unparseable`] for unknown formats and
    /// [`BirthdayError::TooYoung`] when the age rule fails.
    pub fn parse(input: &str, today: NaiveDate) -> Result<Self, BirthdayError> {
        let trimmed = input.trim();
        let date = Self::FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
            .ok_or_else(|| BirthdayError::Unparseable(trimmed.to_owned()))?;

        Self::new(date, today)
    }

    /// Check the minimum age of an already parsed date.
    ///
    /// # Errors
    ///
    /// Returns [`BirthdayError::TooYoung`] when the age rule fails.
    pub fn new(date: NaiveDate, today: NaiveDate) -> Result<Self, BirthdayError> {
        let too_young = BirthdayError::TooYoung {
            min_age: Self::MINIMUM_AGE_YEARS,
        };
        let cutoff = today
            .checked_sub_months(Months::new(Self::MINIMUM_AGE_YEARS * 12))
            .ok_or_else(|| too_young.clone())?;

        if date > cutoff {
            return Err(too_young);
        }
        Ok(Self(date))
    }

    /// Wrap a date read back from storage without re-checking the age rule.
    #[must_use]
    pub const fn from_stored(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_and_date_string() {
        let today = day(2026, 10, 18);
        let iso = Birthday::parse("1990-04-21", today).unwrap();
        let js = Birthday::parse("Sat Apr 21 1990", today).unwrap();
        assert_eq!(iso, js);
        assert_eq!(iso.date(), day(1990, 4, 21));
    }

    #[test]
    fn test_eighteenth_birthday_today_is_allowed() {
        let today = day(2026, 10, 18);
        assert!(Birthday::parse("2008-10-18", today).is_ok());
        assert_eq!(
            Birthday::parse("2008-10-19", today),
            Err(BirthdayError::TooYoung { min_age: 18 })
        );
    }

    #[test]
    fn test_leap_day_cutoff() {
        // 18 years before 2026-02-28 is 2008-02-28; a leap-day baby turns 18 on Mar 1.
        let today = day(2026, 2, 28);
        assert!(Birthday::parse("2008-02-29", today).is_err());
        assert!(Birthday::parse("2008-02-28", today).is_ok());
    }

    #[test]
    fn test_unparseable() {
        let today = day(2026, 10, 18);
        assert!(matches!(
            Birthday::parse("21/04/1990", today),
            Err(BirthdayError::Unparseable(_))
        ));
        assert!(matches!(
            Birthday::parse("", today),
            Err(BirthdayError::Unparseable(_))
        ));
    }
}
