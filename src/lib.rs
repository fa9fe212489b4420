//! # croncalc
//!
//! croncalc parses cron expressions in more than one dialect and calculates the
//! next calendar time an expression fires.
//!
//! ## Features
//! - Classic (Vixie-style) and Quartz-style grammars, plus custom dialects built from the same options.
//! - Optional seconds and year fields, `?` in the day fields, month and weekday names.
//! - Equality of expressions by what they match, not how they are written.
//! - Works on `chrono` calendar times, or on Unix timestamps interpreted as UTC.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use croncalc::{Cron, Dialect};
//!
//! // At 07:00:00 on every weekday
//! let cron = Cron::parse("0 0 7 ? * MON-FRI", &Dialect::quartz()).expect("Successful parsing");
//!
//! // Saturday 2009-09-26 00:42:55
//! let saturday = NaiveDate::from_ymd_opt(2009, 9, 26)
//!     .unwrap()
//!     .and_hms_opt(0, 42, 55)
//!     .unwrap();
//!
//! let next = cron.find_next_occurrence(&saturday).unwrap();
//! assert_eq!(next.to_string(), "2009-09-28 07:00:00");
//! ```
//!
//! The search is always strictly after the given time, and gives up with `None`
//! when nothing matches within a few years (for instance `0 0 30 2 *`).
//!
//! ## Pattern
//!
//! ```javascript
//! // ┌──────────────── second (0 - 59), Quartz only
//! // │ ┌────────────── minute (0 - 59)
//! // │ │ ┌──────────── hour (0 - 23)
//! // │ │ │ ┌────────── day of month (1 - 31)
//! // │ │ │ │ ┌──────── month (1 - 12, JAN-DEC)
//! // │ │ │ │ │ ┌────── day of week (classic 0 - 7, Quartz 1 - 7, SUN-SAT)
//! // │ │ │ │ │ │ ┌──── (optional) year (1970 - 2099)
//! // │ │ │ │ │ │ │
//! // * * * * * * *
//! ```
//!
//! | Field        | Allowed values          | Allowed special characters |
//! | ------------ | ----------------------- | -------------------------- |
//! | Seconds      | 0-59                    | * , - /                    |
//! | Minutes      | 0-59                    | * , - /                    |
//! | Hours        | 0-23                    | * , - /                    |
//! | Day of Month | 1-31                    | * , - / ?                  |
//! | Month        | 1-12 or JAN-DEC         | * , - /                    |
//! | Day of Week  | 0-7 or 1-7, or SUN-SAT  | * , - / ?                  |
//! | Year         | 1970-2099               | * , - /                    |
//!
//! In the classic dialect 0 and 7 are both Sunday. In the Quartz dialect Sunday
//! is 1 and Saturday is 7. `?` is only accepted by dialects that enable it.
//!
//! When both day fields are restricted a day matches if either one does, unless
//! the dialect is built with `dom_and_dow`.

pub mod component;
pub mod dialect;
pub mod errors;
mod iterator;
pub mod parser;
pub mod pattern;

pub use dialect::Dialect;
pub use errors::CronError;
pub use iterator::CronIterator;

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use dialect::{FieldKind, YEAR_LOWER_LIMIT, YEAR_UPPER_LIMIT};
use parser::CronParser;
use pattern::CronPattern;

/// Years searched past the start when the year field does not bound the search.
///
/// Eight years always include the next February 29th, also across a century
/// year that is not a leap year (2096 to 2104).
pub const MAX_YEARS_DIFF: i32 = 8;

#[derive(Debug, Clone, Copy)]
enum TimeComponent {
    Second,
    Minute,
    Hour,
    Day,
    Month,
}

/// A parsed cron expression.
///
/// `Cron` is immutable and can be shared between threads. Two values are equal
/// when they match exactly the same times.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cron {
    pub pattern: CronPattern, // Parsed cron pattern
}

impl Cron {
    /// Parses `pattern` according to `dialect`.
    ///
    /// # Errors
    ///
    /// Returns a [`CronError`] naming the first field, token or value that does
    /// not fit the dialect. A partially valid expression is never returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use croncalc::{Cron, CronError, Dialect};
    ///
    /// assert!(Cron::parse("*/15 * 1-4 * * *", &Dialect::quartz()).is_ok());
    /// assert!(matches!(
    ///     Cron::parse("0 0 7 ? * MON-FRI", &Dialect::classic()),
    ///     Err(CronError::InvalidFieldCount { .. })
    /// ));
    /// ```
    pub fn parse(pattern: &str, dialect: &Dialect) -> Result<Cron, CronError> {
        CronParser::new(*dialect).parse(pattern)
    }

    /// Canonical form: every field's membership set as `'1'`/`'0'` characters,
    /// fields separated by a space.
    ///
    /// ```
    /// use croncalc::{Cron, Dialect};
    ///
    /// let every_five = Cron::parse("*/5 0 0 1 1 ?", &Dialect::quartz()).unwrap();
    /// let seconds = every_five.canonical();
    /// assert!(seconds.starts_with("100001000010000"));
    /// ```
    pub fn canonical(&self) -> String {
        self.pattern.to_bit_string()
    }

    /// Evaluates if a given calendar time matches the cron pattern, down to the
    /// second. Sub-second precision is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use croncalc::Cron;
    ///
    /// let cron: Cron = "30 12 * * *".parse().expect("Couldn't parse cron string");
    /// let noon = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 30, 0).unwrap();
    /// assert!(cron.is_time_matching(&noon));
    /// ```
    pub fn is_time_matching(&self, time: &NaiveDateTime) -> bool {
        self.pattern.year_match(time.year())
            && self.pattern.month_match(time.month())
            && self.pattern.day_match(time.date())
            && self.pattern.hour_match(time.hour())
            && self.pattern.minute_match(time.minute())
            && self.pattern.second_match(time.second())
    }

    /// Finds the earliest calendar time strictly after `from` that matches the
    /// pattern.
    ///
    /// Returns `None` when no time matches before the search horizon: the last
    /// year allowed by a restricted year field, otherwise [`MAX_YEARS_DIFF`]
    /// years after `from` (and never past 2099).
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use croncalc::{Cron, Dialect};
    ///
    /// let leap_day = Cron::parse("0 0 0 29 2 *", &Dialect::quartz()).unwrap();
    /// let from = NaiveDate::from_ymd_opt(2008, 2, 29).unwrap().and_hms_opt(0, 0, 0).unwrap();
    ///
    /// let next = leap_day.find_next_occurrence(&from).unwrap();
    /// assert_eq!(next.to_string(), "2012-02-29 00:00:00");
    /// ```
    pub fn find_next_occurrence(&self, from: &NaiveDateTime) -> Option<NaiveDateTime> {
        let limit = self.year_limit(from.year());
        let mut current_time = from
            .with_nanosecond(0)?
            .checked_add_signed(Duration::seconds(1))?;

        loop {
            if current_time.year() > limit {
                log::debug!(
                    "no occurrence of `{}` after {from} up to year {limit}",
                    self.pattern
                );
                return None;
            }

            let mut updated = false;

            updated |= self.find_next_matching_year(&mut current_time)?;
            if !updated {
                updated |= self.find_next_matching_month(&mut current_time)?;
            }
            if !updated {
                updated |= self.find_next_matching_day(&mut current_time)?;
            }
            if !updated {
                updated |= self.find_next_matching_hour(&mut current_time)?;
            }
            if !updated {
                updated |= self.find_next_matching_minute(&mut current_time)?;
            }
            if !updated {
                updated |= self.find_next_matching_second(&mut current_time)?;
            }

            if updated {
                continue;
            }

            log::trace!("`{}` next after {from} is {current_time}", self.pattern);
            return Some(current_time);
        }
    }

    /// Same search as [`Cron::find_next_occurrence`] on Unix timestamps,
    /// interpreted as UTC. Both return the same instant for the same start.
    ///
    /// ```
    /// use croncalc::Cron;
    ///
    /// let hourly: Cron = "@hourly".parse().unwrap();
    /// // 2012-07-01 09:53:50 UTC
    /// assert_eq!(hourly.find_next_timestamp(1_341_136_430), Some(1_341_136_800));
    /// ```
    pub fn find_next_timestamp(&self, from: i64) -> Option<i64> {
        let from = DateTime::from_timestamp(from, 0)?.naive_utc();
        self.find_next_occurrence(&from)
            .map(|next| next.and_utc().timestamp())
    }

    /// Creates a `CronIterator` over the matching times strictly after
    /// `start_after`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use croncalc::Cron;
    ///
    /// let cron: Cron = "0 0 1 * *".parse().unwrap();
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
    ///
    /// let months: Vec<u32> = cron.iter_after(start).take(3).map(|time| chrono::Datelike::month(&time)).collect();
    /// assert_eq!(months, [2, 3, 4]);
    /// ```
    pub fn iter_after(&self, start_after: NaiveDateTime) -> CronIterator {
        CronIterator::new(self.clone(), start_after)
    }

    // Last year the search may reach before giving up.
    fn year_limit(&self, start_year: i32) -> i32 {
        match self.pattern.component(FieldKind::Year) {
            Some(years) if !years.is_all_set() => {
                years.last_set_bit().map_or(start_year, i32::from)
            }
            // Years before 1970 cannot match, so count from the first one that can.
            Some(_) => (start_year.max(i32::from(YEAR_LOWER_LIMIT)) + MAX_YEARS_DIFF)
                .min(i32::from(YEAR_UPPER_LIMIT)),
            None => start_year + MAX_YEARS_DIFF,
        }
    }

    // Internal functions to check for the next matching year/month/day/hour/minute/second
    // and update the time. Each returns `Some(true)` when the time was moved forward and
    // `None` when no later time can exist.
    fn find_next_matching_year(&self, current_time: &mut NaiveDateTime) -> Option<bool> {
        if self.pattern.year_match(current_time.year()) {
            return Some(false);
        }
        let year = self.pattern.next_year_match(current_time.year())?;
        *current_time = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        Some(true)
    }

    fn find_next_matching_month(&self, current_time: &mut NaiveDateTime) -> Option<bool> {
        if self.pattern.month_match(current_time.month()) {
            return Some(false);
        }
        increment_time_component(current_time, TimeComponent::Month)?;
        Some(true)
    }

    fn find_next_matching_day(&self, current_time: &mut NaiveDateTime) -> Option<bool> {
        if self.pattern.day_match(current_time.date()) {
            return Some(false);
        }
        increment_time_component(current_time, TimeComponent::Day)?;
        Some(true)
    }

    fn find_next_matching_hour(&self, current_time: &mut NaiveDateTime) -> Option<bool> {
        match self.pattern.next_hour_match(current_time.hour()) {
            Some(next_match) if next_match != current_time.hour() => {
                set_time_component(current_time, TimeComponent::Hour, next_match)?;
                Some(true)
            }
            Some(_) => Some(false),
            None => {
                increment_time_component(current_time, TimeComponent::Day)?;
                Some(true)
            }
        }
    }

    fn find_next_matching_minute(&self, current_time: &mut NaiveDateTime) -> Option<bool> {
        match self.pattern.next_minute_match(current_time.minute()) {
            Some(next_match) if next_match != current_time.minute() => {
                set_time_component(current_time, TimeComponent::Minute, next_match)?;
                Some(true)
            }
            Some(_) => Some(false),
            None => {
                increment_time_component(current_time, TimeComponent::Hour)?;
                Some(true)
            }
        }
    }

    fn find_next_matching_second(&self, current_time: &mut NaiveDateTime) -> Option<bool> {
        match self.pattern.next_second_match(current_time.second()) {
            Some(next_match) if next_match != current_time.second() => {
                set_time_component(current_time, TimeComponent::Second, next_match)?;
                Some(true)
            }
            Some(_) => Some(false),
            None => {
                // No match left in this minute
                increment_time_component(current_time, TimeComponent::Minute)?;
                Some(true)
            }
        }
    }
}

// Parses with the classic dialect.
impl FromStr for Cron {
    type Err = CronError;

    fn from_str(cron_string: &str) -> Result<Cron, CronError> {
        CronParser::default().parse(cron_string)
    }
}

impl std::fmt::Display for Cron {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

// Sets one component to a later value within its parent, resetting every finer
// component to zero.
fn set_time_component(
    current_time: &mut NaiveDateTime,
    component: TimeComponent,
    set_to: u32,
) -> Option<()> {
    let date = current_time.date();
    let (hour, minute) = (current_time.hour(), current_time.minute());

    *current_time = match component {
        TimeComponent::Hour => date.and_hms_opt(set_to, 0, 0)?,
        TimeComponent::Minute => date.and_hms_opt(hour, set_to, 0)?,
        TimeComponent::Second => date.and_hms_opt(hour, minute, set_to)?,
        TimeComponent::Day | TimeComponent::Month => return None,
    };
    Some(())
}

// Moves to the start of the next unit of `component`, carrying into the coarser
// components as the calendar requires.
fn increment_time_component(
    current_time: &mut NaiveDateTime,
    component: TimeComponent,
) -> Option<()> {
    let date = current_time.date();
    let start_of_day = date.and_hms_opt(0, 0, 0)?;

    *current_time = match component {
        TimeComponent::Second => current_time.checked_add_signed(Duration::seconds(1))?,
        TimeComponent::Minute => start_of_day.checked_add_signed(Duration::minutes(
            i64::from(current_time.hour()) * 60 + i64::from(current_time.minute()) + 1,
        ))?,
        TimeComponent::Hour => start_of_day
            .checked_add_signed(Duration::hours(i64::from(current_time.hour()) + 1))?,
        TimeComponent::Day => date.succ_opt()?.and_hms_opt(0, 0, 0)?,
        TimeComponent::Month => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?
        }
    };
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Seconds, Year};

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_is_time_matching() -> Result<(), CronError> {
        let cron = Cron::parse("0 0 12 * * *", &Dialect::quartz())?;
        assert!(cron.is_time_matching(&at(2023, 4, 1, 12, 0, 0)));
        assert!(!cron.is_time_matching(&at(2023, 4, 1, 12, 0, 1)));
        assert!(!cron.is_time_matching(&at(2023, 4, 1, 11, 0, 0)));
        Ok(())
    }

    #[test]
    fn test_is_time_matching_without_seconds() -> Result<(), CronError> {
        let cron: Cron = "*/10 * * * *".parse()?;
        assert!(cron.is_time_matching(&at(2023, 4, 1, 8, 20, 0)));
        assert!(!cron.is_time_matching(&at(2023, 4, 1, 8, 20, 30)));
        Ok(())
    }

    #[test]
    fn test_next_minute() -> Result<(), CronError> {
        let cron: Cron = "* * * * *".parse()?;
        let next = cron.find_next_occurrence(&at(2023, 1, 1, 0, 0, 29));
        assert_eq!(next, Some(at(2023, 1, 1, 0, 1, 0)));
        Ok(())
    }

    #[test]
    fn test_next_is_strictly_after_a_match() -> Result<(), CronError> {
        let cron = Cron::parse("0 0 0 * * *", &Dialect::quartz())?;
        let midnight = at(2023, 3, 5, 0, 0, 0);
        assert!(cron.is_time_matching(&midnight));
        assert_eq!(
            cron.find_next_occurrence(&midnight),
            Some(at(2023, 3, 6, 0, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_sub_second_start_is_truncated() -> Result<(), CronError> {
        let cron = Cron::parse("* * * * * *", &Dialect::quartz())?;
        let from = at(2023, 3, 5, 10, 0, 0)
            .with_nanosecond(999_000_000)
            .unwrap();
        assert_eq!(cron.find_next_occurrence(&from), Some(at(2023, 3, 5, 10, 0, 1)));
        Ok(())
    }

    #[test]
    fn test_next_crosses_year_end() -> Result<(), CronError> {
        let cron: Cron = "30 23 31 12 *".parse()?;
        assert_eq!(
            cron.find_next_occurrence(&at(2023, 12, 31, 23, 30, 0)),
            Some(at(2024, 12, 31, 23, 30, 0))
        );
        Ok(())
    }

    #[test]
    fn test_next_last_day_of_short_months() -> Result<(), CronError> {
        let cron: Cron = "0 0 31 * *".parse()?;
        assert_eq!(
            cron.find_next_occurrence(&at(2023, 4, 1, 0, 0, 0)),
            Some(at(2023, 5, 31, 0, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_impossible_date_gives_up() -> Result<(), CronError> {
        let cron: Cron = "0 0 30 2 *".parse()?;
        assert_eq!(cron.find_next_occurrence(&at(2023, 1, 1, 0, 0, 0)), None);

        let cron: Cron = "0 0 31 4,6,9,11 *".parse()?;
        assert_eq!(cron.find_next_occurrence(&at(2023, 1, 1, 0, 0, 0)), None);
        Ok(())
    }

    #[test]
    fn test_year_field_bounds_search() -> Result<(), CronError> {
        let cron = Cron::parse("0 0 0 1 1 ? 2015", &Dialect::quartz())?;
        assert_eq!(
            cron.find_next_occurrence(&at(2011, 4, 30, 23, 30, 0)),
            Some(at(2015, 1, 1, 0, 0, 0))
        );
        assert_eq!(cron.find_next_occurrence(&at(2015, 1, 1, 0, 0, 0)), None);
        Ok(())
    }

    #[test]
    fn test_wildcard_year_stops_at_upper_limit() -> Result<(), CronError> {
        let cron = Cron::parse("0 0 0 1 1 ?", &Dialect::quartz())?;
        assert_eq!(cron.find_next_occurrence(&at(2099, 6, 1, 0, 0, 0)), None);
        assert_eq!(
            cron.find_next_occurrence(&at(2098, 6, 1, 0, 0, 0)),
            Some(at(2099, 1, 1, 0, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_without_year_field_searches_past_upper_limit() -> Result<(), CronError> {
        let dialect = Dialect::builder().year(Year::Disallowed).build();
        let cron = Cron::parse("0 0 1 1 *", &dialect)?;
        assert_eq!(
            cron.find_next_occurrence(&at(2099, 6, 1, 0, 0, 0)),
            Some(at(2100, 1, 1, 0, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_start_before_first_representable_year() -> Result<(), CronError> {
        let cron: Cron = "* * * * *".parse()?;
        assert_eq!(
            cron.find_next_occurrence(&at(1960, 6, 1, 0, 0, 0)),
            Some(at(1970, 1, 1, 0, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_leap_day_across_century_year() -> Result<(), CronError> {
        let dialect = Dialect::builder().year(Year::Disallowed).build();
        let cron = Cron::parse("0 0 29 2 *", &dialect)?;
        assert_eq!(
            cron.find_next_occurrence(&at(2096, 3, 1, 0, 0, 0)),
            Some(at(2104, 2, 29, 0, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_dom_and_dow_modes() -> Result<(), CronError> {
        let either = Cron::parse("0 0 11 13 * FRI", &Dialect::quartz())?;
        assert_eq!(
            either.find_next_occurrence(&at(2020, 8, 13, 10, 0, 0)),
            Some(at(2020, 8, 13, 11, 0, 0))
        );

        let both_dialect = Dialect::builder()
            .seconds(Seconds::Required)
            .weekdays(dialect::Weekdays::Quartz)
            .no_specific_value(true)
            .dom_and_dow(true)
            .build();
        let both = Cron::parse("0 0 11 13 * FRI", &both_dialect)?;
        assert_eq!(
            both.find_next_occurrence(&at(2020, 8, 13, 10, 0, 0)),
            Some(at(2020, 11, 13, 11, 0, 0))
        );
        Ok(())
    }

    #[test]
    fn test_timestamp_agrees_with_calendar_time() -> Result<(), CronError> {
        let cron = Cron::parse("0 30 23 30 1/3 ?", &Dialect::quartz())?;
        let from = at(2010, 12, 30, 0, 0, 0);
        let expected = cron.find_next_occurrence(&from).unwrap();

        let next = cron.find_next_timestamp(from.and_utc().timestamp());
        assert_eq!(next, Some(expected.and_utc().timestamp()));
        Ok(())
    }

    #[test]
    fn test_timestamp_not_found() -> Result<(), CronError> {
        let cron: Cron = "0 0 30 2 *".parse()?;
        assert_eq!(cron.find_next_timestamp(0), None);
        Ok(())
    }

    #[test]
    fn test_from_str_uses_classic() -> Result<(), CronError> {
        let parsed: Cron = "0 12 * * MON".parse()?;
        assert_eq!(parsed, Cron::parse("0 12 * * 1", &Dialect::classic())?);
        assert!("0 0 12 * * ?".parse::<Cron>().is_err());
        Ok(())
    }

    #[test]
    fn test_canonical() -> Result<(), CronError> {
        let cron = Cron::parse("* * * * * *", &Dialect::quartz())?;
        let expected = [60, 60, 24, 31, 12, 7, 130]
            .iter()
            .map(|&width| "1".repeat(width))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(cron.canonical(), expected);
        Ok(())
    }

    #[test]
    fn test_display_is_original_text() -> Result<(), CronError> {
        let cron: Cron = "@daily".parse()?;
        assert_eq!(cron.to_string(), "@daily");
        Ok(())
    }

    #[test]
    fn test_increment_time_component_carries() {
        let mut time = at(2023, 12, 31, 23, 59, 59);
        increment_time_component(&mut time, TimeComponent::Second).unwrap();
        assert_eq!(time, at(2024, 1, 1, 0, 0, 0));

        let mut time = at(2023, 12, 31, 23, 59, 10);
        increment_time_component(&mut time, TimeComponent::Minute).unwrap();
        assert_eq!(time, at(2024, 1, 1, 0, 0, 0));

        let mut time = at(2024, 2, 28, 23, 10, 10);
        increment_time_component(&mut time, TimeComponent::Hour).unwrap();
        assert_eq!(time, at(2024, 2, 29, 0, 0, 0));

        let mut time = at(2023, 12, 15, 8, 0, 0);
        increment_time_component(&mut time, TimeComponent::Month).unwrap();
        assert_eq!(time, at(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_set_time_component_resets_finer_fields() {
        let mut time = at(2023, 5, 5, 8, 30, 45);
        set_time_component(&mut time, TimeComponent::Hour, 17).unwrap();
        assert_eq!(time, at(2023, 5, 5, 17, 0, 0));

        set_time_component(&mut time, TimeComponent::Second, 9).unwrap();
        assert_eq!(time, at(2023, 5, 5, 17, 0, 9));
    }
}
