//! Cron dialects.
//!
//! A [`Dialect`] is a plain configuration value describing which cron grammar is
//! accepted: whether a seconds field and a year field may (or must) be present,
//! how days of the week are numbered, and whether the Quartz `?` marker is legal.
//! The parser is a single implementation parameterised by this value, so adding
//! a dialect is a data change.
//!
//! ```rust
//! use croncalc::dialect::{Dialect, Seconds, Weekdays, Year};
//!
//! // Quartz-style numbering, but five-field patterns without seconds.
//! let dialect = Dialect::builder()
//!     .seconds(Seconds::Disallowed)
//!     .year(Year::Disallowed)
//!     .weekdays(Weekdays::Quartz)
//!     .build();
//!
//! assert_eq!(dialect.field_count_range(), (5, 5));
//! ```

use chrono::Weekday;
use derive_builder::Builder;
use strum::{Display, EnumIs, EnumIter};

use crate::errors::CronError;

/// First year representable by the year field.
pub const YEAR_LOWER_LIMIT: u16 = 1970;
/// Last year representable by the year field.
pub const YEAR_UPPER_LIMIT: u16 = 2099;

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "SUNDAY",
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
];

/// The role of one positional field in a cron expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum FieldKind {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
    Year,
}

impl FieldKind {
    /// True for the two fields combined by the day-of-month/day-of-week rule.
    pub fn is_day_field(&self) -> bool {
        matches!(self, FieldKind::DayOfMonth | FieldKind::DayOfWeek)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Seconds {
    #[default]
    Optional,
    Required,
    Disallowed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Year {
    #[default]
    Optional,
    Required,
    Disallowed,
}

/// Day-of-week numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Weekdays {
    /// `0-7`, Sunday is both 0 and 7.
    #[default]
    Posix,
    /// `1-7`, Sunday is 1 and Saturday is 7.
    Quartz,
}

impl Weekdays {
    /// Numeric value of `weekday` under this numbering.
    pub fn value_of(&self, weekday: Weekday) -> u16 {
        match self {
            Weekdays::Posix => weekday.num_days_from_sunday() as u16,
            Weekdays::Quartz => weekday.number_from_sunday() as u16,
        }
    }

    fn sunday(&self) -> u16 {
        match self {
            Weekdays::Posix => 0,
            Weekdays::Quartz => 1,
        }
    }
}

/// Describes a cron dialect.
///
/// Use [`Dialect::classic`] for Vixie-style `minute hour dom month dow [year]`
/// patterns, [`Dialect::quartz`] for `second minute hour dom month dow [year]`
/// patterns with `?`, or [`Dialect::builder`] for anything in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Builder)]
#[builder(build_fn(skip), pattern = "owned")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dialect {
    /// Configure how seconds should be handled.
    seconds: Seconds,
    /// Configure how years should be handled.
    year: Year,
    /// Day-of-week numbering and name aliases.
    weekdays: Weekdays,
    /// Accept `?` in the day-of-month and day-of-week fields.
    no_specific_value: bool,
    /// Require both day fields to match when both are restricted, instead of either.
    dom_and_dow: bool,
}

impl Dialect {
    /// Classic cron: five fields, optional trailing year, Sunday is 0 or 7.
    pub const fn classic() -> Self {
        Self {
            seconds: Seconds::Disallowed,
            year: Year::Optional,
            weekdays: Weekdays::Posix,
            no_specific_value: false,
            dom_and_dow: false,
        }
    }

    /// Quartz-style cron: six fields starting with seconds, optional trailing
    /// year, Sunday is 1, `?` allowed in the day fields.
    pub const fn quartz() -> Self {
        Self {
            seconds: Seconds::Required,
            year: Year::Optional,
            weekdays: Weekdays::Quartz,
            no_specific_value: true,
            dom_and_dow: false,
        }
    }

    /// Construct a builder for a custom dialect, starting from [`Dialect::classic`].
    pub fn builder() -> DialectBuilder {
        DialectBuilder::default()
    }

    pub fn seconds(&self) -> Seconds {
        self.seconds
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn weekdays(&self) -> Weekdays {
        self.weekdays
    }

    pub fn allows_no_specific_value(&self) -> bool {
        self.no_specific_value
    }

    pub fn dom_and_dow(&self) -> bool {
        self.dom_and_dow
    }

    /// Smallest and largest number of whitespace separated fields accepted.
    pub fn field_count_range(&self) -> (usize, usize) {
        let mut min = 5;
        let mut max = 5;
        if self.seconds.is_required() {
            min += 1;
        }
        if !self.seconds.is_disallowed() {
            max += 1;
        }
        if self.year.is_required() {
            min += 1;
        }
        if !self.year.is_disallowed() {
            max += 1;
        }
        (min, max)
    }

    /// Field kinds, in textual order, for a pattern made of `count` fields.
    ///
    /// With optional seconds a six-field pattern is read as starting with seconds.
    pub fn layout(&self, count: usize) -> Result<Vec<FieldKind>, CronError> {
        let (min, max) = self.field_count_range();
        if count < min || count > max {
            return Err(CronError::InvalidFieldCount {
                found: count,
                min,
                max,
            });
        }

        let extra = count - 5;
        let with_seconds = match self.seconds {
            Seconds::Required => true,
            Seconds::Disallowed => false,
            Seconds::Optional if self.year.is_required() => extra == 2,
            Seconds::Optional => extra >= 1,
        };
        let with_year = extra - usize::from(with_seconds) == 1;

        let mut kinds = Vec::with_capacity(count);
        if with_seconds {
            kinds.push(FieldKind::Second);
        }
        kinds.extend([
            FieldKind::Minute,
            FieldKind::Hour,
            FieldKind::DayOfMonth,
            FieldKind::Month,
            FieldKind::DayOfWeek,
        ]);
        if with_year {
            kinds.push(FieldKind::Year);
        }
        Ok(kinds)
    }

    /// Inclusive bounds of a field kind.
    pub fn bounds(&self, kind: FieldKind) -> (u16, u16) {
        match kind {
            FieldKind::Second | FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::DayOfMonth => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::DayOfWeek => match self.weekdays {
                Weekdays::Posix => (0, 7),
                Weekdays::Quartz => (1, 7),
            },
            FieldKind::Year => (YEAR_LOWER_LIMIT, YEAR_UPPER_LIMIT),
        }
    }

    /// Resolves a month or weekday name, case-insensitively.
    ///
    /// Both the three-letter abbreviation and the full English name are accepted.
    /// In Posix numbering a Sunday at the end of a range resolves to 7, so
    /// `FRI-SUN` reads as `5-7`.
    pub fn alias(&self, kind: FieldKind, token: &str, range_end: bool) -> Option<u16> {
        match kind {
            FieldKind::Month => lookup_name(&MONTH_NAMES, token).map(|index| index as u16 + 1),
            FieldKind::DayOfWeek => {
                let index = lookup_name(&WEEKDAY_NAMES, token)? as u16;
                if index == 0 && range_end && self.weekdays.is_posix() {
                    Some(7)
                } else {
                    Some(index + self.weekdays.sunday())
                }
            }
            _ => None,
        }
    }

    /// Expands `@yearly` style nicknames into a pattern of this dialect.
    pub fn expand_nickname(&self, pattern: &str) -> Option<String> {
        let base = match pattern.to_ascii_lowercase().as_str() {
            "@yearly" | "@annually" => "0 0 1 1 *",
            "@monthly" => "0 0 1 * *",
            "@weekly" => "0 0 * * SUN",
            "@daily" | "@midnight" => "0 0 * * *",
            "@hourly" => "0 * * * *",
            _ => return None,
        };

        let mut expanded = String::new();
        if self.seconds.is_required() {
            expanded.push_str("0 ");
        }
        expanded.push_str(base);
        if self.year.is_required() {
            expanded.push_str(" *");
        }
        Some(expanded)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::classic()
    }
}

impl DialectBuilder {
    pub fn build(self) -> Dialect {
        let DialectBuilder {
            seconds,
            year,
            weekdays,
            no_specific_value,
            dom_and_dow,
        } = self;
        let classic = Dialect::classic();
        Dialect {
            seconds: seconds.unwrap_or(classic.seconds),
            year: year.unwrap_or(classic.year),
            weekdays: weekdays.unwrap_or(classic.weekdays),
            no_specific_value: no_specific_value.unwrap_or(classic.no_specific_value),
            dom_and_dow: dom_and_dow.unwrap_or(classic.dom_and_dow),
        }
    }
}

fn lookup_name(names: &[&str], token: &str) -> Option<usize> {
    names.iter().position(|name| {
        token.eq_ignore_ascii_case(name)
            || (token.len() == 3 && name[..3].eq_ignore_ascii_case(token))
    })
}
