use std::cmp::Ordering;
use std::hash::Hasher;

use chrono::{Datelike, NaiveDate};

use crate::component::CronComponent;
use crate::dialect::{Dialect, FieldKind, Weekdays};

// A parsed cron expression: one membership set per field, in dialect order, plus
// the day-field flags derived while parsing. Immutable once built.
#[derive(Debug, Clone)]
pub struct CronPattern {
    pattern: String, // The original pattern
    fields: Vec<CronComponent>,

    dom_restricted: bool,
    dow_restricted: bool,

    // Options copied from the dialect
    dom_and_dow: bool,
    weekdays: Weekdays,
}

impl CronPattern {
    pub(crate) fn new(
        pattern: String,
        fields: Vec<CronComponent>,
        dom_restricted: bool,
        dow_restricted: bool,
        dialect: &Dialect,
    ) -> Self {
        Self {
            pattern,
            fields,
            dom_restricted,
            dow_restricted,
            dom_and_dow: dialect.dom_and_dow(),
            weekdays: dialect.weekdays(),
        }
    }

    /// The membership sets in dialect field order.
    pub fn fields(&self) -> &[CronComponent] {
        &self.fields
    }

    pub fn component(&self, kind: FieldKind) -> Option<&CronComponent> {
        self.fields.iter().find(|component| component.kind == kind)
    }

    /// True when the day-of-month text was neither `*` nor `?`.
    pub fn day_of_month_restricted(&self) -> bool {
        self.dom_restricted
    }

    /// True when the day-of-week text was neither `*` nor `?`.
    pub fn day_of_week_restricted(&self) -> bool {
        self.dow_restricted
    }

    pub fn has_seconds(&self) -> bool {
        self.component(FieldKind::Second).is_some()
    }

    // Checks if a given year matches. Patterns without a year field match every year.
    pub fn year_match(&self, year: i32) -> bool {
        match self.component(FieldKind::Year) {
            Some(years) => u16::try_from(year).is_ok_and(|year| years.is_bit_set(year)),
            None => true,
        }
    }

    // Finds the first matching year at or after `year`.
    pub fn next_year_match(&self, year: i32) -> Option<i32> {
        match self.component(FieldKind::Year) {
            Some(years) => {
                let from = u16::try_from(year.max(0)).ok()?;
                years.next_set_bit(from).map(i32::from)
            }
            None => Some(year),
        }
    }

    pub fn month_match(&self, month: u32) -> bool {
        self.is_member(FieldKind::Month, month)
    }

    /// Checks a calendar date against the day-of-month and day-of-week fields.
    ///
    /// When only one of the two fields is restricted, only that field decides. When
    /// both are restricted, either one matching is enough, unless the dialect asks
    /// for both (`dom_and_dow`).
    pub fn day_match(&self, date: NaiveDate) -> bool {
        let day_matches = self.is_member(FieldKind::DayOfMonth, date.day());
        let dow_matches = self.component(FieldKind::DayOfWeek).is_some_and(|days_of_week| {
            days_of_week.is_bit_set(self.weekdays.value_of(date.weekday()))
        });

        match (self.dom_restricted, self.dow_restricted) {
            (true, true) if self.dom_and_dow => day_matches && dow_matches,
            (true, true) => day_matches || dow_matches,
            (true, false) => day_matches,
            (false, true) => dow_matches,
            (false, false) => true,
        }
    }

    pub fn hour_match(&self, hour: u32) -> bool {
        self.is_member(FieldKind::Hour, hour)
    }

    pub fn minute_match(&self, minute: u32) -> bool {
        self.is_member(FieldKind::Minute, minute)
    }

    // Patterns without a seconds field fire on second 0.
    pub fn second_match(&self, second: u32) -> bool {
        if self.has_seconds() {
            self.is_member(FieldKind::Second, second)
        } else {
            second == 0
        }
    }

    pub fn next_hour_match(&self, hour: u32) -> Option<u32> {
        self.next_member(FieldKind::Hour, hour)
    }

    pub fn next_minute_match(&self, minute: u32) -> Option<u32> {
        self.next_member(FieldKind::Minute, minute)
    }

    pub fn next_second_match(&self, second: u32) -> Option<u32> {
        if self.has_seconds() {
            self.next_member(FieldKind::Second, second)
        } else {
            (second == 0).then_some(0)
        }
    }

    fn is_member(&self, kind: FieldKind, value: u32) -> bool {
        let Ok(value) = u16::try_from(value) else {
            return false;
        };
        self.component(kind)
            .is_some_and(|component| component.is_bit_set(value))
    }

    fn next_member(&self, kind: FieldKind, value: u32) -> Option<u32> {
        let value = u16::try_from(value).ok()?;
        self.component(kind)?.next_set_bit(value).map(u32::from)
    }

    /// Every field rendered as `'1'`/`'0'` characters, fields separated by a space.
    pub fn to_bit_string(&self) -> String {
        self.fields
            .iter()
            .map(CronComponent::to_bit_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    // Get a reference to the original pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl std::fmt::Display for CronPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl PartialEq for CronPattern {
    /// Two patterns are equal when every field's membership set is identical,
    /// regardless of how the original text was written.
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for CronPattern {}

impl PartialOrd for CronPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CronPattern {
    // Lexicographic over the fields, consistent with `PartialEq`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.fields.cmp(&other.fields)
    }
}

impl std::hash::Hash for CronPattern {
    // Only the membership sets, so equal patterns hash equally.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.hash(state);
    }
}
