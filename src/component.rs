use crate::dialect::{Dialect, FieldKind};
use crate::errors::CronError;

// Enough 64-bit words for the widest field, the 130 years of 1970-2099.
const WORDS: usize = 3;

/// Membership set of one cron field.
///
/// A fixed-size bit vector indexed by offset from the field's minimum value. Bits
/// outside `min..=max` are never set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CronComponent {
    pub kind: FieldKind,
    pub min: u16,
    pub max: u16,
    bits: [u64; WORDS],
}

impl CronComponent {
    // Initialize an empty component for the given kind and inclusive bounds.
    pub fn new(kind: FieldKind, min: u16, max: u16) -> Self {
        debug_assert!(min <= max && usize::from(max - min) < WORDS * 64);
        Self {
            kind,
            min,
            max,
            bits: [0; WORDS],
        }
    }

    fn index(&self, pos: u16) -> (usize, u64) {
        let offset = usize::from(pos - self.min);
        (offset / 64, 1 << (offset % 64))
    }

    fn out_of_range(&self, pos: u16) -> CronError {
        CronError::ValueOutOfRange {
            field: self.kind,
            value: u32::from(pos),
            min: self.min,
            max: self.max,
        }
    }

    pub fn set_bit(&mut self, pos: u16) -> Result<(), CronError> {
        if pos < self.min || pos > self.max {
            return Err(self.out_of_range(pos));
        }
        let (word, mask) = self.index(pos);
        self.bits[word] |= mask;
        Ok(())
    }

    pub fn unset_bit(&mut self, pos: u16) -> Result<(), CronError> {
        if pos < self.min || pos > self.max {
            return Err(self.out_of_range(pos));
        }
        let (word, mask) = self.index(pos);
        self.bits[word] &= !mask;
        Ok(())
    }

    /// Whether `pos` is a member. Values outside the bounds are never members.
    pub fn is_bit_set(&self, pos: u16) -> bool {
        if pos < self.min || pos > self.max {
            return false;
        }
        let (word, mask) = self.index(pos);
        self.bits[word] & mask != 0
    }

    pub fn set_all(&mut self) {
        for pos in self.min..=self.max {
            let (word, mask) = self.index(pos);
            self.bits[word] |= mask;
        }
    }

    pub fn is_all_set(&self) -> bool {
        (self.min..=self.max).all(|pos| self.is_bit_set(pos))
    }

    /// Smallest member greater than or equal to `from`.
    pub fn next_set_bit(&self, from: u16) -> Option<u16> {
        (from.max(self.min)..=self.max).find(|&pos| self.is_bit_set(pos))
    }

    pub fn first_set_bit(&self) -> Option<u16> {
        self.next_set_bit(self.min)
    }

    pub fn last_set_bit(&self) -> Option<u16> {
        (self.min..=self.max).rev().find(|&pos| self.is_bit_set(pos))
    }

    /// All members in ascending order.
    pub fn set_values(&self) -> Vec<u16> {
        (self.min..=self.max)
            .filter(|&pos| self.is_bit_set(pos))
            .collect()
    }

    /// One `'1'`/`'0'` character per representable value, ascending.
    pub fn to_bit_string(&self) -> String {
        (self.min..=self.max)
            .map(|pos| if self.is_bit_set(pos) { '1' } else { '0' })
            .collect()
    }

    /// Parses one field's text and ORs the resulting values into the set.
    pub fn parse(&mut self, field: &str, dialect: &Dialect) -> Result<(), CronError> {
        if field == "?" {
            if !(self.kind.is_day_field() && dialect.allows_no_specific_value()) {
                return Err(CronError::token(
                    self.kind,
                    field,
                    "no-specific-value marker is not allowed here",
                ));
            }
            self.set_all();
            return Ok(());
        }

        for part in field.split(',') {
            if part.is_empty() {
                return Err(CronError::token(self.kind, field, "empty list item"));
            }
            if part.contains('/') {
                self.handle_stepping(part, dialect)?;
            } else if part.contains('-') {
                self.handle_range(part, dialect)?;
            } else if part == "*" {
                self.set_all();
            } else {
                self.handle_number(part, dialect)?;
            }
        }

        Ok(())
    }

    fn handle_range(&mut self, range: &str, dialect: &Dialect) -> Result<(), CronError> {
        let (start, end) = self.parse_range(range, range, dialect)?;
        for value in start..=end {
            self.set_bit(value)?;
        }
        Ok(())
    }

    fn handle_number(&mut self, value: &str, dialect: &Dialect) -> Result<(), CronError> {
        let num = self.parse_value(value, value, false, dialect)?;
        self.set_bit(num)
    }

    fn handle_stepping(&mut self, stepped_range: &str, dialect: &Dialect) -> Result<(), CronError> {
        let Some((range_part, step_str)) = stepped_range.split_once('/') else {
            return Err(CronError::token(self.kind, stepped_range, "missing step"));
        };
        if step_str.contains('/') {
            return Err(CronError::token(
                self.kind,
                stepped_range,
                "more than one step",
            ));
        }
        if range_part.is_empty() {
            return Err(CronError::token(
                self.kind,
                stepped_range,
                "step without a base",
            ));
        }
        let step = self.parse_step(step_str, stepped_range)?;

        let (start, end) = if range_part == "*" {
            (self.min, self.max)
        } else if range_part.contains('-') {
            self.parse_range(range_part, stepped_range, dialect)?
        } else {
            // A single base value steps up to the field maximum.
            (self.parse_value(range_part, stepped_range, false, dialect)?, self.max)
        };

        for value in (start..=end).step_by(usize::from(step)) {
            self.set_bit(value)?;
        }
        Ok(())
    }

    fn parse_step(&self, step: &str, item: &str) -> Result<u16, CronError> {
        if step.is_empty() {
            return Err(CronError::token(self.kind, item, "missing step value"));
        }
        if !step.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CronError::token(
                self.kind,
                item,
                "step must be a positive integer",
            ));
        }
        match step.parse::<u16>() {
            Ok(step) if step > 0 => Ok(step),
            _ => Err(CronError::token(
                self.kind,
                item,
                "step must be a positive integer",
            )),
        }
    }

    fn parse_range(&self, range: &str, item: &str, dialect: &Dialect) -> Result<(u16, u16), CronError> {
        let bounds: Vec<&str> = range.split('-').collect();
        if bounds.len() != 2 {
            return Err(CronError::token(
                self.kind,
                item,
                "range must have exactly two bounds",
            ));
        }

        let start = self.parse_value(bounds[0], item, false, dialect)?;
        let mut end = self.parse_value(bounds[1], item, true, dialect)?;

        // `SUN-SUN` is Sunday alone, not the whole week.
        if self.kind == FieldKind::DayOfWeek && start == 0 && end == 7 && is_alias(bounds[1]) {
            end = 0;
        }

        if start > end {
            return Err(CronError::token(
                self.kind,
                item,
                "range start is greater than range end",
            ));
        }
        Ok((start, end))
    }

    // Resolves a single number or name alias and checks it against the bounds.
    // Token errors name the whole list `item` the value was read from.
    fn parse_value(
        &self,
        token: &str,
        item: &str,
        range_end: bool,
        dialect: &Dialect,
    ) -> Result<u16, CronError> {
        if token.is_empty() {
            return Err(CronError::token(self.kind, item, "missing value"));
        }

        if token.bytes().all(|b| b.is_ascii_digit()) {
            let Ok(value) = token.parse::<u32>() else {
                return Err(CronError::token(self.kind, item, "value too large"));
            };
            if value < u32::from(self.min) || value > u32::from(self.max) {
                return Err(CronError::ValueOutOfRange {
                    field: self.kind,
                    value,
                    min: self.min,
                    max: self.max,
                });
            }
            return Ok(value as u16);
        }

        if is_alias(token) {
            return dialect
                .alias(self.kind, token, range_end)
                .ok_or_else(|| CronError::UnknownAlias {
                    field: self.kind,
                    token: token.to_string(),
                });
        }

        Err(CronError::token(self.kind, item, "invalid value"))
    }
}

fn is_alias(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphabetic())
}
