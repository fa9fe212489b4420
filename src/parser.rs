//! Parser for cron patterns.
//!
//! Invoking
//!
//! ```rust
//! # use std::str::FromStr as _;
//! #
//! # use croncalc::Cron;
//! #
//! Cron::from_str("*/5 * * * *");
//! ```
//!
//! is equivalent to
//!
//! ```rust
//! # use croncalc::{dialect::Dialect, parser::CronParser};
//! #
//! CronParser::new(Dialect::classic()).parse("*/5 * * * *");
//! ```
//!
//! A parser is bound to one [`Dialect`]. For example, to parse Quartz patterns
//! that lead with a seconds field and use `?`:
//!
//! ```rust
//! use croncalc::{dialect::Dialect, parser::CronParser};
//!
//! let parser = CronParser::new(Dialect::quartz());
//!
//! let weekday_mornings = parser.parse("0 0 7 ? * MON-FRI").unwrap();
//! let new_year_2015 = parser.parse("0 0 0 1 1 ? 2015").unwrap();
//! assert!(parser.parse("0 7 * * *").is_err());
//! ```

use crate::{
    component::CronComponent,
    dialect::{Dialect, FieldKind},
    errors::CronError,
    pattern::CronPattern,
    Cron,
};

/// Parser for cron patterns of one dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CronParser {
    dialect: Dialect,
}

impl CronParser {
    /// Create a parser for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Parses the cron pattern string.
    pub fn parse(&self, pattern: &str) -> Result<Cron, CronError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(CronError::EmptyPattern);
        }

        // Handle @nicknames
        let expanded = self.dialect.expand_nickname(pattern);
        if let Some(expanded) = &expanded {
            log::debug!("expanded nickname {pattern} to `{expanded}`");
        }
        let text = expanded.as_deref().unwrap_or(pattern);

        let parts: Vec<&str> = text.split_whitespace().collect();
        let layout = self.dialect.layout(parts.len())?;
        log::debug!("parsing `{text}` with layout {layout:?}");

        let mut fields = Vec::with_capacity(7);
        let mut dom_restricted = false;
        let mut dow_restricted = false;
        for (&part, &kind) in parts.iter().zip(&layout) {
            let restricted = part != "*" && part != "?";
            match kind {
                FieldKind::DayOfMonth => dom_restricted = restricted,
                FieldKind::DayOfWeek => dow_restricted = restricted,
                _ => {}
            }
            fields.push(self.parse_field(kind, part)?);
        }

        // An omitted optional year is a wildcard.
        if !self.dialect.year().is_disallowed() && !layout.contains(&FieldKind::Year) {
            fields.push(self.parse_field(FieldKind::Year, "*")?);
        }

        Ok(Cron {
            pattern: CronPattern::new(
                pattern.to_string(),
                fields,
                dom_restricted,
                dow_restricted,
                &self.dialect,
            ),
        })
    }

    fn parse_field(&self, kind: FieldKind, text: &str) -> Result<CronComponent, CronError> {
        let (min, max) = self.dialect.bounds(kind);
        let mut component = CronComponent::new(kind, min, max);
        component.parse(text, &self.dialect)?;

        // Sunday written as 7 is the same day as 0.
        if kind == FieldKind::DayOfWeek && self.dialect.weekdays().is_posix() && component.is_bit_set(7) {
            component.unset_bit(7)?;
            component.set_bit(0)?;
        }
        Ok(component)
    }
}
