use strum::EnumIs;
use thiserror::Error;

use crate::dialect::FieldKind;

/// Represents errors that can occur while parsing cron expressions.
///
/// Every variant is raised at parse time. Searching for the next occurrence of a
/// successfully parsed expression never fails; running out of search horizon is
/// reported as `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, EnumIs)]
pub enum CronError {
    /// The expression was empty or contained only whitespace.
    #[error("cron expression cannot be an empty string")]
    EmptyPattern,

    /// The number of whitespace separated fields does not fit the dialect.
    #[error("expected between {min} and {max} fields, found {found}")]
    InvalidFieldCount {
        found: usize,
        min: usize,
        max: usize,
    },

    /// A list, range or step item is malformed, e.g. `0,,1`, `*/`, `1-2-3` or `0/0`.
    #[error("invalid {field} field: {reason} in `{token}`")]
    InvalidToken {
        field: FieldKind,
        token: String,
        reason: &'static str,
    },

    /// A value resolved to a number outside the legal range of its field.
    #[error("{field} value {value} is out of range {min}-{max}")]
    ValueOutOfRange {
        field: FieldKind,
        value: u32,
        min: u16,
        max: u16,
    },

    /// An alphabetic token that is not a month or weekday name for this field.
    #[error("unknown {field} name `{token}`")]
    UnknownAlias { field: FieldKind, token: String },
}

impl CronError {
    pub(crate) fn token(field: FieldKind, token: &str, reason: &'static str) -> Self {
        CronError::InvalidToken {
            field,
            token: token.to_string(),
            reason,
        }
    }

    /// The field the error was found in, if the error concerns a single field.
    pub fn field(&self) -> Option<FieldKind> {
        match self {
            CronError::InvalidToken { field, .. }
            | CronError::ValueOutOfRange { field, .. }
            | CronError::UnknownAlias { field, .. } => Some(*field),
            CronError::EmptyPattern | CronError::InvalidFieldCount { .. } => None,
        }
    }
}
