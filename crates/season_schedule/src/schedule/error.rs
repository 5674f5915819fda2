//! Error types for schedule generation.

use thiserror::Error;

/// Errors that can occur while turning a session row into occurrences.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A required field could not be parsed, or the parsed values are inconsistent
    #[error("Malformed session {field} ({value:?}): {message}")]
    MalformedSession {
        field: &'static str,
        value: String,
        message: String,
    },

    /// Strict mode only: the weekday text contained tokens outside the vocabulary
    #[error("Unrecognized weekday tokens: {}", tokens.join(", "))]
    UnrecognizedWeekdays { tokens: Vec<String> },
}

impl ScheduleError {
    pub(crate) fn malformed(
        field: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ScheduleError::MalformedSession {
            field,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error reflects bad data in the session row itself.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ScheduleError::MalformedSession { .. })
    }

    /// Returns the name of the offending field, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ScheduleError::MalformedSession { field, .. } => Some(field),
            ScheduleError::UnrecognizedWeekdays { .. } => Some("days_of_week"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ScheduleError::malformed("start_time", "25:00", "invalid time of day");
        assert_eq!(
            err.to_string(),
            "Malformed session start_time (\"25:00\"): invalid time of day"
        );
        assert!(err.is_malformed());

        let err = ScheduleError::UnrecognizedWeekdays {
            tokens: vec!["Tusday".to_string(), "frid".to_string()],
        };
        assert_eq!(err.to_string(), "Unrecognized weekday tokens: Tusday, frid");
        assert!(!err.is_malformed());
        assert_eq!(err.field(), Some("days_of_week"));
    }
}
