/// Configuration for occurrence generation
use serde::{Deserialize, Serialize};

/// Generator settings, usually loaded as the `[schedule]` table of the
/// service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Cap applied when a caller doesn't ask for one
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,

    /// Reject sessions whose weekday text contains unknown tokens
    #[serde(default)]
    pub strict_weekdays: bool,

    /// Used for rows without a timezone
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// chrono format string for the date part of an occurrence label
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// chrono format string for the start/end times of an occurrence label
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_max_occurrences() -> usize {
    100
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_date_format() -> String {
    "%A, %B %-d, %Y".to_string()
}

fn default_time_format() -> String {
    "%-I:%M %p".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_occurrences: default_max_occurrences(),
            strict_weekdays: false,
            default_timezone: default_timezone(),
            date_format: default_date_format(),
            time_format: default_time_format(),
        }
    }
}

impl ScheduleConfig {
    /// Same settings with strict weekday checking turned on.
    pub fn strict(mut self) -> Self {
        self.strict_weekdays = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ScheduleConfig = serde_json::from_str(r#"{"max_occurrences": 6}"#).unwrap();
        assert_eq!(config.max_occurrences, 6);
        assert!(!config.strict_weekdays);
        assert_eq!(config.default_timezone, "America/New_York");
        assert_eq!(config.time_format, "%-I:%M %p");
    }
}
