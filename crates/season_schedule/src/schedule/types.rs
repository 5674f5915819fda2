/// Types for session rows and generated occurrences
use super::error::ScheduleError;
use super::weekday::WeekdaySet;
use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A session row as it comes out of storage or over the wire.
///
/// Field names follow the source table's column names; the snake-case forms
/// are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "startdate", alias = "start_date")]
    pub start_date: String,

    #[serde(rename = "enddate", alias = "end_date", default)]
    pub end_date: Option<String>,

    #[serde(rename = "starttime", alias = "start_time")]
    pub start_time: String,

    #[serde(rename = "endtime", alias = "end_time")]
    pub end_time: String,

    #[serde(rename = "daysofweek", alias = "days_of_week", default)]
    pub days_of_week: Option<String>,

    #[serde(default)]
    pub timezone: Option<String>,
}

/// A validated recurring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Raw weekday text; resolved at generation time
    pub days_of_week: String,
    pub timezone: Tz,
}

impl SessionRecord {
    /// Validates the row into a [`Session`].
    ///
    /// # Arguments
    /// * `default_timezone` - Used when the row has no timezone
    ///
    /// # Returns
    /// * `Ok(Session)` - Every field parsed and `end_time` is after `start_time`
    /// * `Err(ScheduleError::MalformedSession)` - Naming the first bad field
    pub fn parse(&self, default_timezone: Tz) -> Result<Session, ScheduleError> {
        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = match non_empty(&self.end_date) {
            Some(raw) => Some(parse_date("end_date", raw)?),
            None => None,
        };
        let start_time = parse_time("start_time", &self.start_time)?;
        let end_time = parse_time("end_time", &self.end_time)?;

        if end_time <= start_time {
            return Err(ScheduleError::malformed(
                "end_time",
                self.end_time.clone(),
                format!("must be later than start_time {}", self.start_time.trim()),
            ));
        }

        let timezone = match non_empty(&self.timezone) {
            Some(raw) => raw.parse::<Tz>().map_err(|_| {
                ScheduleError::malformed("timezone", raw, "not an IANA timezone name")
            })?,
            None => default_timezone,
        };

        Ok(Session {
            start_date,
            end_date,
            start_time,
            end_time,
            days_of_week: non_empty(&self.days_of_week).unwrap_or_default().to_string(),
            timezone,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parses `YYYY-MM-DD`, or the date part of a `YYYY-MM-DDTHH:MM:SS` /
/// `YYYY-MM-DD HH:MM:SS` timestamp.
pub(crate) fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ScheduleError> {
    let trimmed = raw.trim();
    let date_part = match trimmed.char_indices().nth(10) {
        Some((idx, 'T')) | Some((idx, ' ')) => &trimmed[..idx],
        _ => trimmed,
    };

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| ScheduleError::malformed(field, raw, format!("invalid date: {e}")))
}

/// Parses a 24-hour `HH:MM` time, with optional `:SS`.
pub(crate) fn parse_time(field: &'static str, raw: &str) -> Result<NaiveTime, ScheduleError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ScheduleError::malformed(field, raw, "expected 24-hour HH:MM"))
}

/// One concrete meeting of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub start_at: DateTime<Tz>,
    pub end_at: DateTime<Tz>,
    pub formatted_label: String,
}

/// The full result of expanding one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub occurrences: Vec<Occurrence>,
    /// Resolved meeting days, serialized as ISO numbers
    pub weekdays: WeekdaySet,
    /// e.g. "Tuesday & Thursday"
    pub weekdays_label: String,
    pub unrecognized_tokens: Vec<String>,
    /// True when the occurrence cap stopped the walk before the end date
    pub truncated: bool,
}

impl Schedule {
    pub fn empty() -> Self {
        Schedule {
            occurrences: Vec::new(),
            weekdays: WeekdaySet::new(),
            weekdays_label: String::new(),
            unrecognized_tokens: Vec::new(),
            truncated: false,
        }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.occurrences.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.occurrences.last().map(|o| o.date)
    }
}
