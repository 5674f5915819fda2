//! Season schedule expansion.
//!
//! Turns a recurring session (date range, daily time window, free-text
//! weekday list, IANA timezone) into the concrete occurrences listed in the
//! "Season Schedule" section of registration and reminder emails.

mod config;
mod error;
mod types;
mod weekday;

pub use config::ScheduleConfig;
pub use error::ScheduleError;
pub use types::{Occurrence, Schedule, Session, SessionRecord};
pub use weekday::{lookup_weekday, resolve_weekdays, weekday_name, WeekdayResolution, WeekdaySet};

use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone,
};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Expands a session into at most `max_occurrences` occurrences using the
/// default (permissive) generator.
///
/// # Arguments
/// * `session` - The validated session
/// * `max_occurrences` - Upper bound on the number of occurrences returned
///
/// # Returns
/// * `Ok(Vec<Occurrence>)` - Ascending by date; empty if `end_date` precedes `start_date`
/// * `Err(ScheduleError)` - If a wall-clock time can't be placed in the session's timezone
pub fn generate_occurrences(
    session: &Session,
    max_occurrences: usize,
) -> Result<Vec<Occurrence>, ScheduleError> {
    let generator = OccurrenceGenerator {
        config: ScheduleConfig {
            max_occurrences,
            ..ScheduleConfig::default()
        },
        ..OccurrenceGenerator::default()
    };
    generator
        .generate(session, None)
        .map(|schedule| schedule.occurrences)
}

/// Occurrence generator bound to a [`ScheduleConfig`].
#[derive(Debug, Clone)]
pub struct OccurrenceGenerator {
    config: ScheduleConfig,
    default_timezone: Tz,
}

impl Default for OccurrenceGenerator {
    fn default() -> Self {
        Self {
            config: ScheduleConfig::default(),
            default_timezone: Tz::America__New_York,
        }
    }
}

impl OccurrenceGenerator {
    /// Creates a generator, validating the configured timezone and label
    /// formats up front.
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        let default_timezone = config.default_timezone.parse::<Tz>().map_err(|_| {
            ScheduleError::malformed(
                "default_timezone",
                config.default_timezone.clone(),
                "not an IANA timezone name",
            )
        })?;

        for (field, format) in [
            ("date_format", &config.date_format),
            ("time_format", &config.time_format),
        ] {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(ScheduleError::malformed(
                    field,
                    format.clone(),
                    "invalid strftime format",
                ));
            }
        }

        Ok(Self {
            config,
            default_timezone,
        })
    }

    /// Validates a raw row and expands it.
    pub fn generate_record(
        &self,
        record: &SessionRecord,
        max_occurrences: Option<usize>,
    ) -> Result<Schedule, ScheduleError> {
        let session = record.parse(self.default_timezone)?;
        self.generate(&session, max_occurrences)
    }

    /// Expands a session into its schedule.
    ///
    /// With no resolvable weekdays, or no end date, the session is a single
    /// occurrence on its start date. Otherwise every matching day from the
    /// start date to the end date (inclusive) is emitted until the cap is hit.
    /// A date the timezone skips entirely has no occurrence.
    ///
    /// # Arguments
    /// * `session` - The validated session
    /// * `max_occurrences` - Lowers the configured cap when given; never raises it
    ///
    /// # Returns
    /// * `Ok(Schedule)` - Occurrences ascending by date
    /// * `Err(ScheduleError::UnrecognizedWeekdays)` - Strict mode and unknown tokens
    /// * `Err(ScheduleError::MalformedSession)` - A time can't be placed in the timezone
    pub fn generate(
        &self,
        session: &Session,
        max_occurrences: Option<usize>,
    ) -> Result<Schedule, ScheduleError> {
        let cap = max_occurrences.map_or(self.config.max_occurrences, |requested| {
            requested.min(self.config.max_occurrences)
        });
        let resolution = resolve_weekdays(&session.days_of_week);

        if !resolution.is_clean() {
            if self.config.strict_weekdays {
                return Err(ScheduleError::UnrecognizedWeekdays {
                    tokens: resolution.unrecognized,
                });
            }
            warn!(
                days_of_week = %session.days_of_week,
                unrecognized = ?resolution.unrecognized,
                "Ignoring unrecognized weekday tokens"
            );
        }

        let mut schedule = Schedule {
            weekdays: resolution.days,
            weekdays_label: resolution.days.describe(),
            unrecognized_tokens: resolution.unrecognized,
            ..Schedule::empty()
        };

        if let Some(end_date) = session.end_date {
            if end_date < session.start_date {
                warn!(
                    start_date = %session.start_date,
                    end_date = %end_date,
                    "Session ends before it starts, no occurrences generated"
                );
                return Ok(schedule);
            }
        }

        let end_date = match session.end_date {
            Some(end_date) if !resolution.days.is_empty() => end_date,
            _ => {
                if cap > 0 {
                    if let Some(occurrence) = self.build_occurrence(session, session.start_date)? {
                        schedule.occurrences.push(occurrence);
                    }
                } else {
                    schedule.truncated = true;
                }
                return Ok(schedule);
            }
        };

        let mut date = session.start_date;
        while date <= end_date {
            if resolution.days.contains(date.weekday()) {
                if schedule.occurrences.len() >= cap {
                    schedule.truncated = true;
                    break;
                }
                if let Some(occurrence) = self.build_occurrence(session, date)? {
                    schedule.occurrences.push(occurrence);
                }
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        debug!(
            start_date = %session.start_date,
            end_date = %end_date,
            weekdays = %schedule.weekdays_label,
            count = schedule.occurrences.len(),
            truncated = schedule.truncated,
            "Generated season schedule"
        );

        Ok(schedule)
    }

    /// Places one occurrence on `date`. Returns `None` when the start time,
    /// once placed in the timezone, lands on another civil date.
    fn build_occurrence(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<Option<Occurrence>, ScheduleError> {
        let tz = session.timezone;
        let start_at = localize(tz, date.and_time(session.start_time))
            .ok_or_else(|| unplaceable("start_time", date, session.start_time, tz))?;
        if start_at.date_naive() != date {
            warn!(
                date = %date,
                timezone = %tz,
                "Start time does not fall on this date in the timezone, skipping it"
            );
            return Ok(None);
        }
        let end_at = localize(tz, date.and_time(session.end_time))
            .ok_or_else(|| unplaceable("end_time", date, session.end_time, tz))?;

        if end_at <= start_at {
            return Err(ScheduleError::malformed(
                "end_time",
                session.end_time.format("%H:%M").to_string(),
                format!("not after start_time on {date} in {tz} once DST is applied"),
            ));
        }

        let formatted_label = format!(
            "{}, {} - {} {}",
            start_at.format(&self.config.date_format),
            start_at.format(&self.config.time_format),
            end_at.format(&self.config.time_format),
            end_at.format("%Z"),
        );

        Ok(Some(Occurrence {
            date,
            start_at,
            end_at,
            formatted_label,
        }))
    }
}

fn unplaceable(
    field: &'static str,
    date: NaiveDate,
    time: chrono::NaiveTime,
    tz: Tz,
) -> ScheduleError {
    ScheduleError::malformed(
        field,
        time.format("%H:%M").to_string(),
        format!("cannot be placed on {date} in {tz}"),
    )
}

/// Pins a wall-clock time to an instant in `tz`.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times
/// inside a spring-forward gap are read with the offset in effect before the
/// gap, which lands them just after it (02:30 becomes 03:30).
fn localize(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let before_gap = tz
                .offset_from_local_datetime(&(local - TimeDelta::days(1)))
                .earliest()?;
            let offset_secs = i64::from(before_gap.fix().local_minus_utc());
            let utc = local - TimeDelta::seconds(offset_secs);
            Some(tz.from_utc_datetime(&utc))
        }
    }
}
