//! Free-text weekday parsing.
//!
//! Session rows carry their meeting days as whatever the admin typed into the
//! `daysofweek` column ("Tuesday, Thursday", "M/W/F", "tues thurs", "lunes |
//! miércoles"). This module owns the single lookup table used to normalize
//! that text into ISO weekdays.

use chrono::Weekday;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Every recognized token, lower-case, with the weekday it names.
const WEEKDAY_TOKENS: &[(&str, Weekday)] = &[
    // Monday
    ("monday", Weekday::Mon),
    ("mondays", Weekday::Mon),
    ("mon", Weekday::Mon),
    ("m", Weekday::Mon),
    ("lunes", Weekday::Mon),
    // Tuesday
    ("tuesday", Weekday::Tue),
    ("tuesdays", Weekday::Tue),
    ("tue", Weekday::Tue),
    ("tues", Weekday::Tue),
    ("t", Weekday::Tue),
    ("martes", Weekday::Tue),
    // Wednesday
    ("wednesday", Weekday::Wed),
    ("wednesdays", Weekday::Wed),
    ("wed", Weekday::Wed),
    ("w", Weekday::Wed),
    ("miercoles", Weekday::Wed),
    ("miércoles", Weekday::Wed),
    // Thursday
    ("thursday", Weekday::Thu),
    ("thursdays", Weekday::Thu),
    ("thu", Weekday::Thu),
    ("thur", Weekday::Thu),
    ("thurs", Weekday::Thu),
    ("r", Weekday::Thu),
    ("jueves", Weekday::Thu),
    // Friday
    ("friday", Weekday::Fri),
    ("fridays", Weekday::Fri),
    ("fri", Weekday::Fri),
    ("f", Weekday::Fri),
    ("viernes", Weekday::Fri),
    // Saturday
    ("saturday", Weekday::Sat),
    ("saturdays", Weekday::Sat),
    ("sat", Weekday::Sat),
    ("s", Weekday::Sat),
    ("sabado", Weekday::Sat),
    ("sábado", Weekday::Sat),
    // Sunday
    ("sunday", Weekday::Sun),
    ("sundays", Weekday::Sun),
    ("sun", Weekday::Sun),
    ("u", Weekday::Sun),
    ("domingo", Weekday::Sun),
];

const FULL_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

static WEEKDAY_LOOKUP: LazyLock<HashMap<&'static str, Weekday>> =
    LazyLock::new(|| WEEKDAY_TOKENS.iter().copied().collect());
static TOKEN_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;|/\s]+").unwrap());

/// Looks up a single token. Matching is case-insensitive and ignores
/// surrounding periods ("Tues." is accepted).
pub fn lookup_weekday(token: &str) -> Option<Weekday> {
    let normalized = token.trim().trim_matches('.').to_lowercase();
    WEEKDAY_LOOKUP.get(normalized.as_str()).copied()
}

/// Returns the English name of a weekday ("Tuesday").
pub fn weekday_name(day: Weekday) -> &'static str {
    FULL_NAMES[day.num_days_from_monday() as usize]
}

/// A set of weekdays, stored as one bit per ISO weekday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new() -> Self {
        Self(0)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> {
        let set = *self;
        let mut day = Weekday::Mon;
        (0..7)
            .map(move |_| {
                let current = day;
                day = day.succ();
                current
            })
            .filter(move |d| set.contains(*d))
    }

    /// ISO weekday numbers (1 = Monday .. 7 = Sunday), ascending.
    pub fn iso_numbers(&self) -> Vec<u32> {
        self.iter().map(|d| d.number_from_monday()).collect()
    }

    /// Human-readable list, e.g. "Monday, Wednesday & Friday".
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.iter().map(weekday_name).collect();
        match names.as_slice() {
            [] => String::new(),
            [only] => only.to_string(),
            [init @ .., last] => format!("{} & {}", init.join(", "), last),
        }
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iso_numbers())
    }
}

/// Result of resolving a free-text `daysofweek` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekdayResolution {
    pub days: WeekdaySet,
    /// Tokens that matched nothing, as written, in input order
    pub unrecognized: Vec<String>,
}

impl WeekdayResolution {
    pub fn is_clean(&self) -> bool {
        self.unrecognized.is_empty()
    }
}

/// Splits the free text on commas, semicolons, pipes, slashes and whitespace
/// and resolves every token against the lookup table.
///
/// Unrecognized tokens are collected rather than rejected; callers decide
/// whether that is an error.
pub fn resolve_weekdays(text: &str) -> WeekdayResolution {
    let mut resolution = WeekdayResolution::default();

    for token in TOKEN_SEPARATOR.split(text.trim()) {
        if token.is_empty() {
            continue;
        }
        match lookup_weekday(token) {
            Some(day) => resolution.days.insert(day),
            None => resolution.unrecognized.push(token.to_string()),
        }
    }

    resolution
}
