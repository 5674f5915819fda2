//! Season schedule generation for recurring after-school practice sessions.
//!
//! The [`schedule`] module expands a session row into concrete occurrences;
//! [`db`] stores session rows and [`server`] exposes both over HTTP.

pub mod db;
pub mod schedule;
pub mod server;
pub mod settings;
pub mod types;

pub use schedule::{
    generate_occurrences, Occurrence, OccurrenceGenerator, Schedule, ScheduleConfig,
    ScheduleError, Session, SessionRecord,
};
