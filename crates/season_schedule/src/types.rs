use crate::db::SessionDbManager;
use crate::schedule::OccurrenceGenerator;

/// State shared by all request handlers.
pub struct ScheduleState {
    /// Stored session rows
    pub schedule_db: SessionDbManager,
    /// Generator configured from the `[schedule]` settings
    pub generator: OccurrenceGenerator,
}

impl ScheduleState {
    pub fn new(schedule_db: SessionDbManager, generator: OccurrenceGenerator) -> Self {
        Self {
            schedule_db,
            generator,
        }
    }
}
