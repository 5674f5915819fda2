/// Database types for stored sessions
use crate::schedule::SessionRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSession {
    pub session_id: String,
    pub program: Option<String>,
    #[serde(flatten)]
    pub record: SessionRecord,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl DbSession {
    pub fn new(session_id: impl Into<String>, program: Option<String>, record: SessionRecord) -> Self {
        Self {
            session_id: session_id.into(),
            program,
            record,
            created_at: None,
        }
    }
}
