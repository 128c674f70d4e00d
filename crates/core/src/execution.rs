use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::ScheduleId;

/// Outcome of one firing attempt, as reported by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One recorded execution attempt. Owned by the ledger, keyed by
/// `schedule_id`; never embedded in the schedule record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub schedule_id: ScheduleId,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
