//! Bounded per-schedule execution history.
//!
//! Records are capped per schedule with FIFO eviction and persisted through
//! the same backend as the schedule collection, under their own key. History
//! is owned here, keyed by schedule id, never embedded in the schedule
//! record itself.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use cadence_core::{EngineError, ExecutionRecord, ExecutionStatus, Result, ScheduleId};

use crate::store::{StorageBackend, EXECUTIONS_KEY};

type HistoryMap = HashMap<ScheduleId, VecDeque<ExecutionRecord>>;

/// Execution totals across all schedules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTotals {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct ExecutionLedger {
    backend: Arc<dyn StorageBackend>,
    max_per_schedule: usize,
    default_limit: usize,
}

impl ExecutionLedger {
    pub fn new(backend: Arc<dyn StorageBackend>, max_per_schedule: usize, default_limit: usize) -> Self {
        Self {
            backend,
            max_per_schedule,
            default_limit,
        }
    }

    /// The full history map. Corrupt payloads and backend read failures are
    /// absorbed as an empty map.
    fn load(&self) -> HistoryMap {
        let payload = match self.backend.read(EXECUTIONS_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return HistoryMap::new(),
            Err(e) => {
                warn!(error = %e, "failed to read execution history, treating as empty");
                return HistoryMap::new();
            }
        };
        match serde_json::from_str(&payload) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "corrupt execution history, treating as empty");
                HistoryMap::new()
            }
        }
    }

    fn persist(&self, map: &HistoryMap) -> Result<()> {
        let payload =
            serde_json::to_string(map).map_err(|e| EngineError::Serialize(e.to_string()))?;
        self.backend.write(EXECUTIONS_KEY, &payload)
    }

    /// Record one execution outcome at the current instant.
    pub fn append(
        &self,
        schedule_id: ScheduleId,
        status: ExecutionStatus,
        error_message: Option<String>,
    ) -> Result<ExecutionRecord> {
        self.append_at(schedule_id, status, error_message, Utc::now())
    }

    /// Record one execution outcome at a specific instant.
    ///
    /// Useful for testing and deterministic replay.
    pub fn append_at(
        &self,
        schedule_id: ScheduleId,
        status: ExecutionStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<ExecutionRecord> {
        let record = ExecutionRecord {
            id: Uuid::new_v4(),
            schedule_id,
            status,
            error_message,
            recorded_at: at,
        };

        let mut map = self.load();
        let deque = map.entry(schedule_id).or_default();
        deque.push_back(record.clone());
        while deque.len() > self.max_per_schedule {
            deque.pop_front();
        }
        self.persist(&map)?;
        Ok(record)
    }

    /// History for one schedule, newest first. `limit` falls back to the
    /// configured default page size.
    pub fn history(&self, schedule_id: ScheduleId, limit: Option<usize>) -> Vec<ExecutionRecord> {
        let limit = limit.unwrap_or(self.default_limit);
        let map = self.load();
        let Some(deque) = map.get(&schedule_id) else {
            return Vec::new();
        };
        deque.iter().rev().take(limit).cloned().collect()
    }

    /// Drop all history for a schedule.
    pub fn clear(&self, schedule_id: ScheduleId) -> Result<()> {
        let mut map = self.load();
        if map.remove(&schedule_id).is_some() {
            self.persist(&map)?;
        }
        Ok(())
    }

    /// Execution totals across every schedule's history.
    pub fn totals(&self) -> ExecutionTotals {
        let map = self.load();
        let mut totals = ExecutionTotals::default();
        for record in map.values().flatten() {
            totals.total += 1;
            match record.status {
                ExecutionStatus::Success => totals.succeeded += 1,
                ExecutionStatus::Failed => totals.failed += 1,
            }
        }
        totals
    }
}
