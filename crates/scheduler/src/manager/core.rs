//! [`ScheduleManager`] — the engine's synchronous orchestration surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use cadence_core::{
    ExecutionRecord, ExecutionStatus, Result, Schedule, ScheduleDraft, ScheduleId, SchedulePatch,
};

use crate::config::EngineConfig;
use crate::due::is_due;
use crate::ledger::ExecutionLedger;
use crate::recurrence::next_run;
use crate::store::{ScheduleStore, StorageBackend};
use crate::validation::{validate_draft, validate_schedule};

use super::stats::EngineStats;

/// Orchestrates schedule lifecycle, due detection, and outcome recording.
///
/// Every operation completes synchronously before returning; a
/// multi-threaded host serializes access (e.g. behind a mutex). Not-found
/// conditions are sentinels (`Ok(None)` / `Ok(false)`), never errors;
/// validation failures are the only case that aborts an operation.
pub struct ScheduleManager {
    store: ScheduleStore,
    ledger: ExecutionLedger,
    config: EngineConfig,
}

impl ScheduleManager {
    /// Build a manager over an injected backend. The store and ledger share
    /// the backend but own disjoint keys.
    pub fn new(backend: Arc<dyn StorageBackend>, config: EngineConfig) -> Self {
        let store = ScheduleStore::new(Arc::clone(&backend), config.max_schedules);
        let ledger = ExecutionLedger::new(
            backend,
            config.max_history_per_schedule,
            config.default_history_limit,
        );
        Self {
            store,
            ledger,
            config,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Validate a draft, assign id and timestamps, compute the initial
    /// `next_run_at`, and persist.
    pub fn create(&self, draft: ScheduleDraft) -> Result<Schedule> {
        let result = validate_draft(&draft);
        if !result.valid {
            return Err(result.into_engine_error());
        }

        let now = Utc::now();
        let mut schedule = Schedule::from_draft(draft, Uuid::new_v4(), now);
        schedule.next_run_at = next_run(&schedule, now).instant();
        self.store.insert(schedule.clone())?;

        info!(
            schedule_id = %schedule.id,
            name = %schedule.name,
            frequency = %schedule.recurrence,
            "created schedule"
        );
        Ok(schedule)
    }

    /// Merge a partial update. Recomputes `next_run_at` when a
    /// recurrence-relevant field changed. `Ok(None)` for an unknown id.
    pub fn update(&self, id: ScheduleId, patch: SchedulePatch) -> Result<Option<Schedule>> {
        let Some(mut schedule) = self.store.get(id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let recompute = schedule.apply_patch(patch);

        let result = validate_schedule(&schedule);
        if !result.valid {
            return Err(result.into_engine_error());
        }

        if recompute {
            schedule.next_run_at = next_run(&schedule, now).instant();
        }
        schedule.updated_at = now;
        self.store.save(&schedule)?;

        debug!(schedule_id = %id, recompute, "updated schedule");
        Ok(Some(schedule))
    }

    /// Remove a schedule and its execution history. Returns whether a record
    /// existed.
    pub fn delete(&self, id: ScheduleId) -> Result<bool> {
        let existed = self.store.remove(id)?;
        if existed {
            // History is not retained past its schedule.
            self.ledger.clear(id)?;
            info!(schedule_id = %id, "deleted schedule and its history");
        }
        Ok(existed)
    }

    /// Clone a schedule under a fresh id. The copy has never executed:
    /// `last_run_at` is unset and `next_run_at` is computed from now.
    pub fn duplicate(&self, id: ScheduleId, new_name: Option<&str>) -> Result<Option<Schedule>> {
        let Some(original) = self.store.get(id) else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut copy = original.clone();
        copy.id = Uuid::new_v4();
        copy.name = new_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} (copy)", original.name));
        copy.last_run_at = None;
        copy.created_at = now;
        copy.updated_at = now;
        copy.next_run_at = next_run(&copy, now).instant();
        self.store.insert(copy.clone())?;

        info!(schedule_id = %copy.id, source_id = %id, "duplicated schedule");
        Ok(Some(copy))
    }

    // ── Execution ───────────────────────────────────────────────────

    /// Record a caller-reported outcome at the current instant.
    pub fn record_execution(
        &self,
        id: ScheduleId,
        status: ExecutionStatus,
        error_message: Option<String>,
    ) -> Result<Option<Schedule>> {
        self.record_execution_at(id, status, error_message, Utc::now())
    }

    /// Record a caller-reported outcome at a specific instant: appends a
    /// ledger record, sets `last_run_at`, and advances `next_run_at`.
    ///
    /// Useful for testing and deterministic replay.
    pub fn record_execution_at(
        &self,
        id: ScheduleId,
        status: ExecutionStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<Schedule>> {
        let Some(mut schedule) = self.store.get(id) else {
            return Ok(None);
        };

        self.ledger.append_at(id, status, error_message, at)?;
        schedule.last_run_at = Some(at);
        schedule.next_run_at = next_run(&schedule, at).instant();
        schedule.updated_at = at;
        self.store.save(&schedule)?;

        debug!(
            schedule_id = %id,
            status = %status,
            next_run_at = ?schedule.next_run_at,
            "recorded execution"
        );
        Ok(Some(schedule))
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Schedules due at `now` per the due-window rules.
    pub fn due_schedules(&self, now: DateTime<Utc>) -> Vec<Schedule> {
        let window = self.config.due_window();
        self.store
            .all()
            .into_iter()
            .filter(|s| is_due(s, now, window))
            .collect()
    }

    /// Schedules due right now.
    pub fn pending_schedules(&self) -> Vec<Schedule> {
        self.due_schedules(Utc::now())
    }

    pub fn get(&self, id: ScheduleId) -> Option<Schedule> {
        self.store.get(id)
    }

    pub fn schedules(&self) -> Vec<Schedule> {
        self.store.all()
    }

    /// Execution history for a schedule, newest first.
    pub fn history(&self, id: ScheduleId, limit: Option<usize>) -> Vec<ExecutionRecord> {
        self.ledger.history(id, limit)
    }

    /// Case-insensitive substring search over name and description.
    pub fn search(&self, query: &str) -> Vec<Schedule> {
        self.store.search(query)
    }

    /// Schedules carrying `tag`.
    pub fn with_tag(&self, tag: &str) -> Vec<Schedule> {
        self.store.with_tag(tag)
    }

    /// Every tag in use, deduplicated and sorted.
    pub fn all_tags(&self) -> Vec<String> {
        self.store.all_tags()
    }

    /// Aggregate counts across schedules and ledgers.
    pub fn stats(&self) -> EngineStats {
        let schedules = self.store.all();
        let mut by_frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut enabled = 0;
        for schedule in &schedules {
            if schedule.enabled {
                enabled += 1;
            }
            *by_frequency
                .entry(schedule.recurrence.kind().to_string())
                .or_insert(0) += 1;
        }
        EngineStats {
            total: schedules.len(),
            enabled,
            disabled: schedules.len() - enabled,
            by_frequency,
            executions: self.ledger.totals(),
        }
    }
}
