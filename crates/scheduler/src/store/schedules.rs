//! Capacity-bounded schedule store over a [`StorageBackend`].
//!
//! The whole collection is (de)serialized as one JSON document under the
//! `schedules` key, mirroring small keyed storage media. Corrupt payloads
//! are absorbed as "no data" so the polling loop keeps running.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use cadence_core::{EngineError, Result, Schedule, ScheduleId};

use super::{StorageBackend, SCHEDULES_KEY};

pub struct ScheduleStore {
    backend: Arc<dyn StorageBackend>,
    max_schedules: usize,
}

impl ScheduleStore {
    pub fn new(backend: Arc<dyn StorageBackend>, max_schedules: usize) -> Self {
        Self {
            backend,
            max_schedules,
        }
    }

    /// All stored schedules. Backend failures and unparseable payloads are
    /// logged and read as an empty collection, never propagated.
    pub fn all(&self) -> Vec<Schedule> {
        let payload = match self.backend.read(SCHEDULES_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read schedule collection, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&payload) {
            Ok(schedules) => schedules,
            Err(e) => {
                warn!(error = %e, "corrupt schedule collection, treating as empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, schedules: &[Schedule]) -> Result<()> {
        let payload =
            serde_json::to_string(schedules).map_err(|e| EngineError::Serialize(e.to_string()))?;
        self.backend.write(SCHEDULES_KEY, &payload)
    }

    pub fn get(&self, id: ScheduleId) -> Option<Schedule> {
        self.all().into_iter().find(|s| s.id == id)
    }

    /// Insert a new schedule. At capacity, the oldest record by `created_at`
    /// is evicted silently; callers must expect eventual eviction, not an
    /// error.
    pub fn insert(&self, schedule: Schedule) -> Result<()> {
        let mut schedules = self.all();
        schedules.push(schedule);
        while schedules.len() > self.max_schedules {
            let oldest = schedules
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.created_at)
                .map(|(i, _)| i);
            match oldest {
                Some(i) => {
                    let evicted = schedules.remove(i);
                    info!(schedule_id = %evicted.id, name = %evicted.name, "store at capacity, evicted oldest schedule");
                }
                None => break,
            }
        }
        self.persist(&schedules)
    }

    /// Replace the stored record with the same id. Returns `false` (without
    /// writing) when the id is unknown.
    pub fn save(&self, schedule: &Schedule) -> Result<bool> {
        let mut schedules = self.all();
        match schedules.iter_mut().find(|s| s.id == schedule.id) {
            Some(slot) => *slot = schedule.clone(),
            None => return Ok(false),
        }
        self.persist(&schedules)?;
        Ok(true)
    }

    /// Remove by id. Returns whether a record existed.
    pub fn remove(&self, id: ScheduleId) -> Result<bool> {
        let mut schedules = self.all();
        let before = schedules.len();
        schedules.retain(|s| s.id != id);
        if schedules.len() == before {
            return Ok(false);
        }
        self.persist(&schedules)?;
        Ok(true)
    }

    /// Case-insensitive substring match over name and description.
    pub fn search(&self, query: &str) -> Vec<Schedule> {
        let needle = query.to_lowercase();
        self.all()
            .into_iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Schedules carrying `tag` (exact membership).
    pub fn with_tag(&self, tag: &str) -> Vec<Schedule> {
        self.all()
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Every tag in use, deduplicated and lexicographically sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let tags: BTreeSet<String> = self
            .all()
            .into_iter()
            .flat_map(|s| s.tags)
            .collect();
        tags.into_iter().collect()
    }
}
