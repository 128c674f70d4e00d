//! Schedule data model: recurrence policies, drafts, and partial updates.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ScheduleId = Uuid;

/// Day of the week for weekly recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Days since Monday, 0-6. Matches `chrono::Weekday::num_days_from_monday`.
    pub fn num_days_from_monday(&self) -> u32 {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(wd: chrono::Weekday) -> Self {
        match wd {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Recurrence policy. Frequency-specific fields live on their variant, so a
/// weekly schedule without weekdays (or a monthly one without a day) is not
/// representable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "lowercase")]
pub enum Recurrence {
    /// Fires once on the start day, then exhausts.
    Once,
    /// Fires every day at the configured time.
    Daily,
    /// Fires on each listed weekday at the configured time.
    Weekly { days_of_week: BTreeSet<Weekday> },
    /// Fires once a month on `day_of_month` (clamped to shorter months).
    Monthly { day_of_month: u32 },
}

impl Recurrence {
    /// Stable lowercase label, used for stats grouping and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Recurrence::Once => "once",
            Recurrence::Daily => "daily",
            Recurrence::Weekly { .. } => "weekly",
            Recurrence::Monthly { .. } => "monthly",
        }
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// A recurring task definition.
///
/// `next_run_at` is derived state: it is recomputed whenever `recurrence`,
/// `fire_time`, `start_at`, or `end_at` changes, and after every recorded
/// execution. `None` means the schedule is exhausted (a once schedule that
/// already fired, or a recurring one past its `end_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque ordered domain items acted on when the schedule fires.
    #[serde(default)]
    pub payload: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub recurrence: Recurrence,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    /// Wall-clock hour:minute of execution on an active day (UTC).
    pub fire_time: NaiveTime,
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation inputs for a schedule. Ids, timestamps, and derived fields are
/// assigned by the manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payload: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub recurrence: Recurrence,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    pub fire_time: NaiveTime,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Partial update for a schedule. `None` leaves the field untouched;
/// `description` and `end_at` are doubly optional so a patch can clear them.
/// `recurrence` is replaced wholesale, never merged field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub payload: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub fire_time: Option<NaiveTime>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Schedule {
    /// Materialize a draft into a full record. `next_run_at` starts unset;
    /// the manager computes it immediately after construction.
    pub fn from_draft(draft: ScheduleDraft, id: ScheduleId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            payload: draft.payload,
            recurrence: draft.recurrence,
            start_at: draft.start_at,
            end_at: draft.end_at,
            fire_time: draft.fire_time,
            enabled: draft.enabled,
            tags: draft.tags,
            next_run_at: None,
            last_run_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place. Returns `true` when a field that
    /// feeds recurrence computation (`recurrence`, `fire_time`, `start_at`,
    /// `end_at`) actually changed, so the caller knows to recompute
    /// `next_run_at`.
    pub fn apply_patch(&mut self, patch: SchedulePatch) -> bool {
        let mut recompute = false;

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(payload) = patch.payload {
            self.payload = payload;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }

        if let Some(recurrence) = patch.recurrence {
            if recurrence != self.recurrence {
                recompute = true;
            }
            self.recurrence = recurrence;
        }
        if let Some(start_at) = patch.start_at {
            if start_at != self.start_at {
                recompute = true;
            }
            self.start_at = start_at;
        }
        if let Some(end_at) = patch.end_at {
            if end_at != self.end_at {
                recompute = true;
            }
            self.end_at = end_at;
        }
        if let Some(fire_time) = patch.fire_time {
            if fire_time != self.fire_time {
                recompute = true;
            }
            self.fire_time = fire_time;
        }

        recompute
    }
}
