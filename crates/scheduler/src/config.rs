use std::path::Path;

use serde::{Deserialize, Serialize};

use cadence_core::{EngineError, Result};

/// Engine configuration, typically parsed from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tolerance after `next_run_at` during which a schedule is still due,
    /// in seconds. Firings missed by more than this are skipped, not replayed.
    #[serde(default = "default_due_window")]
    pub due_window_seconds: u64,
    /// Maximum stored schedules. Inserting past this evicts the oldest by
    /// `created_at`.
    #[serde(default = "default_max_schedules")]
    pub max_schedules: usize,
    /// Maximum retained execution records per schedule.
    #[serde(default = "default_max_history")]
    pub max_history_per_schedule: usize,
    /// History page size when the caller does not pass a limit.
    #[serde(default = "default_history_limit")]
    pub default_history_limit: usize,
}

fn default_due_window() -> u64 { 60 }
fn default_max_schedules() -> usize { 200 }
fn default_max_history() -> usize { 50 }
fn default_history_limit() -> usize { 10 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            due_window_seconds: default_due_window(),
            max_schedules: default_max_schedules(),
            max_history_per_schedule: default_max_history(),
            default_history_limit: default_history_limit(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| EngineError::Serialize(e.to_string()))
    }

    /// The due window as a chrono duration.
    pub fn due_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.due_window_seconds as i64)
    }
}
