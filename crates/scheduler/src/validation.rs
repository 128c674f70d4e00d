//! Structured validation for schedule drafts and merged updates.
//!
//! Returns a [`ValidationResult`] with errors (block the operation) and
//! warnings (advisory, e.g. day-of-month clamping in short months).

use serde::{Deserialize, Serialize};

use cadence_core::{EngineError, Recurrence, Schedule, ScheduleDraft};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field-path-like location, e.g. `"recurrence.days_of_week"`.
    pub path: String,
    pub message: String,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Collapse the error list into an [`EngineError::Validation`].
    pub fn into_engine_error(self) -> EngineError {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        EngineError::Validation(joined)
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate creation inputs.
pub fn validate_draft(draft: &ScheduleDraft) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_name(&draft.name, &mut result);
    validate_recurrence(&draft.recurrence, &mut result);
    validate_window(draft, &mut result);
    result
}

/// Validate a schedule after a patch has been merged into it.
pub fn validate_schedule(schedule: &Schedule) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_name(&schedule.name, &mut result);
    validate_recurrence(&schedule.recurrence, &mut result);
    if let Some(end_at) = schedule.end_at {
        if end_at < schedule.start_at {
            result.error("end_at", "end date precedes start date");
        }
    }
    result
}

// ── Checks ──────────────────────────────────────────────────────────

fn validate_name(name: &str, result: &mut ValidationResult) {
    if name.trim().is_empty() {
        result.error("name", "name must not be empty");
    }
}

fn validate_recurrence(recurrence: &Recurrence, result: &mut ValidationResult) {
    match recurrence {
        Recurrence::Once | Recurrence::Daily => {}
        Recurrence::Weekly { days_of_week } => {
            if days_of_week.is_empty() {
                result.error(
                    "recurrence.days_of_week",
                    "weekly schedules require at least one weekday",
                );
            }
        }
        Recurrence::Monthly { day_of_month } => {
            if !(1..=31).contains(day_of_month) {
                result.error(
                    "recurrence.day_of_month",
                    format!("day_of_month must be in 1-31, got {}", day_of_month),
                );
            } else if *day_of_month > 28 {
                result.warn(
                    "recurrence.day_of_month",
                    format!("day {} clamps to the last day of shorter months", day_of_month),
                );
            }
        }
    }
}

fn validate_window(draft: &ScheduleDraft, result: &mut ValidationResult) {
    if let Some(end_at) = draft.end_at {
        if end_at < draft.start_at {
            result.error("end_at", "end date precedes start date");
        }
    }
}
