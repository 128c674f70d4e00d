//! Aggregate engine statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ledger::ExecutionTotals;

/// Snapshot of schedule counts and execution totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    /// Counts keyed by frequency label (`once`, `daily`, `weekly`, `monthly`).
    pub by_frequency: BTreeMap<String, usize>,
    pub executions: ExecutionTotals,
}
