//! Recurring-schedule engine.
//!
//! This crate provides:
//! - Pure next-run computation for once/daily/weekly/monthly policies
//! - Due detection with a bounded tolerance window
//! - A capacity-bounded schedule store over a pluggable keyed backend
//! - A bounded per-schedule execution ledger
//! - A manager orchestrating the lifecycle and aggregate statistics
//!
//! The engine is synchronous and single-writer: a host embedding it in a
//! multi-threaded context serializes access around [`ScheduleManager`].

pub mod config;
pub mod due;
pub mod ledger;
pub mod manager;
pub mod recurrence;
pub mod store;
pub mod validation;

pub use config::EngineConfig;
pub use due::is_due;
pub use ledger::{ExecutionLedger, ExecutionTotals};
pub use manager::{EngineStats, ScheduleManager};
pub use recurrence::{next_run, NextRun};
pub use store::{FileBackend, MemoryBackend, ScheduleStore, StorageBackend};
