//! Persistence: pluggable keyed backends and the bounded schedule store.

mod backend;
mod schedules;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use schedules::ScheduleStore;

/// Backend key holding the serialized schedule collection.
pub(crate) const SCHEDULES_KEY: &str = "schedules";

/// Backend key holding the serialized execution history map.
pub(crate) const EXECUTIONS_KEY: &str = "executions";
