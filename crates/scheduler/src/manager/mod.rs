//! Schedule lifecycle orchestration.
//!
//! [`ScheduleManager`] composes the recurrence calculator, due evaluator,
//! schedule store, and execution ledger behind one synchronous surface. The
//! polling caller asks for due schedules, performs the external action, and
//! reports each outcome back through [`record_execution`].
//!
//! [`record_execution`]: ScheduleManager::record_execution

mod core;
mod stats;


pub use self::core::ScheduleManager;
pub use self::stats::EngineStats;
