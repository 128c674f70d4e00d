pub mod error;
pub mod execution;
pub mod schedule;

pub use error::*;
pub use execution::*;
pub use schedule::*;
