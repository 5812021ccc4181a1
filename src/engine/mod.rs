//! The processing engine: worker pool and progress aggregation.

pub mod pool;
pub mod progress;

pub use pool::{Pool, PoolConfig, RunSummary};
pub use progress::Snapshot;
