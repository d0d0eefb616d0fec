//! Executor core: pool lifecycle, workers, and per-task plumbing.

pub mod handle;
pub mod pool;
pub(crate) mod task;
pub(crate) mod worker;

pub use handle::JoinHandle;
pub use pool::{Pool, PoolState};
pub use task::TaskId;
pub use worker::WorkerId;
