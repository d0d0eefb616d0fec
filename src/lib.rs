//! Taskwell - bounded worker-pool task executor
//!
//! A fixed set of long-lived worker threads drains a FIFO task queue;
//! each submission returns a [`JoinHandle`] that resolves to exactly one
//! outcome. The queue can be bounded, in which case submitters block while
//! it is full (backpressure) instead of growing it without limit.
//!
//! # Quick Start
//!
//! ```
//! use taskwell::{Config, Pool};
//!
//! let config = Config::builder().worker_threads(2).build().unwrap();
//! let pool = Pool::new(&config).unwrap();
//!
//! let handle = pool.submit(|| 2 + 2).unwrap();
//! assert_eq!(handle.get(), Ok(4));
//!
//! pool.shutdown();
//! pool.await_termination(None).unwrap();
//! ```
//!
//! # Guarantees
//!
//! - **FIFO admission**: workers claim tasks in submission order.
//! - **One outcome per task**: completed, panicked, or cancelled. The
//!   outcome is written once and can be read any number of times.
//! - **Panic isolation**: a panicking task never kills its worker or loses
//!   later tasks.
//! - **Two shutdown modes**: graceful ([`Pool::shutdown`]) lets the backlog
//!   drain; forced ([`Pool::shutdown_now`]) discards it as cancelled.
//!   In-flight tasks always finish.

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod queue;
pub mod stats;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{JoinHandle, Pool, PoolState, TaskId};
pub use stats::StatsSnapshot;
