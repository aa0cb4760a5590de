//! Parallel digit search over the top-level branches.
//!
//! The nine digits of input 0 are queued on a shared work channel. Workers
//! pull branches, search them depth-first and report back to a coordinator.
//! A shared atomic rank of the best solved branch lets workers drop branches
//! that can no longer hold the extremal answer.
//!
//! # Example
//!
//! ```ignore
//! use monad_solver::solver::{SolverConfig, Objective};
//!
//! let config = SolverConfig::default().with_workers(4);
//! let outcome = run_parallel_search(problem, Objective::Max, &config, None)?;
//! ```

pub mod channel;
pub mod config;
pub mod coordinator;

pub use config::ParallelConfig;
pub use coordinator::run_parallel_search;
