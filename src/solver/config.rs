//! Configuration types for the constraint solver

use crate::solver::parallel::ParallelConfig;
use std::time::Duration;

/// Configuration for the constraint solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock bound for the whole solve (None = unbounded)
    pub timeout: Option<Duration>,
    /// Bound on search-tree nodes visited across all workers (None = unbounded)
    pub max_nodes: Option<u64>,
    /// Try digit-pair reduction before searching
    pub structural: bool,
    /// Skip subtrees whose live register values were already proven empty
    pub use_cache: bool,
    pub parallel: ParallelConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_nodes: None,
            structural: true,
            use_cache: true,
            parallel: ParallelConfig::default(),
        }
    }
}

impl SolverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: u64) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    pub fn with_max_nodes_option(mut self, max_nodes: Option<u64>) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_structural(mut self, enabled: bool) -> Self {
        self.structural = enabled;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shorthand for `with_parallel(ParallelConfig::default().with_workers(n))`
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.parallel = self.parallel.with_workers(num_workers);
        self
    }
}
