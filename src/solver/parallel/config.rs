//! Configuration for parallel search execution.

/// Upper bound on useful workers: there are only nine top-level branches.
pub const MAX_WORKERS: usize = 9;

/// Configuration for parallel search execution.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads to spawn (1 = search on the calling thread).
    pub num_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get().clamp(1, MAX_WORKERS),
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel config with the specified number of workers.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Set the worker count from an Option, keeping the default for None.
    pub fn with_workers_option(self, num_workers: Option<usize>) -> Self {
        match num_workers {
            Some(n) => self.with_workers(n),
            None => self,
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.num_workers > 1
    }
}
