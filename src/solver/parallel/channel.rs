//! Work distribution and result channels for parallel search workers.

use crate::error::SolveError;
use crate::solver::statistics::SolveStatistics;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// One top-level branch: the digit of input 0.
///
/// `rank` is the position of the digit in the objective's preference order,
/// so a lower rank always beats a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchTask {
    pub rank: usize,
    pub digit: u8,
}

/// How a worker finished a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchResult {
    /// Best assignment inside the branch.
    Solved(Vec<u8>),
    /// No assignment in the branch drives the output to zero.
    Exhausted,
    /// Stopped early: a better branch already has an answer, or a stop was signalled.
    Abandoned,
    /// The branch hit a search bound.
    Failed(SolveError),
}

/// Message sent from workers to the coordinator.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Worker finished one branch.
    Branch {
        worker_id: usize,
        task: BranchTask,
        result: BranchResult,
        statistics: SolveStatistics,
    },
    /// Worker has no more branches to take.
    Finished { worker_id: usize },
}

/// Shared state for cross-worker pruning and cancellation.
#[derive(Debug)]
pub struct SharedBest {
    /// Rank of the best solved branch (usize::MAX means none yet).
    pub best_rank: AtomicUsize,
    /// Flag to signal all workers to stop.
    pub should_stop: AtomicBool,
    /// Search-tree nodes visited by all workers.
    pub nodes_visited: AtomicU64,
}

impl Default for SharedBest {
    fn default() -> Self {
        Self {
            best_rank: AtomicUsize::new(usize::MAX),
            should_stop: AtomicBool::new(false),
            nodes_visited: AtomicU64::new(0),
        }
    }
}

impl SharedBest {
    /// Try to record a solved branch. Returns true if this is a new best.
    pub fn try_update(&self, rank: usize) -> bool {
        let mut current = self.best_rank.load(Ordering::SeqCst);
        loop {
            if rank >= current {
                return false;
            }
            match self.best_rank.compare_exchange_weak(
                current,
                rank,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(c) => current = c,
            }
        }
    }

    /// Check if we should stop searching.
    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }

    /// Signal all workers to stop.
    pub fn signal_stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    /// Get the current best rank (usize::MAX if none found).
    pub fn current_best(&self) -> usize {
        self.best_rank.load(Ordering::SeqCst)
    }

    /// Count one visited node and return the running total.
    pub fn record_visit(&self) -> u64 {
        self.nodes_visited.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Channel endpoints for a worker.
pub struct WorkerChannels {
    /// Branches still to be searched, shared by all workers.
    pub tasks: Receiver<BranchTask>,
    /// Send messages to coordinator.
    pub to_coordinator: Sender<WorkerMessage>,
    /// Shared state for fast best-rank checking.
    pub shared: Arc<SharedBest>,
}

/// Channel endpoints for the coordinator.
pub struct CoordinatorChannels {
    /// Receive messages from workers.
    pub from_workers: Receiver<WorkerMessage>,
    /// Shared state.
    pub shared: Arc<SharedBest>,
}

/// Create channels for parallel search, queueing every task up front.
pub fn create_channels(
    num_workers: usize,
    tasks: impl IntoIterator<Item = BranchTask>,
) -> (CoordinatorChannels, Vec<WorkerChannels>) {
    let shared = Arc::new(SharedBest::default());

    // Queue every branch, then drop the sender so workers see the end of work
    let (task_tx, task_rx) = unbounded();
    for task in tasks {
        let _ = task_tx.send(task);
    }
    drop(task_tx);

    // Unbounded channel from workers to coordinator (workers shouldn't block)
    let (worker_tx, coordinator_rx) = unbounded();

    let worker_channels = (0..num_workers)
        .map(|_| WorkerChannels {
            tasks: task_rx.clone(),
            to_coordinator: worker_tx.clone(),
            shared: Arc::clone(&shared),
        })
        .collect();

    let coordinator = CoordinatorChannels {
        from_workers: coordinator_rx,
        shared,
    };

    (coordinator, worker_channels)
}
