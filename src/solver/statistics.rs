//! Solver result types and statistics

use std::fmt;
use std::time::Duration;

/// How the answer was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Direct assignment from digit pairs and fixed digits
    Structural,
    /// Pruned depth-first search
    #[default]
    Search,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Structural => write!(f, "structural"),
            Strategy::Search => write!(f, "search"),
        }
    }
}

/// Statistics from one solver run
#[derive(Debug, Clone, Default)]
pub struct SolveStatistics {
    pub strategy: Strategy,
    /// Total time spent solving
    pub elapsed_time: Duration,
    /// Search-tree nodes entered
    pub nodes_visited: u64,
    /// Subtrees cut because the output range excluded zero
    pub nodes_pruned: u64,
    /// Subtrees skipped by the visited-state cache
    pub cache_hits: u64,
    /// Complete assignments checked by concrete evaluation
    pub leaves_evaluated: u64,
    /// Worker threads used (1 for a sequential search)
    pub workers: usize,
}

impl SolveStatistics {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            workers: 1,
            ..Default::default()
        }
    }

    /// Add the counters of a worker's statistics into this one
    pub fn merge(&mut self, other: &SolveStatistics) {
        self.nodes_visited += other.nodes_visited;
        self.nodes_pruned += other.nodes_pruned;
        self.cache_hits += other.cache_hits;
        self.leaves_evaluated += other.leaves_evaluated;
    }

    /// Fraction of visited nodes that were cut by range pruning
    pub fn prune_rate(&self) -> f64 {
        if self.nodes_visited == 0 {
            0.0
        } else {
            self.nodes_pruned as f64 / self.nodes_visited as f64
        }
    }
}

impl fmt::Display for SolveStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Strategy: {}", self.strategy)?;
        writeln!(f, "  Elapsed time: {:?}", self.elapsed_time)?;
        writeln!(f, "  Workers: {}", self.workers)?;
        writeln!(f, "  Nodes visited: {}", self.nodes_visited)?;
        writeln!(
            f,
            "  Nodes pruned: {} ({:.1}%)",
            self.nodes_pruned,
            self.prune_rate() * 100.0
        )?;
        writeln!(f, "  Cache hits: {}", self.cache_hits)?;
        writeln!(f, "  Leaves evaluated: {}", self.leaves_evaluated)
    }
}

/// Digits found by the solver together with how they were found
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub digits: Vec<u8>,
    pub statistics: SolveStatistics,
}
