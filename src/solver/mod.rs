//! Constraint solver for `root == 0`
//!
//! Structural reduction is tried first; it answers directly when the output
//! condition decomposes into fixed digits and digit pairs. Otherwise a pruned
//! depth-first search runs, sequentially or over parallel workers.

pub mod config;
pub mod parallel;
pub mod reduce;
pub mod search;
pub mod statistics;

pub use config::SolverConfig;
pub use parallel::{run_parallel_search, ParallelConfig};
pub use reduce::{assign, reduce, Constraint, DigitPair, Goal, Reduction};
pub use search::{run_search, DigitSearch, SearchOutcome};
pub use statistics::{SolveStatistics, SolverOutcome, Strategy};

use crate::analysis::{analyze, live_before};
use crate::builder::Built;
use crate::error::SolveError;
use crate::graph::{evaluate, NodeRef, NodeTable};
use crate::ir::Program;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Which extremal model number to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Objective {
    Max,
    Min,
}

impl Objective {
    /// Digits in order of preference
    pub fn digit_order(&self) -> [u8; 9] {
        match self {
            Objective::Max => [9, 8, 7, 6, 5, 4, 3, 2, 1],
            Objective::Min => [1, 2, 3, 4, 5, 6, 7, 8, 9],
        }
    }

    /// Digit given to inputs that nothing constrains
    pub fn free_digit(&self) -> u8 {
        self.digit_order()[0]
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Max => write!(f, "max"),
            Objective::Min => write!(f, "min"),
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" | "maximum" | "largest" => Ok(Objective::Max),
            "min" | "minimum" | "smallest" => Ok(Objective::Min),
            _ => Err(format!(
                "Unknown objective: '{}'. Valid options: max, min",
                s
            )),
        }
    }
}

/// An optimized graph ready for solving
#[derive(Debug, Clone)]
pub struct Problem {
    pub table: NodeTable,
    pub root: NodeRef,
    pub input_count: usize,
    /// For each input, the nodes held by the registers live just before it is
    /// read. Once the earlier digits are pinned their values summarize the
    /// whole prefix.
    pub cache_keys: Vec<Vec<NodeRef>>,
}

impl Problem {
    pub fn new(table: NodeTable, root: NodeRef, input_count: usize) -> Self {
        let root = table.resolve(root);
        Self {
            table,
            root,
            input_count,
            cache_keys: Vec::new(),
        }
    }

    pub fn with_cache_keys(mut self, cache_keys: Vec<Vec<NodeRef>>) -> Self {
        self.cache_keys = cache_keys;
        self
    }

    /// Problem for a built (and usually optimized) program, with cache keys
    /// taken from the builder checkpoints and register liveness.
    pub fn from_built(built: Built, program: &Program) -> Self {
        let live = live_before(program);
        let cache_keys = built
            .checkpoints
            .iter()
            .map(|checkpoint| {
                live[checkpoint.instruction_index]
                    .iter()
                    .filter_map(|reg| checkpoint.state.get(reg).ok())
                    .map(|node| built.table.resolve(node))
                    .collect()
            })
            .collect();
        let root = built.root();
        let input_count = built.input_count();
        Problem::new(built.table, root, input_count).with_cache_keys(cache_keys)
    }

    /// Nodes whose ranges the search needs: the root and every cache key
    pub fn analysis_roots(&self) -> Vec<NodeRef> {
        let mut roots = vec![self.root];
        roots.extend(self.cache_keys.iter().flatten().copied());
        roots
    }
}

fn try_structural(problem: &Problem, objective: Objective) -> Result<Option<Vec<u8>>, SolveError> {
    let ranges = analyze(&problem.table, &[problem.root]);
    let reduction = reduce(&problem.table, &ranges, problem.root)?;
    debug!(
        constraints = reduction.constraints.len(),
        residual = reduction.residual.len(),
        "structural reduction"
    );
    let Some(digits) = assign(&reduction, problem.input_count, objective) else {
        return Ok(None);
    };
    if evaluate(&problem.table, &digits, problem.root) == Ok(0) {
        Ok(Some(digits))
    } else {
        debug!("structural assignment rejected by evaluation, searching instead");
        Ok(None)
    }
}

/// Find the extremal digits driving `problem.root` to zero
pub fn solve_expression(
    problem: &Arc<Problem>,
    objective: Objective,
    config: &SolverConfig,
) -> Result<Vec<u8>, SolveError> {
    solve_expression_with_stats(problem, objective, config).map(|outcome| outcome.digits)
}

/// Like [`solve_expression`], also returning how the answer was found
pub fn solve_expression_with_stats(
    problem: &Arc<Problem>,
    objective: Objective,
    config: &SolverConfig,
) -> Result<SolverOutcome, SolveError> {
    let start = Instant::now();
    let deadline = config.timeout.map(|t| start + t);

    if config.structural {
        if let Some(digits) = try_structural(problem, objective)? {
            let mut statistics = SolveStatistics::new(Strategy::Structural);
            statistics.elapsed_time = start.elapsed();
            info!(%objective, "solved by structural reduction");
            return Ok(SolverOutcome { digits, statistics });
        }
    }

    let mut outcome = if config.parallel.is_parallel() && problem.input_count > 0 {
        info!(%objective, workers = config.parallel.num_workers, "starting parallel search");
        run_parallel_search(Arc::clone(problem), objective, config, deadline)?
    } else {
        info!(%objective, "starting search");
        run_search(problem, objective, config, deadline)?
    };
    outcome.statistics.elapsed_time = start.elapsed();
    Ok(outcome)
}
