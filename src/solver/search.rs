//! Pruned depth-first search over digit assignments
//!
//! Digits are assigned in input order, best digit first, so the first
//! complete assignment found is the extremal one. A prefix is abandoned as
//! soon as the pinned range of the output excludes zero.

use crate::analysis::{RangeAnalyzer, RangeTable};
use crate::error::SolveError;
use crate::graph::evaluate;
use crate::solver::config::SolverConfig;
use crate::solver::parallel::channel::SharedBest;
use crate::solver::statistics::{SolveStatistics, SolverOutcome, Strategy};
use crate::solver::{Objective, Problem};
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

/// Result of searching below a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Extremal complete assignment extending the prefix
    Found(Vec<u8>),
    Exhausted,
    /// Stopped because another worker made this subtree irrelevant
    Abandoned,
}

enum Step {
    Found,
    Exhausted,
    Abandoned,
}

/// Depth-first search state, reusable across several prefixes
pub struct DigitSearch<'a> {
    problem: &'a Problem,
    analyzer: RangeAnalyzer<'a>,
    objective: Objective,
    deadline: Option<Instant>,
    max_nodes: Option<u64>,
    use_cache: bool,
    shared: Option<&'a SharedBest>,
    /// Rank of the branch being searched, for cross-worker abandonment
    rank: usize,
    /// `(depth, live register values)` states already proven to have no solution
    failed: HashSet<(usize, Vec<i64>)>,
    statistics: SolveStatistics,
}

impl<'a> DigitSearch<'a> {
    pub fn new(
        problem: &'a Problem,
        objective: Objective,
        config: &SolverConfig,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            problem,
            analyzer: RangeAnalyzer::new(&problem.table, &problem.analysis_roots()),
            objective,
            deadline,
            max_nodes: config.max_nodes,
            use_cache: config.use_cache,
            shared: None,
            rank: 0,
            failed: HashSet::new(),
            statistics: SolveStatistics::new(Strategy::Search),
        }
    }

    /// Count nodes globally and abandon branches outranked by other workers
    pub fn with_shared(mut self, shared: &'a SharedBest) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }

    /// Statistics gathered since the last call
    pub fn take_statistics(&mut self) -> SolveStatistics {
        std::mem::replace(
            &mut self.statistics,
            SolveStatistics::new(Strategy::Search),
        )
    }

    /// Search for the extremal assignment that starts with `prefix`
    pub fn run_from(&mut self, prefix: &[u8]) -> Result<SearchOutcome, SolveError> {
        let ranges = self.analyzer.analyze_pinned(prefix);
        let mut digits = prefix.to_vec();
        Ok(match self.dfs(&mut digits, &ranges)? {
            Step::Found => SearchOutcome::Found(digits),
            Step::Exhausted => SearchOutcome::Exhausted,
            Step::Abandoned => SearchOutcome::Abandoned,
        })
    }

    fn enter(&mut self) -> Result<(), SolveError> {
        self.statistics.nodes_visited += 1;
        let total = match self.shared {
            Some(shared) => shared.record_visit(),
            None => self.statistics.nodes_visited,
        };
        if self.max_nodes.is_some_and(|max| total > max) {
            return Err(SolveError::Timeout("node"));
        }
        if let Some(deadline) = self.deadline {
            if self.statistics.nodes_visited % 64 == 1 && Instant::now() >= deadline {
                return Err(SolveError::Timeout("wall-clock"));
            }
        }
        Ok(())
    }

    fn should_abandon(&self) -> bool {
        self.shared
            .is_some_and(|s| s.should_stop() || s.current_best() < self.rank)
    }

    fn cache_key(&self, depth: usize, ranges: &RangeTable) -> Option<(usize, Vec<i64>)> {
        let nodes = self.problem.cache_keys.get(depth)?;
        let values = nodes
            .iter()
            .map(|n| ranges.of(&self.problem.table, *n).and_then(|r| r.as_exact()))
            .collect::<Option<Vec<i64>>>()?;
        Some((depth, values))
    }

    fn dfs(&mut self, digits: &mut Vec<u8>, ranges: &RangeTable) -> Result<Step, SolveError> {
        self.enter()?;
        if self.should_abandon() {
            return Ok(Step::Abandoned);
        }

        let problem = self.problem;
        let depth = digits.len();
        let admits_zero = ranges
            .of(&problem.table, problem.root)
            .is_some_and(|r| r.contains(0));
        if !admits_zero {
            self.statistics.nodes_pruned += 1;
            return Ok(Step::Exhausted);
        }

        if depth >= problem.input_count {
            self.statistics.leaves_evaluated += 1;
            // A runtime fault rejects only this candidate
            let accepted = evaluate(&problem.table, digits, problem.root) == Ok(0);
            return Ok(if accepted { Step::Found } else { Step::Exhausted });
        }

        let key = if self.use_cache {
            self.cache_key(depth, ranges)
        } else {
            None
        };
        if key.as_ref().is_some_and(|k| self.failed.contains(k)) {
            self.statistics.cache_hits += 1;
            return Ok(Step::Exhausted);
        }

        for digit in self.objective.digit_order() {
            let refined = self.analyzer.refine(ranges, digits, depth, digit);
            digits.push(digit);
            match self.dfs(digits, &refined)? {
                Step::Found => return Ok(Step::Found),
                Step::Abandoned => {
                    digits.pop();
                    return Ok(Step::Abandoned);
                }
                Step::Exhausted => {
                    digits.pop();
                }
            }
        }

        if let Some(key) = key {
            self.failed.insert(key);
        }
        Ok(Step::Exhausted)
    }
}

/// Sequential search on the calling thread
pub fn run_search(
    problem: &Problem,
    objective: Objective,
    config: &SolverConfig,
    deadline: Option<Instant>,
) -> Result<SolverOutcome, SolveError> {
    let mut search = DigitSearch::new(problem, objective, config, deadline);
    let outcome = search.run_from(&[]);
    let statistics = search.take_statistics();
    debug!(
        visited = statistics.nodes_visited,
        pruned = statistics.nodes_pruned,
        cache_hits = statistics.cache_hits,
        "sequential search finished"
    );
    match outcome? {
        SearchOutcome::Found(digits) => Ok(SolverOutcome { digits, statistics }),
        SearchOutcome::Exhausted | SearchOutcome::Abandoned => Err(SolveError::NoSolution),
    }
}
