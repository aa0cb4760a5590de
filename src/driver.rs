//! End-to-end pipeline: build, optimize, solve, verify

use crate::builder::build;
use crate::error::{Error, Result};
use crate::ir::Program;
use crate::optimizer::{optimize, OptimizeReport, OptimizerConfig};
use crate::semantics::accepts;
use crate::solver::{
    solve_expression_with_stats, Objective, Problem, SolveStatistics, SolverConfig, Strategy,
};
use std::sync::Arc;
use tracing::info;

/// Configuration for a whole pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub optimizer: OptimizerConfig,
    pub solver: SolverConfig,
}

impl PipelineConfig {
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// A program compiled to an optimized graph
#[derive(Debug, Clone)]
pub struct Compiled {
    pub problem: Arc<Problem>,
    pub report: OptimizeReport,
}

/// A verified model number
#[derive(Debug, Clone)]
pub struct Solution {
    pub digits: Vec<u8>,
    pub objective: Objective,
    pub strategy: Strategy,
    pub optimize_report: OptimizeReport,
    pub statistics: SolveStatistics,
}

impl Solution {
    pub fn digit_string(&self) -> String {
        digit_string(&self.digits)
    }
}

fn digit_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Build and optimize `program`.
///
/// Constant division by zero or a non-positive constant modulus anywhere in
/// the program is reported here, before any solving.
pub fn compile(program: &Program, config: &OptimizerConfig) -> Result<Compiled> {
    let mut built = build(program)?;
    info!(
        instructions = program.len(),
        inputs = built.input_count(),
        nodes = built.table.len(),
        "built expression graph"
    );

    let root = built.root();
    let report = optimize(&mut built.table, &[root], config)?;
    info!(
        iterations = report.iterations,
        rewrites = report.total_rewrites(),
        live_before = report.live_before,
        live_after = report.live_after,
        "optimized expression graph"
    );

    Ok(Compiled {
        problem: Arc::new(Problem::from_built(built, program)),
        report,
    })
}

/// Solve an already compiled program, verifying against `program`
pub fn solve_compiled(
    program: &Program,
    compiled: &Compiled,
    objective: Objective,
    config: &SolverConfig,
) -> Result<Solution> {
    let outcome = solve_expression_with_stats(&compiled.problem, objective, config)?;

    if !accepts(program, &outcome.digits) {
        return Err(Error::Verification {
            digits: digit_string(&outcome.digits),
        });
    }

    let solution = Solution {
        strategy: outcome.statistics.strategy,
        digits: outcome.digits,
        objective,
        optimize_report: compiled.report.clone(),
        statistics: outcome.statistics,
    };
    info!(
        %objective,
        digits = %solution.digit_string(),
        strategy = %solution.strategy,
        "verified model number"
    );
    Ok(solution)
}

/// Run the full pipeline with explicit configuration
pub fn solve_with_config(
    program: &Program,
    objective: Objective,
    config: &PipelineConfig,
) -> Result<Solution> {
    let compiled = compile(program, &config.optimizer)?;
    solve_compiled(program, &compiled, objective, &config.solver)
}

/// Extremal model number of `program` as a digit string
pub fn solve(program: &Program, objective: Objective) -> Result<String> {
    solve_with_config(program, objective, &PipelineConfig::default())
        .map(|solution| solution.digit_string())
}
