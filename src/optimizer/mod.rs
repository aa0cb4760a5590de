//! Graph simplification run to a fixpoint
//!
//! Each iteration recomputes node ranges, runs the rewrite passes in order
//! and re-hash-conses the table. The loop stops once an iteration changes
//! nothing or the iteration bound is reached.

pub mod compare;
pub mod fold;
pub mod identity;
pub mod program;

use crate::analysis::{analyze, Range, RangeTable};
use crate::error::EvalError;
use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::BinaryOp;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

pub use compare::{CompareResolution, RangePropagation};
pub use fold::ConstantFold;
pub use identity::IdentityElimination;
pub use program::{
    eliminate_dead_stores, remove_no_ops, simplify_program, trace_registers, KnownValue,
    ProgramReport, RegisterTrace, TraceStep,
};

/// A rewrite pass over the node table
pub trait Pass {
    /// Short name used in reports
    fn name(&self) -> &'static str;

    /// Apply the pass once, returning the number of rewritten nodes.
    ///
    /// `ranges` and `live` were computed at the start of the iteration;
    /// nodes rewritten since then are no longer canonical and are skipped.
    fn run(
        &self,
        table: &mut NodeTable,
        ranges: &RangeTable,
        live: &[NodeRef],
    ) -> Result<usize, EvalError>;
}

/// In-place replacement for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Forward to an operand holding the same value
    Forward(NodeRef),
    Constant(i64),
}

pub(crate) fn apply_rewrite(table: &mut NodeTable, r: NodeRef, rewrite: Rewrite) -> bool {
    match rewrite {
        Rewrite::Forward(target) => table.forward_to(r, target),
        Rewrite::Constant(value) => table.rewrite_to_constant(r, value),
    }
}

/// Range of `r`, treating constants created during this iteration as exact
pub(crate) fn node_range(table: &NodeTable, ranges: &RangeTable, r: NodeRef) -> Option<Range> {
    match table.constant(r) {
        Some(v) => Some(Range::exact(v)),
        None => ranges.of(table, r),
    }
}

/// Whether a division or modulo with this divisor can fault
fn divisor_may_fault(
    table: &NodeTable,
    ranges: &RangeTable,
    op: BinaryOp,
    divisor: NodeRef,
) -> bool {
    let range = node_range(table, ranges, divisor);
    match op {
        BinaryOp::Div => range.is_none_or(|d| d.contains(0)),
        BinaryOp::Mod => range.is_none_or(|d| d.min <= 0),
        _ => false,
    }
}

/// Whether evaluating `r` can fault anywhere in its cone.
///
/// A node replaced by a constant no longer evaluates its operands, so any
/// rewrite to a constant must check this first.
pub(crate) fn cone_may_fault(table: &NodeTable, ranges: &RangeTable, r: NodeRef) -> bool {
    table
        .live_nodes(&[r])
        .into_iter()
        .any(|n| match table.get(n) {
            Node::Binary { op, rhs, .. } => divisor_may_fault(table, ranges, op, rhs),
            _ => false,
        })
}

/// Configuration for the graph optimizer
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Upper bound on fixpoint iterations
    pub max_iterations: usize,
    /// Whether nodes with a single-valued range become constants
    pub range_propagation: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 32,
            range_propagation: true,
        }
    }
}

impl OptimizerConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_range_propagation(mut self, enabled: bool) -> Self {
        self.range_propagation = enabled;
        self
    }
}

/// Summary of an optimizer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    pub iterations: usize,
    /// Rewrites per pass name, including `cse` for canonicalization merges
    pub rewrites: BTreeMap<&'static str, usize>,
    pub live_before: usize,
    pub live_after: usize,
    pub reached_fixpoint: bool,
}

impl OptimizeReport {
    pub fn total_rewrites(&self) -> usize {
        self.rewrites.values().sum()
    }

    pub fn rewrites_for(&self, pass: &str) -> usize {
        self.rewrites.get(pass).copied().unwrap_or(0)
    }
}

impl fmt::Display for OptimizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  Iterations: {}{}",
            self.iterations,
            if self.reached_fixpoint { "" } else { " (bound reached)" }
        )?;
        writeln!(f, "  Live nodes: {} -> {}", self.live_before, self.live_after)?;
        for (pass, count) in &self.rewrites {
            writeln!(f, "  Rewrites ({}): {}", pass, count)?;
        }
        Ok(())
    }
}

/// Simplify the nodes reachable from `roots` until nothing changes
pub fn optimize(
    table: &mut NodeTable,
    roots: &[NodeRef],
    config: &OptimizerConfig,
) -> Result<OptimizeReport, EvalError> {
    let mut passes: Vec<Box<dyn Pass>> = vec![
        Box::new(ConstantFold),
        Box::new(IdentityElimination),
        Box::new(CompareResolution),
    ];
    if config.range_propagation {
        passes.push(Box::new(RangePropagation));
    }

    let mut report = OptimizeReport {
        live_before: table.live_nodes(roots).len(),
        ..Default::default()
    };
    for pass in &passes {
        report.rewrites.insert(pass.name(), 0);
    }
    report.rewrites.insert("cse", 0);

    // The fold pass always runs once so constant faults are reported
    for iteration in 0..config.max_iterations.max(1) {
        let live = table.live_nodes(roots);
        let ranges = analyze(table, roots);

        let mut changed = 0;
        for pass in &passes {
            let count = pass.run(table, &ranges, &live)?;
            *report.rewrites.entry(pass.name()).or_default() += count;
            changed += count;
        }
        let merged = table.canonicalize();
        *report.rewrites.entry("cse").or_default() += merged;
        changed += merged;

        report.iterations = iteration + 1;
        debug!(iteration, changed, live = live.len(), "optimizer iteration");
        if changed == 0 {
            report.reached_fixpoint = true;
            break;
        }
    }

    if !report.reached_fixpoint {
        warn!(
            iterations = report.iterations,
            "optimizer stopped before reaching a fixpoint"
        );
    }
    report.live_after = table.live_nodes(roots).len();
    Ok(report)
}
