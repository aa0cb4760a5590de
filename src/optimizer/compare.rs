//! Comparison resolution and range constant propagation

use crate::analysis::RangeTable;
use crate::error::EvalError;
use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::BinaryOp;
use crate::optimizer::{cone_may_fault, node_range, Pass};
use tracing::trace;

/// Decides `eql` nodes whose operands are identical or have disjoint ranges
pub struct CompareResolution;

impl Pass for CompareResolution {
    fn name(&self) -> &'static str {
        "compare"
    }

    fn run(
        &self,
        table: &mut NodeTable,
        ranges: &RangeTable,
        live: &[NodeRef],
    ) -> Result<usize, EvalError> {
        let mut rewrites = 0;
        for &r in live {
            if !table.is_canonical(r) {
                continue;
            }
            let Node::Binary {
                op: BinaryOp::Eql,
                lhs,
                rhs,
            } = table.get(r)
            else {
                continue;
            };
            let value = if lhs == rhs {
                Some(1)
            } else {
                match (node_range(table, ranges, lhs), node_range(table, ranges, rhs)) {
                    (Some(a), Some(b)) if a.is_disjoint(b) => Some(0),
                    _ => None,
                }
            };
            if let Some(value) = value {
                if cone_may_fault(table, ranges, lhs) || cone_may_fault(table, ranges, rhs) {
                    continue;
                }
                if table.rewrite_to_constant(r, value) {
                    trace!(node = %r, value, "comparison resolved");
                    rewrites += 1;
                }
            }
        }
        Ok(rewrites)
    }
}

/// Replaces nodes whose range is a single value by that constant.
///
/// Nodes whose cone contains a division or modulo that may fault are left
/// alone so the fault stays observable.
pub struct RangePropagation;

impl Pass for RangePropagation {
    fn name(&self) -> &'static str {
        "range"
    }

    fn run(
        &self,
        table: &mut NodeTable,
        ranges: &RangeTable,
        live: &[NodeRef],
    ) -> Result<usize, EvalError> {
        let mut rewrites = 0;
        for &r in live {
            if !table.is_canonical(r) {
                continue;
            }
            if !table.get(r).is_binary() {
                continue;
            }
            let Some(value) = ranges.get(r).and_then(|range| range.as_exact()) else {
                continue;
            };
            if cone_may_fault(table, ranges, r) {
                continue;
            }
            if table.rewrite_to_constant(r, value) {
                trace!(node = %r, value, "range collapsed to a constant");
                rewrites += 1;
            }
        }
        Ok(rewrites)
    }
}
