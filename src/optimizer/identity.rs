//! Algebraic identity elimination

use crate::analysis::{Range, RangeTable};
use crate::error::EvalError;
use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::BinaryOp;
use crate::optimizer::{apply_rewrite, cone_may_fault, node_range, Pass, Rewrite};
use tracing::trace;

pub struct IdentityElimination;

fn simplify(
    table: &NodeTable,
    ranges: &RangeTable,
    op: BinaryOp,
    lhs: NodeRef,
    rhs: NodeRef,
) -> Option<Rewrite> {
    let lc = table.constant(lhs);
    let rc = table.constant(rhs);
    let lhs_range = node_range(table, ranges, lhs);
    let rhs_range = node_range(table, ranges, rhs);

    match op {
        BinaryOp::Add => match (lc, rc) {
            (Some(0), _) => Some(Rewrite::Forward(rhs)),
            (_, Some(0)) => Some(Rewrite::Forward(lhs)),
            _ => None,
        },
        BinaryOp::Mul => match (lc, rc) {
            (Some(0), _) | (_, Some(0)) => Some(Rewrite::Constant(0)),
            (Some(1), _) => Some(Rewrite::Forward(rhs)),
            (_, Some(1)) => Some(Rewrite::Forward(lhs)),
            _ => None,
        },
        BinaryOp::Div => {
            if rc == Some(1) {
                return Some(Rewrite::Forward(lhs));
            }
            let divisor_nonzero = rhs_range.is_some_and(|r| r.excludes_zero());
            if lc == Some(0) && divisor_nonzero {
                return Some(Rewrite::Constant(0));
            }
            match (rc, lhs_range) {
                (Some(d), Some(a)) if d > 0 && a.is_within(Range::new(0, d - 1)) => {
                    Some(Rewrite::Constant(0))
                }
                _ => None,
            }
        }
        BinaryOp::Mod => match (rc, lhs_range) {
            (Some(m), Some(a)) if m > 0 && a.is_within(Range::new(0, m - 1)) => {
                Some(Rewrite::Forward(lhs))
            }
            _ => None,
        },
        BinaryOp::Eql => {
            if rc == Some(1) && lhs_range.is_some_and(|r| r.is_boolean()) {
                Some(Rewrite::Forward(lhs))
            } else if lc == Some(1) && rhs_range.is_some_and(|r| r.is_boolean()) {
                Some(Rewrite::Forward(rhs))
            } else {
                None
            }
        }
    }
}

impl Pass for IdentityElimination {
    fn name(&self) -> &'static str {
        "identity"
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
            let Node::Binary { op, lhs, rhs } = table.get(r) else {
                continue;
            };
            if let Some(rewrite) = simplify(table, ranges, op, lhs, rhs) {
                // A constant no longer evaluates the operands it replaces
                if matches!(rewrite, Rewrite::Constant(_)) && cone_may_fault(table, ranges, r) {
                    continue;
                }
                if apply_rewrite(table, r, rewrite) {
                    trace!(node = %r, ?rewrite, "identity");
                    rewrites += 1;
                }
            }
        }
        Ok(rewrites)
    }
}
