//! Constant folding

use crate::analysis::RangeTable;
use crate::error::EvalError;
use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::BinaryOp;
use crate::optimizer::Pass;
use tracing::trace;

/// Replaces binary nodes with two constant operands by their value.
///
/// Also rejects a constant zero divisor or a constant non-positive modulus
/// anywhere in the table, live or not: the instruction runs whether or not
/// its result is read.
pub struct ConstantFold;

impl Pass for ConstantFold {
    fn name(&self) -> &'static str {
        "fold"
    }

    fn run(
        &self,
        table: &mut NodeTable,
        _ranges: &RangeTable,
        _live: &[NodeRef],
    ) -> Result<usize, EvalError> {
        let mut rewrites = 0;
        for i in 0..table.len() {
            let r = NodeRef(i as u32);
            if !table.is_canonical(r) {
                continue;
            }
            let Node::Binary { op, lhs, rhs } = table.get(r) else {
                continue;
            };
            let divisor = table.constant(rhs);
            match (op, divisor) {
                (BinaryOp::Div, Some(0)) => return Err(EvalError::DivisionByZero),
                (BinaryOp::Mod, Some(m)) if m <= 0 => return Err(EvalError::NonPositiveModulus(m)),
                _ => {}
            }
            if let (Some(a), Some(b)) = (table.constant(lhs), divisor) {
                let value = op.apply(a, b)?;
                if table.rewrite_to_constant(r, value) {
                    trace!(node = %r, "{} {} {} folded to {}", op, a, b, value);
                    rewrites += 1;
                }
            }
        }
        Ok(rewrites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(table: &mut NodeTable, op: BinaryOp, lhs: NodeRef, rhs: NodeRef) -> NodeRef {
        table.intern(Node::Binary { op, lhs, rhs })
    }

    fn run(table: &mut NodeTable) -> Result<usize, EvalError> {
        ConstantFold.run(table, &RangeTable::default(), &[])
    }

    #[test]
    fn test_folds_chains_in_one_sweep() {
        let mut table = NodeTable::new();
        let a = table.intern(Node::Constant(-7));
        let b = table.intern(Node::Constant(2));
        let quotient = binary(&mut table, BinaryOp::Div, a, b);
        let remainder = binary(&mut table, BinaryOp::Mod, quotient, b);

        assert_eq!(run(&mut table), Ok(2));
        assert_eq!(table.constant(quotient), Some(-3));
        assert_eq!(table.constant(remainder), Some(1));
        assert_eq!(run(&mut table), Ok(0));
    }

    #[test]
    fn test_division_by_constant_zero_is_rejected() {
        let mut table = NodeTable::new();
        let x = table.intern(Node::Input(0));
        let zero = table.intern(Node::Constant(0));
        binary(&mut table, BinaryOp::Div, x, zero);
        assert_eq!(run(&mut table), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_negative_modulus_is_rejected() {
        let mut table = NodeTable::new();
        let x = table.intern(Node::Input(0));
        let m = table.intern(Node::Constant(-26));
        binary(&mut table, BinaryOp::Mod, x, m);
        assert_eq!(run(&mut table), Err(EvalError::NonPositiveModulus(-26)));
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut table = NodeTable::new();
        let a = table.intern(Node::Constant(i64::MAX));
        let b = table.intern(Node::Constant(2));
        binary(&mut table, BinaryOp::Mul, a, b);
        assert!(matches!(run(&mut table), Err(EvalError::Overflow { .. })));
    }
}
