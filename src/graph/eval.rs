//! Concrete evaluation of the expression graph

use crate::error::EvalError;
use crate::graph::node::{Node, NodeRef};
use crate::graph::table::NodeTable;

/// Evaluate every node reachable from `roots` on the given digits.
///
/// Nodes are visited in creation order; the returned vector is indexed by
/// slot and holds `None` for slots that were not evaluated.
pub fn evaluate_all(
    table: &NodeTable,
    digits: &[u8],
    roots: &[NodeRef],
) -> Result<Vec<Option<i64>>, EvalError> {
    let mut values = vec![None; table.len()];
    for r in table.live_nodes(roots) {
        let value = match table.get(r) {
            Node::Input(i) => digits
                .get(i)
                .map(|d| i64::from(*d))
                .ok_or(EvalError::MissingInput(i))?,
            Node::Constant(v) => v,
            Node::Binary { op, lhs, rhs } => {
                let (Some(a), Some(b)) = (values[lhs.index()], values[rhs.index()]) else {
                    unreachable!("operands precede their users");
                };
                op.apply(a, b)?
            }
        };
        values[r.index()] = Some(value);
    }
    Ok(values)
}

/// Evaluate the value of `root` on the given digits
pub fn evaluate(table: &NodeTable, digits: &[u8], root: NodeRef) -> Result<i64, EvalError> {
    let root = table.resolve(root);
    let values = evaluate_all(table, digits, &[root])?;
    Ok(values[root.index()].unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BinaryOp;

    #[test]
    fn test_evaluate_expression() {
        let mut table = NodeTable::new();
        let a = table.intern(Node::Input(0));
        let b = table.intern(Node::Input(1));
        let c = table.intern(Node::Constant(26));
        let product = table.intern(Node::Binary {
            op: BinaryOp::Mul,
            lhs: a,
            rhs: c,
        });
        let root = table.intern(Node::Binary {
            op: BinaryOp::Add,
            lhs: product,
            rhs: b,
        });
        assert_eq!(evaluate(&table, &[3, 4], root), Ok(82));
    }

    #[test]
    fn test_evaluate_propagates_runtime_errors() {
        let mut table = NodeTable::new();
        let a = table.intern(Node::Input(0));
        let b = table.intern(Node::Input(1));
        let zero = table.intern(Node::Constant(0));
        let diff = table.intern(Node::Binary {
            op: BinaryOp::Mul,
            lhs: b,
            rhs: zero,
        });
        let root = table.intern(Node::Binary {
            op: BinaryOp::Div,
            lhs: a,
            rhs: diff,
        });
        assert_eq!(evaluate(&table, &[5, 5], root), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_evaluate_missing_input() {
        let mut table = NodeTable::new();
        let root = table.intern(Node::Input(2));
        assert_eq!(evaluate(&table, &[1, 1], root), Err(EvalError::MissingInput(2)));
    }

    #[test]
    fn test_evaluate_follows_forwards() {
        let mut table = NodeTable::new();
        let a = table.intern(Node::Input(0));
        let one = table.intern(Node::Constant(1));
        let root = table.intern(Node::Binary {
            op: BinaryOp::Mul,
            lhs: a,
            rhs: one,
        });
        table.forward_to(root, a);
        assert_eq!(evaluate(&table, &[8], root), Ok(8));
    }
}
