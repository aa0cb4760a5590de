//! Expression node types

use crate::ir::BinaryOp;
use std::fmt;

/// Stable index of a slot in the node table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub u32);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeRef(index as u32)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Content of one node in the expression graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// The digit read by the `index`-th `inp` instruction
    Input(usize),
    Constant(i64),
    Binary {
        op: BinaryOp,
        lhs: NodeRef,
        rhs: NodeRef,
    },
}

impl Node {
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Node::Constant(v) => Some(*v),
            _ => None,
        }
    }

    /// Operands of a binary node
    pub fn operands(&self) -> Option<(NodeRef, NodeRef)> {
        match self {
            Node::Binary { lhs, rhs, .. } => Some((*lhs, *rhs)),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Node::Binary { .. })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Input(i) => write!(f, "input[{}]", i),
            Node::Constant(v) => write!(f, "{}", v),
            Node::Binary { op, lhs, rhs } => write!(f, "{} {} {}", op, lhs, rhs),
        }
    }
}
