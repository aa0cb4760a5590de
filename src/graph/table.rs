//! Hash-consed node table
//!
//! Slots are appended and never removed. The optimizer rewrites a slot in
//! place, either by giving it new constant content or by forwarding it to an
//! earlier slot holding an equivalent value. Every operand of a node lives in
//! an earlier slot, so a single forward or backward sweep visits nodes in
//! dependency order.

use crate::graph::node::{Node, NodeRef};
use std::collections::HashMap;
use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: Vec<Node>,
    /// `forward[i] == i` marks a canonical slot; otherwise an earlier slot
    forward: Vec<NodeRef>,
    interned: HashMap<Node, NodeRef>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots ever created
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follow forwards to the canonical slot
    pub fn resolve(&self, mut r: NodeRef) -> NodeRef {
        loop {
            let next = self.forward[r.index()];
            if next == r {
                return r;
            }
            r = next;
        }
    }

    pub fn is_canonical(&self, r: NodeRef) -> bool {
        self.forward[r.index()] == r
    }

    /// Content of the canonical node `r` stands for, with operands resolved
    pub fn get(&self, r: NodeRef) -> Node {
        self.normalize(self.nodes[self.resolve(r).index()])
    }

    /// Raw slot content, without following forwards
    pub fn slot(&self, r: NodeRef) -> Node {
        self.nodes[r.index()]
    }

    /// Constant value of `r`, if it is one
    pub fn constant(&self, r: NodeRef) -> Option<i64> {
        self.get(r).as_constant()
    }

    fn normalize(&self, node: Node) -> Node {
        match node {
            Node::Binary { op, lhs, rhs } => {
                let lhs = self.resolve(lhs);
                let rhs = self.resolve(rhs);
                if op.is_commutative() && rhs < lhs {
                    Node::Binary {
                        op,
                        lhs: rhs,
                        rhs: lhs,
                    }
                } else {
                    Node::Binary { op, lhs, rhs }
                }
            }
            other => other,
        }
    }

    /// Return the slot holding `node`, creating it if no equal node exists
    pub fn intern(&mut self, node: Node) -> NodeRef {
        let node = self.normalize(node);
        if let Some(&existing) = self.interned.get(&node) {
            return self.resolve(existing);
        }
        let r = NodeRef::from_index(self.nodes.len());
        self.nodes.push(node);
        self.forward.push(r);
        self.interned.insert(node, r);
        r
    }

    /// Rewrite `r` to the constant `value`. Returns false when nothing changed.
    pub fn rewrite_to_constant(&mut self, r: NodeRef, value: i64) -> bool {
        let r = self.resolve(r);
        let constant = Node::Constant(value);
        if self.nodes[r.index()] == constant {
            return false;
        }
        if let Some(&existing) = self.interned.get(&constant) {
            let existing = self.resolve(existing);
            if existing < r {
                self.forward[r.index()] = existing;
                return true;
            }
        }
        self.nodes[r.index()] = constant;
        self.interned.insert(constant, r);
        true
    }

    /// Forward `r` to the earlier slot `target`. Returns false when nothing changed.
    pub fn forward_to(&mut self, r: NodeRef, target: NodeRef) -> bool {
        let r = self.resolve(r);
        let target = self.resolve(target);
        if target >= r {
            return false;
        }
        self.forward[r.index()] = target;
        true
    }

    /// Re-hash-cons the table in creation order, collapsing structurally
    /// identical nodes onto the earliest copy. Returns the number of merges.
    pub fn canonicalize(&mut self) -> usize {
        let mut merged = 0;
        self.interned.clear();
        for i in 0..self.nodes.len() {
            let r = NodeRef::from_index(i);
            if !self.is_canonical(r) {
                continue;
            }
            let node = self.normalize(self.nodes[i]);
            self.nodes[i] = node;
            match self.interned.get(&node) {
                Some(&existing) => {
                    self.forward[i] = existing;
                    merged += 1;
                }
                None => {
                    self.interned.insert(node, r);
                }
            }
        }
        merged
    }

    /// Canonical nodes reachable from `roots`, in creation order
    pub fn live_nodes(&self, roots: &[NodeRef]) -> Vec<NodeRef> {
        let mut marked = vec![false; self.nodes.len()];
        for root in roots {
            marked[self.resolve(*root).index()] = true;
        }
        for i in (0..self.nodes.len()).rev() {
            if !marked[i] {
                continue;
            }
            if let Some((lhs, rhs)) = self.nodes[i].operands() {
                marked[self.resolve(lhs).index()] = true;
                marked[self.resolve(rhs).index()] = true;
            }
        }
        marked
            .iter()
            .enumerate()
            .filter(|(_, live)| **live)
            .map(|(i, _)| NodeRef::from_index(i))
            .collect()
    }

    /// One line per live node, e.g. `n7 = add n3 n6`
    pub fn format_listing(&self, roots: &[NodeRef]) -> String {
        let mut out = String::new();
        for r in self.live_nodes(roots) {
            let _ = writeln!(out, "{} = {}", r, self.get(r));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BinaryOp;

    fn binary(op: BinaryOp, lhs: NodeRef, rhs: NodeRef) -> Node {
        Node::Binary { op, lhs, rhs }
    }

    #[test]
    fn test_intern_dedups() {
        let mut table = NodeTable::new();
        let a = table.intern(Node::Input(0));
        let b = table.intern(Node::Input(0));
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_commutative_operands_share_a_node() {
        let mut table = NodeTable::new();
        let x = table.intern(Node::Input(0));
        let c = table.intern(Node::Constant(5));
        let a = table.intern(binary(BinaryOp::Add, x, c));
        let b = table.intern(binary(BinaryOp::Add, c, x));
        assert_eq!(a, b);

        let d = table.intern(binary(BinaryOp::Div, x, c));
        let e = table.intern(binary(BinaryOp::Div, c, x));
        assert_ne!(d, e);
    }

    #[test]
    fn test_forward_and_resolve() {
        let mut table = NodeTable::new();
        let x = table.intern(Node::Input(0));
        let zero = table.intern(Node::Constant(0));
        let sum = table.intern(binary(BinaryOp::Add, x, zero));

        assert!(table.forward_to(sum, x));
        assert_eq!(table.resolve(sum), x);
        assert_eq!(table.get(sum), Node::Input(0));
        assert!(!table.forward_to(sum, x));
        // Forwards never point to later slots
        assert!(!table.forward_to(x, sum));
    }

    #[test]
    fn test_rewrite_to_existing_constant_forwards() {
        let mut table = NodeTable::new();
        let zero = table.intern(Node::Constant(0));
        let x = table.intern(Node::Input(0));
        let product = table.intern(binary(BinaryOp::Mul, x, zero));

        assert!(table.rewrite_to_constant(product, 0));
        assert_eq!(table.resolve(product), zero);
        assert!(!table.rewrite_to_constant(product, 0));
    }

    #[test]
    fn test_rewrite_to_new_constant_keeps_slot() {
        let mut table = NodeTable::new();
        let two = table.intern(Node::Constant(2));
        let three = table.intern(Node::Constant(3));
        let sum = table.intern(binary(BinaryOp::Add, two, three));

        assert!(table.rewrite_to_constant(sum, 5));
        assert_eq!(table.resolve(sum), sum);
        assert_eq!(table.constant(sum), Some(5));
        assert_eq!(table.intern(Node::Constant(5)), sum);
    }

    #[test]
    fn test_canonicalize_merges_after_forwarding() {
        let mut table = NodeTable::new();
        let x = table.intern(Node::Input(0));
        let one = table.intern(Node::Constant(1));
        let x_times_one = table.intern(binary(BinaryOp::Mul, x, one));
        let first = table.intern(binary(BinaryOp::Add, x, one));
        let second = table.intern(binary(BinaryOp::Add, x_times_one, one));
        assert_ne!(first, second);

        table.forward_to(x_times_one, x);
        assert_eq!(table.canonicalize(), 1);
        assert_eq!(table.resolve(second), first);
        assert_eq!(table.canonicalize(), 0);
    }

    #[test]
    fn test_live_nodes() {
        let mut table = NodeTable::new();
        let x = table.intern(Node::Input(0));
        let y = table.intern(Node::Input(1));
        let unused = table.intern(binary(BinaryOp::Mul, x, y));
        let c = table.intern(Node::Constant(26));
        let root = table.intern(binary(BinaryOp::Mod, y, c));

        let live = table.live_nodes(&[root]);
        assert_eq!(live, vec![y, c, root]);
        assert!(!live.contains(&unused));
        assert_eq!(table.format_listing(&[root]), "n1 = input[1]\nn3 = 26\nn4 = mod n1 n3\n");
    }
}
