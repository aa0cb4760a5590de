//! Interval analysis over the expression graph
//!
//! Every node gets an inclusive `[min, max]` bound that contains each value
//! the node can take for digits in `1..=9`. Bound arithmetic saturates; a
//! value that would overflow faults at runtime, so it never needs covering.

use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::BinaryOp;
use std::fmt;

/// Inclusive integer interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub const DIGIT: Range = Range { min: 1, max: 9 };
    pub const BOOLEAN: Range = Range { min: 0, max: 1 };

    pub fn new(min: i64, max: i64) -> Self {
        debug_assert!(min <= max, "empty range [{}, {}]", min, max);
        Self { min, max }
    }

    pub fn exact(value: i64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// The single value of the range, if it has one
    pub fn as_exact(&self) -> Option<i64> {
        (self.min == self.max).then_some(self.min)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_within(&self, other: Range) -> bool {
        other.min <= self.min && self.max <= other.max
    }

    pub fn is_disjoint(&self, other: Range) -> bool {
        self.max < other.min || other.max < self.min
    }

    pub fn is_boolean(&self) -> bool {
        self.is_within(Range::BOOLEAN)
    }

    pub fn is_non_negative(&self) -> bool {
        self.min >= 0
    }

    pub fn is_non_positive(&self) -> bool {
        self.max <= 0
    }

    pub fn excludes_zero(&self) -> bool {
        !self.contains(0)
    }

    fn hull(values: impl IntoIterator<Item = i64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Range::exact(v)),
            Some(r) => Some(Range::new(r.min.min(v), r.max.max(v))),
        })
    }

    fn union(self, other: Range) -> Self {
        Range::new(self.min.min(other.min), self.max.max(other.max))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

fn saturating_div(a: i64, b: i64) -> i64 {
    a.checked_div(b).unwrap_or(i64::MAX)
}

fn div_corners(dividend: Range, divisor: Range) -> Range {
    let corners = [
        saturating_div(dividend.min, divisor.min),
        saturating_div(dividend.min, divisor.max),
        saturating_div(dividend.max, divisor.min),
        saturating_div(dividend.max, divisor.max),
    ];
    Range::hull(corners).unwrap_or(dividend)
}

fn div_range(dividend: Range, divisor: Range) -> Range {
    let negative = (divisor.min <= -1).then(|| Range::new(divisor.min, divisor.max.min(-1)));
    let positive = (divisor.max >= 1).then(|| Range::new(divisor.min.max(1), divisor.max));
    match (negative, positive) {
        (Some(n), Some(p)) => div_corners(dividend, n).union(div_corners(dividend, p)),
        (Some(n), None) => div_corners(dividend, n),
        (None, Some(p)) => div_corners(dividend, p),
        (None, None) => {
            let m = dividend.min.saturating_abs().max(dividend.max.saturating_abs());
            Range::new(-m, m)
        }
    }
}

fn mod_range(dividend: Range, modulus: Range) -> Range {
    if let (Some(a), Some(m)) = (dividend.as_exact(), modulus.as_exact()) {
        if m > 0 {
            return Range::exact(a.rem_euclid(m));
        }
    }
    if let Some(m) = modulus.as_exact() {
        if m > 0 && dividend.is_within(Range::new(0, m - 1)) {
            return dividend;
        }
    }
    let mut upper = modulus.max.saturating_sub(1).max(0);
    if dividend.is_non_negative() {
        upper = upper.min(dividend.max);
    }
    Range::new(0, upper)
}

fn eql_range(a: Range, b: Range) -> Range {
    match (a.as_exact(), b.as_exact()) {
        (Some(x), Some(y)) if x == y => Range::exact(1),
        _ if a.is_disjoint(b) => Range::exact(0),
        _ => Range::BOOLEAN,
    }
}

/// Interval of `op` applied to operands in `a` and `b`
pub fn transfer(op: BinaryOp, a: Range, b: Range) -> Range {
    match op {
        BinaryOp::Add => Range::new(a.min.saturating_add(b.min), a.max.saturating_add(b.max)),
        BinaryOp::Mul => {
            let corners = [
                a.min.saturating_mul(b.min),
                a.min.saturating_mul(b.max),
                a.max.saturating_mul(b.min),
                a.max.saturating_mul(b.max),
            ];
            Range::hull(corners).unwrap_or(a)
        }
        BinaryOp::Div => div_range(a, b),
        BinaryOp::Mod => mod_range(a, b),
        BinaryOp::Eql => eql_range(a, b),
    }
}

/// Interval per node, indexed by canonical slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeTable {
    ranges: Vec<Option<Range>>,
}

impl RangeTable {
    /// Range of a canonical node, if it was analyzed
    pub fn get(&self, r: NodeRef) -> Option<Range> {
        self.ranges.get(r.index()).copied().flatten()
    }

    /// Range of whatever node `r` currently stands for
    pub fn of(&self, table: &NodeTable, r: NodeRef) -> Option<Range> {
        self.get(table.resolve(r))
    }

    /// Number of analyzed nodes
    pub fn len(&self) -> usize {
        self.ranges.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Range analysis over a fixed set of live nodes, with support for pinning
/// inputs to concrete digits.
#[derive(Debug, Clone)]
pub struct RangeAnalyzer<'a> {
    table: &'a NodeTable,
    order: Vec<NodeRef>,
    /// Position in `order` of each `Input(i)` node
    input_positions: Vec<Option<usize>>,
}

impl<'a> RangeAnalyzer<'a> {
    pub fn new(table: &'a NodeTable, roots: &[NodeRef]) -> Self {
        let order = table.live_nodes(roots);
        let mut input_positions = Vec::new();
        for (position, r) in order.iter().enumerate() {
            if let Node::Input(i) = table.get(*r) {
                if input_positions.len() <= i {
                    input_positions.resize(i + 1, None);
                }
                input_positions[i] = Some(position);
            }
        }
        Self {
            table,
            order,
            input_positions,
        }
    }

    pub fn table(&self) -> &'a NodeTable {
        self.table
    }

    fn compute(&self, ranges: &mut RangeTable, pinned: &[u8], from: usize) {
        for r in &self.order[from..] {
            let range = match self.table.get(*r) {
                Node::Input(i) => pinned
                    .get(i)
                    .map(|d| Range::exact(i64::from(*d)))
                    .unwrap_or(Range::DIGIT),
                Node::Constant(v) => Range::exact(v),
                Node::Binary { op, lhs, rhs } => {
                    match (ranges.get(lhs), ranges.get(rhs)) {
                        (Some(a), Some(b)) => transfer(op, a, b),
                        _ => unreachable!("operands precede their users"),
                    }
                }
            };
            ranges.ranges[r.index()] = Some(range);
        }
    }

    /// Ranges with every input free in `1..=9`
    pub fn analyze(&self) -> RangeTable {
        self.analyze_pinned(&[])
    }

    /// Ranges with inputs `0..pinned.len()` fixed to the given digits
    pub fn analyze_pinned(&self, pinned: &[u8]) -> RangeTable {
        let mut ranges = RangeTable {
            ranges: vec![None; self.table.len()],
        };
        self.compute(&mut ranges, pinned, 0);
        ranges
    }

    /// Refine `base` by pinning input `input` to `digit`.
    ///
    /// `pinned` holds the digits already fixed in `base`, so the result has
    /// inputs `0..=input` pinned. Only nodes created after `Input(input)` are
    /// recomputed.
    pub fn refine(&self, base: &RangeTable, pinned: &[u8], input: usize, digit: u8) -> RangeTable {
        let mut ranges = base.clone();
        let Some(Some(position)) = self.input_positions.get(input).copied() else {
            return ranges;
        };
        let mut digits = pinned.to_vec();
        digits.resize(input, 0);
        digits.push(digit);
        self.compute(&mut ranges, &digits, position);
        ranges
    }
}

/// Ranges of every node reachable from `roots`
pub fn analyze(table: &NodeTable, roots: &[NodeRef]) -> RangeTable {
    RangeAnalyzer::new(table, roots).analyze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::graph::evaluate_all;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_add_and_mul() {
        let a = Range::new(-2, 3);
        let b = Range::new(4, 5);
        assert_eq!(transfer(BinaryOp::Add, a, b), Range::new(2, 8));
        assert_eq!(transfer(BinaryOp::Mul, a, b), Range::new(-10, 15));
    }

    #[test]
    fn test_saturation() {
        let big = Range::new(i64::MAX - 1, i64::MAX);
        assert_eq!(transfer(BinaryOp::Add, big, Range::exact(10)).max, i64::MAX);
        assert_eq!(transfer(BinaryOp::Mul, big, Range::exact(-2)).min, i64::MIN);
    }

    #[test]
    fn test_div_excludes_zero_divisor() {
        assert_eq!(
            transfer(BinaryOp::Div, Range::new(0, 100), Range::exact(26)),
            Range::new(0, 3)
        );
        // Divisor spans zero: only +-1 and the outer bounds matter
        assert_eq!(
            transfer(BinaryOp::Div, Range::new(10, 20), Range::new(-2, 5)),
            Range::new(-20, 20)
        );
        assert_eq!(
            transfer(BinaryOp::Div, Range::new(-7, 3), Range::exact(0)),
            Range::new(-7, 7)
        );
        // Truncation toward zero
        assert_eq!(
            transfer(BinaryOp::Div, Range::new(-7, -7), Range::exact(2)),
            Range::exact(-3)
        );
    }

    #[test]
    fn test_mod_ranges() {
        assert_eq!(
            transfer(BinaryOp::Mod, Range::exact(-3), Range::exact(26)),
            Range::exact(23)
        );
        assert_eq!(
            transfer(BinaryOp::Mod, Range::new(1, 9), Range::exact(26)),
            Range::new(1, 9)
        );
        assert_eq!(
            transfer(BinaryOp::Mod, Range::new(-100, 100), Range::exact(26)),
            Range::new(0, 25)
        );
        assert_eq!(
            transfer(BinaryOp::Mod, Range::new(0, 40), Range::exact(26)),
            Range::new(0, 25)
        );
        assert_eq!(
            transfer(BinaryOp::Mod, Range::new(3, 12), Range::new(2, 100)),
            Range::new(0, 12)
        );
    }

    #[test]
    fn test_eql_ranges() {
        assert_eq!(
            transfer(BinaryOp::Eql, Range::exact(4), Range::exact(4)),
            Range::exact(1)
        );
        assert_eq!(
            transfer(BinaryOp::Eql, Range::new(10, 35), Range::DIGIT),
            Range::exact(0)
        );
        assert_eq!(
            transfer(BinaryOp::Eql, Range::new(0, 25), Range::DIGIT),
            Range::BOOLEAN
        );
    }

    #[test]
    fn test_refine_matches_full_pinned_analysis() {
        let program = "inp w\nmul z 26\nadd z w\ninp w\nadd x z\nmod x 26\ndiv z 26\n\
                       add x -4\neql x w\neql x 0\nmul x 25\nadd x 1\nmul z x\nadd z w";
        let built = build(&program.parse().unwrap()).unwrap();
        let root = built.root();
        let analyzer = RangeAnalyzer::new(&built.table, &[root]);

        let base = analyzer.analyze();
        let one = analyzer.refine(&base, &[], 0, 7);
        assert_eq!(one, analyzer.analyze_pinned(&[7]));
        let two = analyzer.refine(&one, &[7], 1, 3);
        assert_eq!(two, analyzer.analyze_pinned(&[7, 3]));
        assert_eq!(two.get(root).and_then(|r| r.as_exact()), Some(3));
    }

    #[test]
    fn test_ranges_contain_sampled_values() {
        let program = "inp w\nmul x 0\nadd x z\nmod x 26\ndiv z 1\nadd x 13\neql x w\n\
                       eql x 0\nmul y 0\nadd y 25\nmul y x\nadd y 1\nmul z y\nmul y 0\n\
                       add y w\nadd y 6\nmul y x\nadd z y\ninp w\nmul x 0\nadd x z\n\
                       mod x 26\ndiv z 26\nadd x -2\neql x w\neql x 0\nmul y 0\nadd y 25\n\
                       mul y x\nadd y 1\nmul z y\nmul y 0\nadd y w\nadd y 4\nmul y x\nadd z y";
        let built = build(&program.parse().unwrap()).unwrap();
        let root = built.root();
        let ranges = analyze(&built.table, &[root]);
        let mut rng = ChaCha8Rng::seed_from_u64(24);

        for _ in 0..200 {
            let digits: Vec<u8> = (0..2).map(|_| rng.random_range(1..=9)).collect();
            let values = evaluate_all(&built.table, &digits, &[root]).unwrap();
            for r in built.table.live_nodes(&[root]) {
                let value = values[r.index()].unwrap();
                let range = ranges.get(r).unwrap();
                assert!(range.contains(value), "{} = {} outside {}", r, value, range);
            }
        }
    }
}
