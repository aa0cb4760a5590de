//! Structural reduction of `root == 0` into digit constraints
//!
//! The output condition is split into a conjunction of simpler goals, each
//! step keeping the conjunction equivalent to the original. Goals that end
//! up linear in the inputs become fixed digits or digit pairs; anything else
//! is left as a residual for the search.

use crate::analysis::{Range, RangeTable};
use crate::error::SolveError;
use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::BinaryOp;
use crate::solver::Objective;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::trace;

/// A condition on the value of one or two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    Zero(NodeRef),
    NonZero(NodeRef),
    Equal(NodeRef, NodeRef),
}

/// `input[left] == input[right] + offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitPair {
    pub left: usize,
    pub right: usize,
    pub offset: i64,
}

impl DigitPair {
    /// Extremal digits for the pair; both sides reach their extreme together
    pub fn digits(&self, objective: Objective) -> (u8, u8) {
        let offset = self.offset.clamp(-8, 8) as i8;
        let (left, right) = match objective {
            Objective::Max if offset >= 0 => (9, 9 - offset),
            Objective::Max => (9 + offset, 9),
            Objective::Min if offset >= 0 => (1 + offset, 1),
            Objective::Min => (1, 1 - offset),
        };
        (left as u8, right as u8)
    }
}

impl fmt::Display for DigitPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input[{}] = input[{}] {:+}", self.left, self.right, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Fixed { input: usize, digit: u8 },
    Pair(DigitPair),
}

impl Constraint {
    fn inputs(&self) -> Vec<usize> {
        match self {
            Constraint::Fixed { input, .. } => vec![*input],
            Constraint::Pair(pair) => vec![pair.left, pair.right],
        }
    }
}

/// Outcome of structural reduction
#[derive(Debug, Clone, Default)]
pub struct Reduction {
    pub constraints: Vec<Constraint>,
    /// Goals that could not be turned into digit constraints
    pub residual: Vec<Goal>,
}

impl Reduction {
    pub fn is_complete(&self) -> bool {
        self.residual.is_empty()
    }
}

/// `constant + sum(coefficient * input)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Linear {
    constant: i64,
    terms: BTreeMap<usize, i64>,
}

impl Linear {
    fn constant(value: i64) -> Self {
        Self {
            constant: value,
            terms: BTreeMap::new(),
        }
    }

    fn input(index: usize) -> Self {
        Self {
            constant: 0,
            terms: BTreeMap::from([(index, 1)]),
        }
    }

    fn add(&self, other: &Linear) -> Option<Linear> {
        let mut sum = self.clone();
        sum.constant = sum.constant.checked_add(other.constant)?;
        for (input, coefficient) in &other.terms {
            let entry = sum.terms.entry(*input).or_insert(0);
            *entry = entry.checked_add(*coefficient)?;
            if *entry == 0 {
                sum.terms.remove(input);
            }
        }
        Some(sum)
    }

    fn scale(&self, factor: i64) -> Option<Linear> {
        if factor == 0 {
            return Some(Linear::constant(0));
        }
        let mut terms = BTreeMap::new();
        for (input, coefficient) in &self.terms {
            terms.insert(*input, coefficient.checked_mul(factor)?);
        }
        Some(Linear {
            constant: self.constant.checked_mul(factor)?,
            terms,
        })
    }

    fn as_constant(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }
}

/// Linear form of every live node that has one, indexed by slot
fn linear_forms(table: &NodeTable, root: NodeRef) -> Vec<Option<Linear>> {
    let mut forms: Vec<Option<Linear>> = vec![None; table.len()];
    for r in table.live_nodes(&[root]) {
        let form = match table.get(r) {
            Node::Input(i) => Some(Linear::input(i)),
            Node::Constant(v) => Some(Linear::constant(v)),
            Node::Binary { op, lhs, rhs } => {
                match (&forms[lhs.index()], &forms[rhs.index()]) {
                    (Some(a), Some(b)) => match op {
                        BinaryOp::Add => a.add(b),
                        BinaryOp::Mul => match (a.as_constant(), b.as_constant()) {
                            (Some(c), _) => b.scale(c),
                            (_, Some(c)) => a.scale(c),
                            _ => None,
                        },
                        _ => None,
                    },
                    _ => None,
                }
            }
        };
        forms[r.index()] = form;
    }
    forms
}

enum Relation {
    Trivial,
    Constraint(Constraint),
    Residual,
}

/// The integer `v` with `a * v + c == 0`; any other case has no digit solution
fn integer_root(c: i64, a: i64) -> Result<i64, SolveError> {
    match (c.checked_rem(a), c.checked_div(a).and_then(i64::checked_neg)) {
        (Some(0), Some(v)) => Ok(v),
        _ => Err(SolveError::NoSolution),
    }
}

/// Interpret `e == 0` for a linear `e`
fn relation(e: &Linear) -> Result<Relation, SolveError> {
    let terms: Vec<(usize, i64)> = e.terms.iter().map(|(i, a)| (*i, *a)).collect();
    match terms.as_slice() {
        [] if e.constant == 0 => Ok(Relation::Trivial),
        [] => Err(SolveError::NoSolution),
        [(input, a)] => {
            let value = integer_root(e.constant, *a)?;
            if !Range::DIGIT.contains(value) {
                return Err(SolveError::NoSolution);
            }
            Ok(Relation::Constraint(Constraint::Fixed {
                input: *input,
                digit: value as u8,
            }))
        }
        [(left, a), (right, b)] if *a == -*b => {
            // a * (left - right) + c == 0
            let offset = integer_root(e.constant, *a)?;
            if !(-8..=8).contains(&offset) {
                return Err(SolveError::NoSolution);
            }
            Ok(Relation::Constraint(Constraint::Pair(DigitPair {
                left: *left,
                right: *right,
                offset,
            })))
        }
        _ => Ok(Relation::Residual),
    }
}

struct Reducer<'a> {
    table: &'a NodeTable,
    ranges: &'a RangeTable,
    forms: Vec<Option<Linear>>,
    pending: Vec<Goal>,
    seen: HashSet<Goal>,
    reduction: Reduction,
}

impl Reducer<'_> {
    fn range(&self, r: NodeRef) -> Range {
        match self.table.constant(r) {
            Some(v) => Range::exact(v),
            None => self
                .ranges
                .of(self.table, r)
                .unwrap_or(Range::new(i64::MIN, i64::MAX)),
        }
    }

    fn form(&self, r: NodeRef) -> Option<&Linear> {
        self.forms
            .get(self.table.resolve(r).index())
            .and_then(|f| f.as_ref())
    }

    fn push(&mut self, goal: Goal) {
        let goal = match goal {
            Goal::Zero(r) => Goal::Zero(self.table.resolve(r)),
            Goal::NonZero(r) => Goal::NonZero(self.table.resolve(r)),
            Goal::Equal(a, b) => Goal::Equal(self.table.resolve(a), self.table.resolve(b)),
        };
        if self.seen.insert(goal) {
            self.pending.push(goal);
        }
    }

    fn apply_linear(&mut self, e: Option<Linear>, goal: Goal) -> Result<(), SolveError> {
        match e.map(|e| relation(&e)).transpose()? {
            Some(Relation::Trivial) => {}
            Some(Relation::Constraint(c)) => {
                trace!(?c, "digit constraint");
                self.reduction.constraints.push(c);
            }
            Some(Relation::Residual) | None => self.reduction.residual.push(goal),
        }
        Ok(())
    }

    fn zero(&mut self, n: NodeRef) -> Result<(), SolveError> {
        let range = self.range(n);
        if range.excludes_zero() {
            return Err(SolveError::NoSolution);
        }
        if range.as_exact() == Some(0) {
            return Ok(());
        }
        if let Node::Binary { op, lhs, rhs } = self.table.get(n) {
            let (a, b) = (self.range(lhs), self.range(rhs));
            match op {
                BinaryOp::Add
                    if (a.is_non_negative() && b.is_non_negative())
                        || (a.is_non_positive() && b.is_non_positive()) =>
                {
                    self.push(Goal::Zero(lhs));
                    self.push(Goal::Zero(rhs));
                    return Ok(());
                }
                BinaryOp::Mul if a.excludes_zero() => {
                    self.push(Goal::Zero(rhs));
                    return Ok(());
                }
                BinaryOp::Mul if b.excludes_zero() => {
                    self.push(Goal::Zero(lhs));
                    return Ok(());
                }
                BinaryOp::Eql if b.as_exact() == Some(0) && a.is_boolean() => {
                    self.push(Goal::NonZero(lhs));
                    return Ok(());
                }
                BinaryOp::Eql if a.as_exact() == Some(0) && b.is_boolean() => {
                    self.push(Goal::NonZero(rhs));
                    return Ok(());
                }
                _ => {}
            }
        }
        let form = self.form(n).cloned();
        self.apply_linear(form, Goal::Zero(n))
    }

    fn non_zero(&mut self, n: NodeRef) -> Result<(), SolveError> {
        let range = self.range(n);
        if range.excludes_zero() {
            return Ok(());
        }
        if range.as_exact() == Some(0) {
            return Err(SolveError::NoSolution);
        }
        match self.table.get(n) {
            Node::Binary {
                op: BinaryOp::Eql,
                lhs,
                rhs,
            } => {
                self.push(Goal::Equal(lhs, rhs));
            }
            _ => self.reduction.residual.push(Goal::NonZero(n)),
        }
        Ok(())
    }

    fn equal(&mut self, a: NodeRef, b: NodeRef) -> Result<(), SolveError> {
        if a == b {
            return Ok(());
        }
        if self.range(a).is_disjoint(self.range(b)) {
            return Err(SolveError::NoSolution);
        }
        let difference = match (self.form(a), self.form(b)) {
            (Some(x), Some(y)) => y.scale(-1).and_then(|neg| x.add(&neg)),
            _ => None,
        };
        self.apply_linear(difference, Goal::Equal(a, b))
    }
}

/// Reduce `root == 0` using the unpinned ranges of the graph.
///
/// Fails with `NoSolution` when a derived condition is contradictory.
pub fn reduce(
    table: &NodeTable,
    ranges: &RangeTable,
    root: NodeRef,
) -> Result<Reduction, SolveError> {
    let mut reducer = Reducer {
        table,
        ranges,
        forms: linear_forms(table, root),
        pending: Vec::new(),
        seen: HashSet::new(),
        reduction: Reduction::default(),
    };
    reducer.push(Goal::Zero(root));
    while let Some(goal) = reducer.pending.pop() {
        match goal {
            Goal::Zero(n) => reducer.zero(n)?,
            Goal::NonZero(n) => reducer.non_zero(n)?,
            Goal::Equal(a, b) => reducer.equal(a, b)?,
        }
    }
    Ok(reducer.reduction)
}

/// Assign digits directly when the reduction is complete and every input is
/// constrained at most once.
pub fn assign(reduction: &Reduction, input_count: usize, objective: Objective) -> Option<Vec<u8>> {
    if !reduction.is_complete() {
        return None;
    }
    let mut seen = vec![false; input_count];
    for constraint in &reduction.constraints {
        for input in constraint.inputs() {
            if input >= input_count || seen[input] {
                return None;
            }
            seen[input] = true;
        }
    }

    let mut digits = vec![objective.free_digit(); input_count];
    for constraint in &reduction.constraints {
        match constraint {
            Constraint::Fixed { input, digit } => digits[*input] = *digit,
            Constraint::Pair(pair) => {
                let (left, right) = pair.digits(objective);
                digits[pair.left] = left;
                digits[pair.right] = right;
            }
        }
    }
    Some(digits)
}
