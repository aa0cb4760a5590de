//! Randomized cross-check of the compiled graph against the interpreter
//!
//! For sampled model numbers the concrete interpreter, the raw expression
//! graph and the optimized graph must agree on `z`, and every analyzed range
//! must contain the value its node actually takes.

pub mod random;

pub use random::{generate_edge_case_inputs, generate_random_inputs, RandomInputConfig};

use crate::analysis::{Range, RangeAnalyzer};
use crate::builder::build;
use crate::error::Result;
use crate::graph::{evaluate, evaluate_all, NodeRef};
use crate::ir::Program;
use crate::optimizer::{optimize, OptimizerConfig};
use crate::semantics::execute;
use std::fmt;
use tracing::{debug, warn};

/// A sample on which two views of the program disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disagreement {
    /// Graph evaluation differs from the interpreter
    Output {
        digits: Vec<u8>,
        expected: i64,
        raw: Option<i64>,
        optimized: Option<i64>,
    },
    /// A node took a value outside its analyzed range
    Range {
        digits: Vec<u8>,
        node: NodeRef,
        range: Range,
        value: i64,
        /// Number of leading inputs pinned during analysis
        pinned: usize,
    },
}

fn format_digits(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

impl fmt::Display for Disagreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disagreement::Output {
                digits,
                expected,
                raw,
                optimized,
            } => write!(
                f,
                "{}: interpreter z={}, raw graph {:?}, optimized graph {:?}",
                format_digits(digits),
                expected,
                raw,
                optimized
            ),
            Disagreement::Range {
                digits,
                node,
                range,
                value,
                pinned,
            } => write!(
                f,
                "{}: {} = {} outside {} ({} inputs pinned)",
                format_digits(digits),
                node,
                value,
                range,
                pinned
            ),
        }
    }
}

/// Outcome of a cross-check run
#[derive(Debug, Clone, Default)]
pub struct CrossCheckReport {
    pub samples: usize,
    /// Samples skipped because the interpreter hit a runtime fault
    pub faulted: usize,
    /// Samples accepted by the program (z == 0)
    pub accepted: usize,
    pub disagreements: Vec<Disagreement>,
}

impl CrossCheckReport {
    pub fn is_consistent(&self) -> bool {
        self.disagreements.is_empty()
    }

    pub fn checked(&self) -> usize {
        self.samples - self.faulted
    }
}

impl fmt::Display for CrossCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Samples: {}", self.samples)?;
        writeln!(f, "  Faulted: {}", self.faulted)?;
        writeln!(f, "  Accepted: {}", self.accepted)?;
        writeln!(f, "  Disagreements: {}", self.disagreements.len())?;
        for d in self.disagreements.iter().take(10) {
            writeln!(f, "    {}", d)?;
        }
        Ok(())
    }
}

/// Compare interpreter, raw graph, optimized graph and range tables on
/// edge-case and random model numbers.
pub fn cross_check(program: &Program, samples: usize, seed: Option<u64>) -> Result<CrossCheckReport> {
    let raw = build(program)?;
    let raw_root = raw.root();

    let mut optimized = build(program)?;
    let root = optimized.root();
    optimize(&mut optimized.table, &[root], &OptimizerConfig::default())?;
    let root = optimized.table.resolve(root);

    let analyzer = RangeAnalyzer::new(&optimized.table, &[root]);
    let free_ranges = analyzer.analyze();
    let input_count = raw.input_count();

    let config = RandomInputConfig::default()
        .with_count(samples)
        .with_seed_option(seed);
    let mut inputs = generate_edge_case_inputs(input_count);
    inputs.extend(generate_random_inputs(&config, input_count));

    let mut report = CrossCheckReport::default();
    for digits in inputs {
        report.samples += 1;
        let expected = match execute(program, &digits) {
            Ok(state) => state.output(),
            Err(e) => {
                debug!(digits = %format_digits(&digits), error = %e, "sample faulted");
                report.faulted += 1;
                continue;
            }
        };
        if expected == 0 {
            report.accepted += 1;
        }

        let raw_value = evaluate(&raw.table, &digits, raw_root).ok();
        let optimized_value = evaluate(&optimized.table, &digits, root).ok();
        if raw_value != Some(expected) || optimized_value != Some(expected) {
            report.disagreements.push(Disagreement::Output {
                digits: digits.clone(),
                expected,
                raw: raw_value,
                optimized: optimized_value,
            });
            continue;
        }

        // Every live node against the free ranges
        if let Ok(values) = evaluate_all(&optimized.table, &digits, &[root]) {
            for node in optimized.table.live_nodes(&[root]) {
                let (Some(value), Some(range)) = (values[node.index()], free_ranges.get(node))
                else {
                    continue;
                };
                if !range.contains(value) {
                    report.disagreements.push(Disagreement::Range {
                        digits: digits.clone(),
                        node,
                        range,
                        value,
                        pinned: 0,
                    });
                }
            }
        }

        // The output against every pinned prefix
        for pinned in 1..=input_count {
            let ranges = analyzer.analyze_pinned(&digits[..pinned]);
            if let Some(range) = ranges.get(root) {
                if !range.contains(expected) {
                    report.disagreements.push(Disagreement::Range {
                        digits: digits.clone(),
                        node: root,
                        range,
                        value: expected,
                        pinned,
                    });
                }
            }
        }
    }

    if !report.is_consistent() {
        warn!(
            disagreements = report.disagreements.len(),
            "cross-check found disagreements"
        );
    }
    Ok(report)
}
