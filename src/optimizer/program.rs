//! Instruction-level simplification
//!
//! These passes rewrite the instruction list itself. They are reported by
//! `monad analyze` and `monad registers`; the solver works on the expression
//! graph and does not depend on them.

use crate::analysis::{live_at_exit, RegisterSet};
use crate::ir::{BinaryOp, Instruction, Operand, Program, Register};
use std::fmt;
use tracing::{debug, trace};

/// What is statically known about a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownValue {
    Exact(i64),
    /// The untouched digit read by the n-th `inp`, somewhere in `1..=9`
    Input(usize),
    Unknown,
}

impl KnownValue {
    pub fn exact(self) -> Option<i64> {
        match self {
            KnownValue::Exact(v) => Some(v),
            _ => None,
        }
    }

    fn is_nonzero(self) -> bool {
        match self {
            KnownValue::Exact(v) => v != 0,
            KnownValue::Input(_) => true,
            KnownValue::Unknown => false,
        }
    }
}

impl fmt::Display for KnownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            KnownValue::Exact(v) => format!("Exact({})", v),
            KnownValue::Input(n) => format!("Input({})", n),
            KnownValue::Unknown => "Unknown".to_string(),
        };
        f.pad(&text)
    }
}

/// Abstract effect of one instruction
struct Effect {
    no_op: bool,
    /// Destination and operand values before a binary instruction
    operands: Option<(KnownValue, KnownValue)>,
}

struct KnownRegisters {
    values: [KnownValue; Register::COUNT],
    inputs_read: usize,
}

impl KnownRegisters {
    fn new() -> Self {
        Self {
            values: [KnownValue::Exact(0); Register::COUNT],
            inputs_read: 0,
        }
    }

    fn get(&self, reg: Register) -> KnownValue {
        reg.index()
            .map(|i| self.values[i])
            .unwrap_or(KnownValue::Unknown)
    }

    fn set(&mut self, reg: Register, value: KnownValue) {
        if let Ok(i) = reg.index() {
            self.values[i] = value;
        }
    }

    fn operand(&self, operand: Operand) -> KnownValue {
        match operand {
            Operand::Register(reg) => self.get(reg),
            Operand::Immediate(v) => KnownValue::Exact(v),
        }
    }

    /// Execute `instruction` abstractly; no-ops leave the registers untouched
    fn execute(&mut self, instruction: &Instruction) -> Effect {
        let rd = instruction.destination();
        let Some((op, rm)) = instruction.binary_op() else {
            self.set(rd, KnownValue::Input(self.inputs_read));
            self.inputs_read += 1;
            return Effect {
                no_op: false,
                operands: None,
            };
        };
        let current = self.get(rd);
        let operand = self.operand(rm);
        let no_op = is_no_op(op, current, operand);
        if !no_op {
            self.set(rd, transfer(op, current, operand));
        }
        Effect {
            no_op,
            operands: Some((current, operand)),
        }
    }
}

/// True when executing `op` leaves `current` unchanged
fn is_no_op(op: BinaryOp, current: KnownValue, operand: KnownValue) -> bool {
    let (a, b) = (current.exact(), operand.exact());
    match op {
        BinaryOp::Add => b == Some(0),
        BinaryOp::Mul => b == Some(1) || a == Some(0),
        BinaryOp::Div => b == Some(1) || (a == Some(0) && operand.is_nonzero()),
        BinaryOp::Mod => matches!((a, b), (Some(a), Some(b)) if 0 <= a && a < b),
        BinaryOp::Eql => match (a, b) {
            (Some(a), Some(b)) => i64::from(a == b) == a,
            // An input is never outside 1..=9
            (Some(0), None) => matches!(operand, KnownValue::Input(_)),
            _ => false,
        },
    }
}

/// Abstract result of `op`, used to keep propagating facts
fn transfer(op: BinaryOp, current: KnownValue, operand: KnownValue) -> KnownValue {
    match (current.exact(), operand.exact()) {
        (Some(a), Some(b)) => op
            .apply(a, b)
            .map(KnownValue::Exact)
            .unwrap_or(KnownValue::Unknown),
        _ => match (op, operand.exact()) {
            (BinaryOp::Mul, Some(0)) => KnownValue::Exact(0),
            (BinaryOp::Eql, None) => match (current.exact(), operand) {
                (Some(a), KnownValue::Input(_)) if !(1..=9).contains(&a) => KnownValue::Exact(0),
                _ => KnownValue::Unknown,
            },
            _ => KnownValue::Unknown,
        },
    }
}

/// Drop instructions that provably do not change their destination.
///
/// Returns the simplified program and the number of removed instructions.
pub fn remove_no_ops(program: &Program) -> (Program, usize) {
    let mut known = KnownRegisters::new();
    let mut kept = Vec::with_capacity(program.len());

    for instruction in program {
        if known.execute(instruction).no_op {
            trace!(%instruction, "no-op removed");
            continue;
        }
        kept.push(*instruction);
    }

    let removed = program.len() - kept.len();
    (Program::new(kept), removed)
}

/// A store can be dropped only if it cannot fault at runtime
fn cannot_fault(instruction: &Instruction) -> bool {
    match instruction.binary_op() {
        Some((BinaryOp::Div, Operand::Immediate(d))) => d != 0,
        Some((BinaryOp::Mod, Operand::Immediate(m))) => m > 0,
        Some((BinaryOp::Div | BinaryOp::Mod, Operand::Register(_))) => false,
        Some(_) => true,
        None => false,
    }
}

/// Drop non-`inp` instructions whose destination is dead afterwards.
///
/// Returns the simplified program and the number of removed instructions.
pub fn eliminate_dead_stores(program: &Program) -> (Program, usize) {
    let mut live: RegisterSet = live_at_exit();
    let mut kept = Vec::with_capacity(program.len());

    for instruction in program.iter().rev() {
        let rd = instruction.destination();
        if !instruction.is_input() && !live.contains(rd) && cannot_fault(instruction) {
            trace!(%instruction, "dead store removed");
            continue;
        }
        live.remove(rd);
        for reg in instruction.source_registers() {
            live.insert(reg);
        }
        kept.push(*instruction);
    }

    kept.reverse();
    let removed = program.len() - kept.len();
    (Program::new(kept), removed)
}

/// One row of a register trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub instruction: Instruction,
    /// Register values after the instruction, in `w x y z` order
    pub registers: [KnownValue; Register::COUNT],
    pub no_op: bool,
}

/// Instruction-by-instruction abstract register values of a program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterTrace {
    pub steps: Vec<TraceStep>,
    pub non_input: usize,
    /// Non-input instructions with at least one operand that is not exact
    pub on_unknown: usize,
    /// Non-input instructions with no exact operand at all
    pub without_exact: usize,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl fmt::Display for RegisterTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18} {:<12} {:<12} {:<12} {:<12}",
            "instruction", "w", "x", "y", "z"
        )?;
        let start = [KnownValue::Exact(0); Register::COUNT];
        let rows = std::iter::once(("<start>".to_string(), &start, false)).chain(
            self.steps
                .iter()
                .map(|step| (step.instruction.to_string(), &step.registers, step.no_op)),
        );
        for (label, registers, no_op) in rows {
            let [w, x, y, z] = registers;
            let line = format!("{:<18} {:<12} {:<12} {:<12} {:<12}", label, w, x, y, z);
            let marker = if no_op { " *NoOp" } else { "" };
            writeln!(f, "{}{}", line.trim_end(), marker)?;
        }
        writeln!(f)?;
        writeln!(f, "Non-input instructions: {}", self.non_input)?;
        writeln!(
            f,
            "  On unknown registers: {} ({:.1}%)",
            self.on_unknown,
            percent(self.on_unknown, self.non_input)
        )?;
        writeln!(
            f,
            "  Without exact values: {} ({:.1}%)",
            self.without_exact,
            percent(self.without_exact, self.non_input)
        )
    }
}

/// Trace what is statically known about each register through `program`
pub fn trace_registers(program: &Program) -> RegisterTrace {
    let mut known = KnownRegisters::new();
    let mut trace = RegisterTrace::default();
    for instruction in program {
        let effect = known.execute(instruction);
        if let Some((current, operand)) = effect.operands {
            trace.non_input += 1;
            let exact = [current, operand].iter().filter(|v| v.exact().is_some()).count();
            if exact < 2 {
                trace.on_unknown += 1;
            }
            if exact == 0 {
                trace.without_exact += 1;
            }
        }
        trace.steps.push(TraceStep {
            instruction: *instruction,
            registers: known.values,
            no_op: effect.no_op,
        });
    }
    trace
}

/// Summary of instruction-level simplification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramReport {
    pub original_len: usize,
    pub no_ops_removed: usize,
    pub dead_stores_removed: usize,
    pub final_len: usize,
}

impl fmt::Display for ProgramReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Instructions: {} -> {}", self.original_len, self.final_len)?;
        writeln!(f, "  No-ops removed: {}", self.no_ops_removed)?;
        writeln!(f, "  Dead stores removed: {}", self.dead_stores_removed)
    }
}

/// Run no-op removal then dead-store elimination until neither applies
pub fn simplify_program(program: &Program) -> (Program, ProgramReport) {
    let mut report = ProgramReport {
        original_len: program.len(),
        ..Default::default()
    };
    let mut current = program.clone();
    loop {
        let (next, no_ops) = remove_no_ops(&current);
        let (next, dead) = eliminate_dead_stores(&next);
        report.no_ops_removed += no_ops;
        report.dead_stores_removed += dead;
        current = next;
        if no_ops + dead == 0 {
            break;
        }
    }
    report.final_len = current.len();
    debug!(
        before = report.original_len,
        after = report.final_len,
        "instruction-level simplification finished"
    );
    (current, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::execute;

    fn program(text: &str) -> Program {
        text.parse().unwrap()
    }

    #[test]
    fn test_removes_identities_on_known_values() {
        let p = program("inp w\nadd w 0\nmul w 1\nmul x w\ndiv y 3\nadd z w");
        let (simplified, removed) = remove_no_ops(&p);
        // add w 0, mul w 1, mul x w (x = 0), div y 3 (y = 0)
        assert_eq!(removed, 4);
        assert_eq!(simplified.to_string(), "inp w\nadd z w\n");
    }

    #[test]
    fn test_keeps_possible_division_fault() {
        let p = program("inp w\nmul x 0\ndiv y x\nadd z w");
        let (simplified, _) = remove_no_ops(&p);
        assert!(simplified.iter().any(|i| i.to_string() == "div y x"));
    }

    #[test]
    fn test_eql_results() {
        // x = 0 and w is a digit, so eql x w is 0 and changes nothing
        let p = program("inp w\neql x w\nadd x 5\neql x 5\nadd z x");
        let (simplified, removed) = remove_no_ops(&p);
        assert_eq!(removed, 1);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn test_mod_known_in_range() {
        let p = program("add x 3\nmod x 26\ninp w\nadd z w");
        let (simplified, removed) = remove_no_ops(&p);
        assert_eq!(removed, 1);
        assert_eq!(simplified.len(), 3);
    }

    #[test]
    fn test_register_trace() {
        let p = program("inp w\nadd w 0\nmul x w\nadd x 2\ninp y\nmul y x\nadd z y\neql z w");
        let trace = trace_registers(&p);
        assert_eq!(trace.steps.len(), p.len());
        assert_eq!(
            trace.steps[0].registers,
            [
                KnownValue::Input(0),
                KnownValue::Exact(0),
                KnownValue::Exact(0),
                KnownValue::Exact(0)
            ]
        );
        // add w 0 and mul x w (x = 0)
        let no_ops: Vec<usize> = (0..p.len()).filter(|&i| trace.steps[i].no_op).collect();
        assert_eq!(no_ops, vec![1, 2]);
        assert_eq!(trace.steps[3].registers[1], KnownValue::Exact(2));
        assert_eq!(trace.steps[4].registers[2], KnownValue::Input(1));
        assert_eq!(trace.steps[5].registers[2], KnownValue::Unknown);
        assert_eq!(trace.steps[7].registers[3], KnownValue::Unknown);

        assert_eq!(trace.non_input, 6);
        // add w 0, mul x w, mul y x, add z y, eql z w
        assert_eq!(trace.on_unknown, 5);
        // eql z w
        assert_eq!(trace.without_exact, 1);
    }

    #[test]
    fn test_register_trace_listing() {
        let trace = trace_registers(&program("inp w\nadd w 0\nadd z w"));
        let listing = trace.to_string();
        let lines: Vec<&str> = listing.lines().collect();
        assert!(lines[1].starts_with("<start>"));
        assert!(lines[1].contains("Exact(0)"));
        assert!(lines[2].contains("Input(0)"));
        assert!(lines[3].ends_with("*NoOp"));
        assert!(!lines[4].ends_with("*NoOp"));
        assert!(listing.contains("Non-input instructions: 2"));
        assert!(listing.contains("On unknown registers: 2 (100.0%)"));
    }

    #[test]
    fn test_dead_store_elimination() {
        let p = program("inp w\nadd y 7\nmul y w\nadd x w\nmul x 0\nadd z w\nadd w 3");
        let (simplified, removed) = eliminate_dead_stores(&p);
        assert_eq!(removed, 5);
        assert_eq!(simplified.to_string(), "inp w\nadd z w\n");
    }

    #[test]
    fn test_dead_store_keeps_inputs_and_faults() {
        let p = program("inp w\ninp x\ndiv y x\nmod y 0\nadd z w");
        let (simplified, removed) = eliminate_dead_stores(&p);
        assert_eq!(removed, 0);
        assert_eq!(simplified.len(), p.len());
    }

    #[test]
    fn test_simplify_program_preserves_output() {
        let p = program(
            "inp w\nmul x 0\nadd x z\nmod x 26\ndiv z 1\nadd x 14\neql x w\neql x 0\n\
             mul y 0\nadd y 25\nmul y x\nadd y 1\nmul z y\nmul y 0\nadd y w\nadd y 12\n\
             mul y x\nadd z y",
        );
        let (simplified, report) = simplify_program(&p);
        assert!(report.no_ops_removed > 0);
        assert_eq!(report.final_len, simplified.len());
        assert!(simplified.len() < p.len());
        for d in 1..=9u8 {
            assert_eq!(
                execute(&simplified, &[d]).unwrap().output(),
                execute(&p, &[d]).unwrap().output()
            );
        }
    }
}
