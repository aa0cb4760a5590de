//! ALU instruction definitions for the IR

use crate::ir::types::{BinaryOp, Operand, Register};
use std::fmt;

/// ALU instructions supported by the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Read the next input digit into `rd`
    Inp { rd: Register },
    Add { rd: Register, rm: Operand },
    Mul { rd: Register, rm: Operand },
    Div { rd: Register, rm: Operand },
    Mod { rd: Register, rm: Operand },
    Eql { rd: Register, rm: Operand },
}

impl Instruction {
    /// Build a binary instruction from its operation kind
    pub fn binary(op: BinaryOp, rd: Register, rm: Operand) -> Self {
        match op {
            BinaryOp::Add => Instruction::Add { rd, rm },
            BinaryOp::Mul => Instruction::Mul { rd, rm },
            BinaryOp::Div => Instruction::Div { rd, rm },
            BinaryOp::Mod => Instruction::Mod { rd, rm },
            BinaryOp::Eql => Instruction::Eql { rd, rm },
        }
    }

    /// Get the destination register for this instruction
    pub fn destination(&self) -> Register {
        match self {
            Instruction::Inp { rd }
            | Instruction::Add { rd, .. }
            | Instruction::Mul { rd, .. }
            | Instruction::Div { rd, .. }
            | Instruction::Mod { rd, .. }
            | Instruction::Eql { rd, .. } => *rd,
        }
    }

    /// Get the second operand (None for `inp`)
    pub fn operand(&self) -> Option<Operand> {
        self.binary_op().map(|(_, rm)| rm)
    }

    /// Split a binary instruction into its operation and second operand
    pub fn binary_op(&self) -> Option<(BinaryOp, Operand)> {
        match self {
            Instruction::Inp { .. } => None,
            Instruction::Add { rm, .. } => Some((BinaryOp::Add, *rm)),
            Instruction::Mul { rm, .. } => Some((BinaryOp::Mul, *rm)),
            Instruction::Div { rm, .. } => Some((BinaryOp::Div, *rm)),
            Instruction::Mod { rm, .. } => Some((BinaryOp::Mod, *rm)),
            Instruction::Eql { rm, .. } => Some((BinaryOp::Eql, *rm)),
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Instruction::Inp { .. })
    }

    /// Registers read by this instruction.
    ///
    /// `mul r 0` is treated as a pure write: its result is 0 whatever `r` holds.
    pub fn source_registers(&self) -> Vec<Register> {
        match self.binary_op() {
            None => vec![],
            Some((BinaryOp::Mul, Operand::Immediate(0))) => vec![],
            Some((_, Operand::Register(rm))) => vec![self.destination(), rm],
            Some((_, Operand::Immediate(_))) => vec![self.destination()],
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.binary_op() {
            None => write!(f, "inp {}", self.destination()),
            Some((op, rm)) => write!(f, "{} {} {}", op, self.destination(), rm),
        }
    }
}
