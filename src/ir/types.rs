//! Core types for the ALU instruction IR

use std::fmt;

use crate::error::EvalError;

/// One of the ALU's four registers, stored as an index.
///
/// Registers `w`, `x`, `y`, `z` are indices 0 through 3. The index form lets a
/// structurally invalid program be represented, so consumers validate it with
/// [`Register::index`] instead of trusting the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(pub u8);

impl Register {
    pub const W: Register = Register(0);
    pub const X: Register = Register(1);
    pub const Y: Register = Register(2);
    /// The output register whose final value must be zero.
    pub const Z: Register = Register(3);

    /// Number of registers in the register file
    pub const COUNT: usize = 4;

    /// All registers in index order
    pub const ALL: [Register; Register::COUNT] =
        [Register::W, Register::X, Register::Y, Register::Z];

    /// Get the register-file slot, rejecting indices outside `w..=z`
    pub fn index(&self) -> Result<usize, EvalError> {
        if (self.0 as usize) < Self::COUNT {
            Ok(self.0 as usize)
        } else {
            Err(EvalError::UnknownRegister(self.0))
        }
    }

    /// Create register from its slot index (0-3)
    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::COUNT).then_some(Register(index as u8))
    }

    /// Look up a register by its one-letter name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "w" => Some(Register::W),
            "x" => Some(Register::X),
            "y" => Some(Register::Y),
            "z" => Some(Register::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "w"),
            1 => write!(f, "x"),
            2 => write!(f, "y"),
            3 => write!(f, "z"),
            n => write!(f, "r{}", n),
        }
    }
}

/// Second operand of a binary instruction - either a register or immediate value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Register),
    Immediate(i64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Immediate(imm) => write!(f, "{}", imm),
        }
    }
}

/// The five two-operand ALU operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinaryOp {
    Add,
    Mul,
    Div,
    Mod,
    Eql,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 5] = [
        BinaryOp::Add,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::Eql,
    ];

    /// Evaluate the operation on concrete values.
    ///
    /// `div` truncates toward zero. `mod` takes the non-negative remainder, so
    /// its result always lies in `[0, rhs)`.
    pub fn apply(&self, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
        let overflow = || EvalError::Overflow {
            op: *self,
            lhs,
            rhs,
        };
        match self {
            BinaryOp::Add => lhs.checked_add(rhs).ok_or_else(overflow),
            BinaryOp::Mul => lhs.checked_mul(rhs).ok_or_else(overflow),
            BinaryOp::Div => {
                if rhs == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                lhs.checked_div(rhs).ok_or_else(overflow)
            }
            BinaryOp::Mod => {
                if rhs <= 0 {
                    return Err(EvalError::NonPositiveModulus(rhs));
                }
                Ok(lhs.rem_euclid(rhs))
            }
            BinaryOp::Eql => Ok(i64::from(lhs == rhs)),
        }
    }

    /// Mnemonic as written in program text
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Eql => "eql",
        }
    }

    /// True for operations where operand order does not matter
    pub fn is_commutative(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Mul | BinaryOp::Eql)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
