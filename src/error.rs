//! Error types shared across the pipeline

use thiserror::Error;

use crate::ir::BinaryOp;
use crate::parser::ParseError;

/// Errors raised while evaluating ALU semantics, symbolically or concretely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("non-positive modulus {0}")]
    NonPositiveModulus(i64),

    #[error("unknown register index {0} (expected one of w, x, y, z)")]
    UnknownRegister(u8),

    #[error("arithmetic overflow in {op} {lhs} {rhs}")]
    Overflow { op: BinaryOp, lhs: i64, rhs: i64 },

    #[error("program reads input {0} but no digit was supplied")]
    MissingInput(usize),
}

/// Errors raised by the constraint solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no digit assignment drives the output register to zero")]
    NoSolution,

    #[error("search aborted after exceeding its {0} bound")]
    Timeout(&'static str),
}

/// Top-level error of a pipeline run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("solver produced {digits}, which does not zero the output register of the original program")]
    Verification { digits: String },
}

pub type Result<T> = std::result::Result<T, Error>;
