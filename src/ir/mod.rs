//! Intermediate Representation (IR) for ALU programs

pub mod instructions;
pub mod program;
pub mod types;

// Re-export commonly used types
pub use instructions::Instruction;
pub use program::Program;
pub use types::{BinaryOp, Operand, Register};
