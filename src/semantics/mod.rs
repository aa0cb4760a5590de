//! Concrete ALU semantics

pub mod concrete;
pub mod state;

// Re-export main functionality
pub use concrete::{accepts, apply_instruction_concrete, execute, InputTape};
pub use state::AluState;
