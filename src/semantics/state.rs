//! Concrete register-file state

use crate::error::EvalError;
use crate::ir::Register;
use std::fmt;

/// Concrete ALU state: four signed 64-bit registers, all zero at start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AluState {
    registers: [i64; Register::COUNT],
}

impl AluState {
    /// Create a new state with all registers set to zero
    pub fn new_zeroed() -> Self {
        Self::default()
    }

    /// Create a state from explicit `w, x, y, z` values
    pub fn from_values(registers: [i64; Register::COUNT]) -> Self {
        Self { registers }
    }

    pub fn get_register(&self, reg: Register) -> Result<i64, EvalError> {
        Ok(self.registers[reg.index()?])
    }

    pub fn set_register(&mut self, reg: Register, value: i64) -> Result<(), EvalError> {
        self.registers[reg.index()?] = value;
        Ok(())
    }

    /// Value of the output register `z`
    pub fn output(&self) -> i64 {
        self.registers[3]
    }

    pub fn values(&self) -> [i64; Register::COUNT] {
        self.registers
    }
}

impl fmt::Display for AluState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [w, x, y, z] = self.registers;
        write!(f, "w={} x={} y={} z={}", w, x, y, z)
    }
}
