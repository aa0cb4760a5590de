//! Backward register liveness over the instruction list

use crate::ir::{Program, Register};
use std::fmt;

/// Small set of registers stored as a bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegisterSet(u8);

impl RegisterSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn single(reg: Register) -> Self {
        Self::empty().with(reg)
    }

    pub fn with(mut self, reg: Register) -> Self {
        self.insert(reg);
        self
    }

    pub fn insert(&mut self, reg: Register) {
        if reg.0 < 8 {
            self.0 |= 1 << reg.0;
        }
    }

    pub fn remove(&mut self, reg: Register) {
        if reg.0 < 8 {
            self.0 &= !(1 << reg.0);
        }
    }

    pub fn contains(&self, reg: Register) -> bool {
        reg.0 < 8 && self.0 & (1 << reg.0) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Register> + '_ {
        Register::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl fmt::Display for RegisterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|r| r.to_string()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Registers live at program exit: only the output register
pub fn live_at_exit() -> RegisterSet {
    RegisterSet::single(Register::Z)
}

/// Live registers before each instruction.
///
/// The result has `program.len() + 1` entries; the last one is the exit set.
/// Registers outside `w..z` are ignored; the builder rejects them.
pub fn live_before(program: &Program) -> Vec<RegisterSet> {
    let mut live = vec![RegisterSet::empty(); program.len() + 1];
    let mut current = live_at_exit();
    live[program.len()] = current;
    for (i, instruction) in program.iter().enumerate().rev() {
        let rd = instruction.destination();
        if rd.index().is_ok() {
            current.remove(rd);
        }
        for reg in instruction.source_registers() {
            if reg.index().is_ok() {
                current.insert(reg);
            }
        }
        live[i] = current;
    }
    live
}
