//! Concrete interpreter: the reference semantics every answer is checked against

use crate::error::EvalError;
use crate::ir::{Instruction, Operand, Program};
use crate::semantics::state::AluState;

/// Evaluate an operand to get its concrete value
fn eval_operand(state: &AluState, operand: &Operand) -> Result<i64, EvalError> {
    match operand {
        Operand::Register(reg) => state.get_register(*reg),
        Operand::Immediate(imm) => Ok(*imm),
    }
}

/// Sequential reader over the supplied input digits
#[derive(Debug, Clone)]
pub struct InputTape<'a> {
    digits: &'a [u8],
    position: usize,
}

impl<'a> InputTape<'a> {
    pub fn new(digits: &'a [u8]) -> Self {
        Self {
            digits,
            position: 0,
        }
    }

    fn read(&mut self) -> Result<i64, EvalError> {
        let digit = self
            .digits
            .get(self.position)
            .ok_or(EvalError::MissingInput(self.position))?;
        self.position += 1;
        Ok(i64::from(*digit))
    }

    /// Number of digits consumed so far
    pub fn consumed(&self) -> usize {
        self.position
    }
}

/// Apply a single instruction to a concrete state
pub fn apply_instruction_concrete(
    mut state: AluState,
    instruction: &Instruction,
    input: &mut InputTape<'_>,
) -> Result<AluState, EvalError> {
    let rd = instruction.destination();
    let value = match instruction.binary_op() {
        None => input.read()?,
        Some((op, rm)) => {
            let lhs = state.get_register(rd)?;
            let rhs = eval_operand(&state, &rm)?;
            op.apply(lhs, rhs)?
        }
    };
    state.set_register(rd, value)?;
    Ok(state)
}

fn run(program: &Program, input: &mut InputTape<'_>) -> Result<AluState, EvalError> {
    let mut state = AluState::new_zeroed();
    for instruction in program {
        state = apply_instruction_concrete(state, instruction, input)?;
    }
    Ok(state)
}

/// Run a whole program on the given digits, starting from the zeroed state
pub fn execute(program: &Program, digits: &[u8]) -> Result<AluState, EvalError> {
    run(program, &mut InputTape::new(digits))
}

/// True when the digits form a model number the program validates.
///
/// Every digit must be in `1..=9`, every digit must be read, and the run
/// must end with `z == 0` without a runtime fault.
pub fn accepts(program: &Program, digits: &[u8]) -> bool {
    if !digits.iter().all(|d| (1..=9).contains(d)) {
        return false;
    }
    let mut input = InputTape::new(digits);
    match run(program, &mut input) {
        Ok(state) => state.output() == 0 && input.consumed() == digits.len(),
        Err(_) => false,
    }
}
