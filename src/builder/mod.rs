//! Symbolic execution of a program into the expression graph

use crate::error::EvalError;
use crate::graph::{Node, NodeRef, NodeTable};
use crate::ir::{Operand, Program, Register};
use tracing::debug;

/// Symbolic register file: the node each register currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolicState {
    registers: [NodeRef; Register::COUNT],
}

impl SymbolicState {
    fn zeroed(zero: NodeRef) -> Self {
        Self {
            registers: [zero; Register::COUNT],
        }
    }

    pub fn get(&self, reg: Register) -> Result<NodeRef, EvalError> {
        Ok(self.registers[reg.index()?])
    }

    pub fn set(&mut self, reg: Register, node: NodeRef) -> Result<(), EvalError> {
        self.registers[reg.index()?] = node;
        Ok(())
    }

    /// Node held by the output register `z`
    pub fn output(&self) -> NodeRef {
        self.registers[3]
    }

    pub fn registers(&self) -> &[NodeRef; Register::COUNT] {
        &self.registers
    }
}

/// Register file just before an `inp` instruction executes
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    pub input_index: usize,
    /// Position of the `inp` instruction in the program
    pub instruction_index: usize,
    pub state: SymbolicState,
}

/// Result of symbolic execution
#[derive(Debug, Clone)]
pub struct Built {
    pub state: SymbolicState,
    pub table: NodeTable,
    pub checkpoints: Vec<Checkpoint>,
    /// `Input(i)` node for every input, in encounter order
    pub input_nodes: Vec<NodeRef>,
}

impl Built {
    /// Canonical node of the output register
    pub fn root(&self) -> NodeRef {
        self.table.resolve(self.state.output())
    }

    pub fn input_count(&self) -> usize {
        self.input_nodes.len()
    }
}

fn resolve_operand(
    table: &mut NodeTable,
    state: &SymbolicState,
    operand: &Operand,
) -> Result<NodeRef, EvalError> {
    match operand {
        Operand::Register(reg) => state.get(*reg),
        Operand::Immediate(imm) => Ok(table.intern(Node::Constant(*imm))),
    }
}

/// Execute `program` over symbolic values
pub fn build(program: &Program) -> Result<Built, EvalError> {
    let mut table = NodeTable::new();
    let zero = table.intern(Node::Constant(0));
    let mut state = SymbolicState::zeroed(zero);
    let mut checkpoints = Vec::new();
    let mut input_nodes = Vec::new();

    for (instruction_index, instruction) in program.iter().enumerate() {
        let rd = instruction.destination();
        let node = match instruction.binary_op() {
            None => {
                let input_index = input_nodes.len();
                checkpoints.push(Checkpoint {
                    input_index,
                    instruction_index,
                    state,
                });
                let node = table.intern(Node::Input(input_index));
                input_nodes.push(node);
                node
            }
            Some((op, rm)) => {
                let lhs = state.get(rd)?;
                let rhs = resolve_operand(&mut table, &state, &rm)?;
                table.intern(Node::Binary { op, lhs, rhs })
            }
        };
        state.set(rd, node)?;
    }

    debug!(
        instructions = program.len(),
        inputs = input_nodes.len(),
        nodes = table.len(),
        "symbolic execution finished"
    );

    Ok(Built {
        state,
        table,
        checkpoints,
        input_nodes,
    })
}
