//! Program text parser for ALU instructions
//!
//! Parses the line-oriented MONAD syntax (`inp w`, `add x -3`, ...) into the
//! IR representation.

use std::path::Path;

use thiserror::Error;

use crate::ir::{BinaryOp, Instruction, Operand, Program, Register};

/// Parse error with location information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {message}\n  | {line_content}")]
pub struct ParseError {
    pub line_number: usize,
    pub message: String,
    pub line_content: String,
}

impl ParseError {
    pub fn new(
        line_number: usize,
        message: impl Into<String>,
        line_content: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            message: message.into(),
            line_content: line_content.into(),
        }
    }
}

/// Result of parsing a single line
#[derive(Debug)]
pub enum LineResult {
    /// An instruction was parsed
    Instruction(Instruction),
    /// Line was empty or a comment (skip it)
    Skip,
}

/// Parse a register name (`w`, `x`, `y` or `z`)
pub fn parse_register(s: &str) -> Result<Register, String> {
    Register::from_name(s.trim()).ok_or_else(|| format!("unknown register: {}", s))
}

/// Parse a signed decimal immediate
pub fn parse_immediate(s: &str) -> Result<i64, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("empty immediate value".to_string());
    }

    s.parse::<i64>()
        .map_err(|e| format!("invalid immediate '{}': {}", s, e))
}

/// Parse an operand (register or immediate)
pub fn parse_operand(s: &str) -> Result<Operand, String> {
    let s = s.trim();

    // Try register first, fall back to immediate
    match parse_register(s) {
        Ok(reg) => Ok(Operand::Register(reg)),
        Err(_) => match parse_immediate(s) {
            Ok(imm) => Ok(Operand::Immediate(imm)),
            Err(_) => Err(format!("invalid operand: {}", s)),
        },
    }
}

/// Parse a binary opcode mnemonic
pub fn parse_binary_op(s: &str) -> Option<BinaryOp> {
    BinaryOp::ALL.into_iter().find(|op| op.mnemonic() == s)
}

/// Strip comments from a line (handles `//`, `;` and `#`)
fn strip_comments(line: &str) -> &str {
    let end = ["//", ";", "#"]
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()
        .unwrap_or(line.len());

    &line[..end]
}

/// Parse a single line of program text
pub fn parse_line(line: &str) -> Result<LineResult, String> {
    let trimmed = strip_comments(line).trim();

    if trimmed.is_empty() {
        return Ok(LineResult::Skip);
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let opcode = parts[0].to_lowercase();
    let operands = &parts[1..];

    let instruction = if opcode == "inp" {
        if operands.len() != 1 {
            return Err(format!("inp requires 1 operand, got {}", operands.len()));
        }
        Instruction::Inp {
            rd: parse_register(operands[0])?,
        }
    } else if let Some(op) = parse_binary_op(&opcode) {
        if operands.len() != 2 {
            return Err(format!(
                "{} requires 2 operands, got {}",
                opcode,
                operands.len()
            ));
        }
        let rd = parse_register(operands[0])?;
        let rm = parse_operand(operands[1])?;
        Instruction::binary(op, rd, rm)
    } else {
        return Err(format!("unknown instruction: {}", opcode));
    };

    Ok(LineResult::Instruction(instruction))
}

/// Parse a program file into a sequence of instructions
pub fn parse_program_file(path: &Path) -> Result<Program, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ParseError::new(
            0,
            format!("failed to read file: {}", e),
            path.display().to_string(),
        )
    })?;

    parse_program_string(&content, path.display().to_string())
}

/// Parse program text into a sequence of instructions
pub fn parse_program_string(content: &str, source_name: String) -> Result<Program, ParseError> {
    let mut instructions = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line_number = line_num + 1; // 1-indexed

        match parse_line(line) {
            Ok(LineResult::Instruction(instr)) => {
                instructions.push(instr);
            }
            Ok(LineResult::Skip) => {}
            Err(msg) => {
                return Err(ParseError::new(line_number, msg, line));
            }
        }
    }

    if instructions.is_empty() {
        return Err(ParseError::new(
            0,
            "no instructions found in file",
            source_name,
        ));
    }

    Ok(Program::new(instructions))
}

impl std::str::FromStr for Program {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_program_string(s, "<string>".to_string())
    }
}
