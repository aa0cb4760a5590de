//! Symbolic compiler and model-number solver for MONAD ALU programs.
//!
//! A program is parsed, executed over symbolic values into a hash-consed
//! expression graph, simplified to a fixpoint with the help of interval
//! analysis, and finally solved for the largest or smallest digit sequence
//! that leaves `z == 0`.
//!
//! ```no_run
//! use monad_solver::{solve, Objective, Program};
//!
//! let program: Program = std::fs::read_to_string("monad.txt")?.parse()?;
//! println!("{}", solve(&program, Objective::Max)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod builder;
pub mod driver;
pub mod error;
pub mod graph;
pub mod ir;
pub mod optimizer;
pub mod parser;
pub mod semantics;
pub mod solver;
pub mod validation;

pub use driver::{compile, solve, solve_compiled, solve_with_config, Compiled, PipelineConfig, Solution};
pub use error::{Error, EvalError, Result, SolveError};
pub use ir::{Instruction, Program, Register};
pub use optimizer::{OptimizeReport, OptimizerConfig};
pub use parser::{parse_program_file, parse_program_string, ParseError};
pub use solver::{Objective, ParallelConfig, SolveStatistics, SolverConfig, Strategy};
pub use validation::{cross_check, CrossCheckReport};
