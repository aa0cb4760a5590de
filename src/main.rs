use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use monad_solver::builder::build;
use monad_solver::driver::{compile, solve_compiled, PipelineConfig, Solution};
use monad_solver::error::{Error, SolveError};
use monad_solver::optimizer::{simplify_program, trace_registers, OptimizerConfig};
use monad_solver::parser::parse_program_file;
use monad_solver::solver::{Objective, ParallelConfig, SolverConfig};
use monad_solver::validation::cross_check;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "monad")]
#[command(about = "monad - MONAD ALU symbolic compiler and model-number solver")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// CLI objective selection
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum CliObjective {
    /// Largest accepted model number
    Max,
    /// Smallest accepted model number
    Min,
    /// Both, largest first
    #[default]
    Both,
}

impl CliObjective {
    fn objectives(self) -> Vec<Objective> {
        match self {
            CliObjective::Max => vec![Objective::Max],
            CliObjective::Min => vec![Objective::Min],
            CliObjective::Both => vec![Objective::Max, Objective::Min],
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Find the extremal model number accepted by a program
    Solve {
        /// Path to the ALU program
        file: PathBuf,
        /// Which model number to find
        #[arg(long, value_enum, default_value = "both")]
        objective: CliObjective,
        /// Number of worker threads for the digit search
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
        /// Timeout in seconds for each solve
        #[arg(long)]
        timeout: Option<u64>,
        /// Upper bound on search-tree nodes
        #[arg(long)]
        max_nodes: Option<u64>,
        /// Upper bound on optimizer iterations
        #[arg(long, default_value = "32")]
        max_iterations: usize,
        /// Print the optimized expression graph
        #[arg(long)]
        show_expr: bool,
        /// Enable verbose output
        #[arg(long, short)]
        verbose: bool,
    },
    /// Report instruction-level and graph-level simplification statistics
    Analyze {
        /// Path to the ALU program
        file: PathBuf,
        /// Enable verbose output
        #[arg(long, short)]
        verbose: bool,
    },
    /// Print what is statically known about each register after every instruction
    Registers {
        /// Path to the ALU program
        file: PathBuf,
        /// Enable verbose output
        #[arg(long, short)]
        verbose: bool,
    },
    /// Cross-check the compiled graph against the interpreter on random inputs
    Check {
        /// Path to the ALU program
        file: PathBuf,
        /// Number of random model numbers to try
        #[arg(long, default_value = "1000")]
        samples: usize,
        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
        /// Enable verbose output
        #[arg(long, short)]
        verbose: bool,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Solve { verbose, .. }
            | Commands::Analyze { verbose, .. }
            | Commands::Registers { verbose, .. }
            | Commands::Check { verbose, .. } => *verbose,
        }
    }
}

/// Options for the solve command
struct SolveOptions {
    objective: CliObjective,
    jobs: Option<usize>,
    timeout: Option<Duration>,
    max_nodes: Option<u64>,
    max_iterations: usize,
    show_expr: bool,
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status for a pipeline error
fn exit_code(error: &Error) -> u8 {
    match error {
        Error::Solve(SolveError::NoSolution) => 2,
        Error::Solve(SolveError::Timeout(_)) => 3,
        Error::Parse(_) | Error::Eval(_) | Error::Verification { .. } => 1,
    }
}

// --- Subcommands ---

fn run_solve(path: &Path, options: &SolveOptions) -> Result<(), Error> {
    let program = parse_program_file(path)?;

    let solver = SolverConfig::default()
        .with_timeout_option(options.timeout)
        .with_max_nodes_option(options.max_nodes)
        .with_parallel(ParallelConfig::default().with_workers_option(options.jobs));
    let config = PipelineConfig::default()
        .with_optimizer(OptimizerConfig::default().with_max_iterations(options.max_iterations))
        .with_solver(solver);

    let compiled = compile(&program, &config.optimizer)?;
    if options.verbose {
        println!("Optimizer:");
        print!("{}", compiled.report);
    }
    if options.show_expr {
        let problem = &compiled.problem;
        println!("Expression graph:");
        print!("{}", problem.table.format_listing(&[problem.root]));
        println!("z = {}", problem.root);
    }

    for objective in options.objective.objectives() {
        let solution = solve_compiled(&program, &compiled, objective, &config.solver)?;
        print_solution(&solution, options.verbose);
    }
    Ok(())
}

fn print_solution(solution: &Solution, verbose: bool) {
    if verbose {
        println!("{}: {}", solution.objective, solution.digit_string());
        println!("Solver statistics:");
        print!("{}", solution.statistics);
    } else {
        println!("{}", solution.digit_string());
    }
}

fn run_analyze(path: &Path) -> Result<(), Error> {
    let program = parse_program_file(path)?;
    println!("Program: {}", path.display());
    println!("  Instructions: {}", program.len());
    println!("  Inputs: {}", program.input_count());

    let (_, program_report) = simplify_program(&program);
    println!("\nInstruction-level simplification:");
    print!("{}", program_report);

    let built = build(&program)?;
    println!("\nExpression graph:");
    println!("  Nodes created: {}", built.table.len());

    let compiled = compile(&program, &OptimizerConfig::default())?;
    println!("\nOptimizer:");
    print!("{}", compiled.report);
    Ok(())
}

fn run_registers(path: &Path) -> Result<(), Error> {
    let program = parse_program_file(path)?;
    print!("{}", trace_registers(&program));
    Ok(())
}

fn run_check(path: &Path, samples: usize, seed: Option<u64>) -> Result<bool, Error> {
    let program = parse_program_file(path)?;
    let report = cross_check(&program, samples, seed)?;
    println!("Cross-check of {}:", path.display());
    print!("{}", report);
    Ok(report.is_consistent())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.command.verbose());

    let result = match args.command {
        Commands::Solve {
            file,
            objective,
            jobs,
            timeout,
            max_nodes,
            max_iterations,
            show_expr,
            verbose,
        } => {
            let options = SolveOptions {
                objective,
                jobs,
                timeout: timeout.map(Duration::from_secs),
                max_nodes,
                max_iterations,
                show_expr,
                verbose,
            };
            run_solve(&file, &options).map(|_| true)
        }
        Commands::Analyze { file, .. } => run_analyze(&file).map(|_| true),
        Commands::Registers { file, .. } => run_registers(&file).map(|_| true),
        Commands::Check {
            file, samples, seed, ..
        } => run_check(&file, samples, seed),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("Error: cross-check found disagreements");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
