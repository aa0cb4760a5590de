mod common;

use monad_solver::error::{EvalError, SolveError};
use monad_solver::semantics::accepts;
use monad_solver::solver::SolverConfig;
use monad_solver::{
    compile, solve, solve_with_config, Error, Objective, OptimizerConfig, PipelineConfig, Program,
    Strategy,
};

fn program(text: &str) -> Program {
    text.parse().expect("test program should parse")
}

fn brute_force(program: &Program, objective: Objective) -> Option<String> {
    let n = program.input_count();
    let mut found: Vec<String> = Vec::new();
    for index in 0..9usize.pow(n as u32) {
        let mut rest = index;
        let mut digits = vec![0u8; n];
        for slot in digits.iter_mut().rev() {
            *slot = (rest % 9) as u8 + 1;
            rest /= 9;
        }
        if accepts(program, &digits) {
            found.push(digits.iter().map(|d| d.to_string()).collect());
        }
    }
    match objective {
        Objective::Max => found.into_iter().max(),
        Objective::Min => found.into_iter().min(),
    }
}

const PAIR: &str = "inp w\ninp x\nmul x -1\nadd w x\nadd w -3\neql w 0\neql w 0\nadd z w";

#[test]
fn test_pair_scenario() {
    let program = program(PAIR);
    assert_eq!(solve(&program, Objective::Max).unwrap(), "96");
    assert_eq!(solve(&program, Objective::Min).unwrap(), "41");
}

#[test]
fn test_constant_division_by_zero() {
    let err = solve(&program("inp w\ndiv w 0\nadd z w"), Objective::Max).unwrap_err();
    assert!(matches!(err, Error::Eval(EvalError::DivisionByZero)));
}

#[test]
fn test_discarded_division_still_faults() {
    // x == 9 divides by zero even though the quotient is multiplied away
    let program = program("inp w\ninp x\nadd x -9\ndiv w x\nmul w 0\nadd z w");
    assert!(!accepts(&program, &[9, 9]));
    assert_eq!(solve(&program, Objective::Max).unwrap(), "98");
    assert_eq!(solve(&program, Objective::Min).unwrap(), "11");
}

#[test]
fn test_unsatisfiable() {
    let err = solve(&program("inp w\nadd z 5"), Objective::Min).unwrap_err();
    assert!(matches!(err, Error::Solve(SolveError::NoSolution)));
}

#[test]
fn test_small_programs_match_brute_force() {
    let programs = [
        PAIR,
        "inp w\ninp x\ninp y\nmul w x\nmod w 7\nadd w y\nadd w -8\neql w 0\neql w 0\nadd z w",
        "inp w\ninp x\nadd x -5\ndiv w x\nadd z w",
        "inp w\ninp x\nadd x -9\ndiv w x\nmul w 0\nadd z w",
        "inp w\ninp x\nadd x -1\nmod w x\neql w 20\nadd z w",
        "inp x\ninp y\nmul y 3\nadd x y\nmod x 5\nadd z x",
        "inp w\ninp x\ninp y\neql w x\neql x y\nadd z 1\nmul z w\nadd z x\nadd z -1",
    ];
    for text in programs {
        let program = program(text);
        for objective in [Objective::Max, Objective::Min] {
            let expected = brute_force(&program, objective);
            let actual = solve(&program, objective).ok();
            assert_eq!(actual, expected, "{} on:\n{}", objective, text);
        }
    }
}

#[test]
fn test_synthetic_monad_against_pair_oracle() {
    for seed in 0..4 {
        let monad = common::generate(seed, 7);
        let program = program(&monad.text());
        assert_eq!(program.input_count(), 14);
        for objective in [Objective::Max, Objective::Min] {
            let digits = solve(&program, objective).unwrap();
            assert_eq!(digits, monad.expected(objective), "seed {}", seed);
            let values: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
            assert!(values.iter().all(|d| (1..=9).contains(d)));
            assert!(accepts(&program, &values));
        }
    }
}

#[test]
fn test_sequential_and_parallel_agree() {
    let monad = common::generate(11, 7);
    let program = program(&monad.text());
    for workers in [1, 4] {
        let config = PipelineConfig::default().with_solver(
            SolverConfig::default()
                .with_structural(false)
                .with_workers(workers),
        );
        let solution = solve_with_config(&program, Objective::Max, &config).unwrap();
        assert_eq!(solution.digit_string(), monad.expected(Objective::Max));
        assert_eq!(solution.strategy, Strategy::Search);
        assert_eq!(solution.statistics.workers, workers);
    }
}

#[test]
fn test_optimization_is_idempotent() {
    let monad = common::generate(5, 7);
    let program = program(&monad.text());
    let compiled = compile(&program, &OptimizerConfig::default()).unwrap();
    assert!(compiled.report.reached_fixpoint);

    let mut table = compiled.problem.table.clone();
    let root = compiled.problem.root;
    let before = table.format_listing(&[root]);
    let report =
        monad_solver::optimizer::optimize(&mut table, &[root], &OptimizerConfig::default())
            .unwrap();
    assert_eq!(report.total_rewrites(), 0);
    assert_eq!(report.iterations, 1);
    assert_eq!(table.format_listing(&[table.resolve(root)]), before);
}

#[test]
fn test_node_bound_reports_timeout() {
    let monad = common::generate(3, 7);
    let program = program(&monad.text());
    let config = PipelineConfig::default().with_solver(
        SolverConfig::default()
            .with_structural(false)
            .with_workers(1)
            .with_max_nodes(5),
    );
    let err = solve_with_config(&program, Objective::Max, &config).unwrap_err();
    assert!(matches!(err, Error::Solve(SolveError::Timeout("node"))));
}
