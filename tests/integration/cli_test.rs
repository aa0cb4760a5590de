mod common;

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_monad"))
}

/// Write `content` to a fresh file in the temp directory
fn program_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("monad_cli_{}_{}.txt", std::process::id(), name));
    fs::write(&path, content).expect("Failed to write test program");
    path
}

fn run(args: &[&str], file: &PathBuf) -> Output {
    Command::new(binary())
        .args(args)
        .arg(file)
        .output()
        .expect("Failed to execute monad")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const PAIR: &str = "# w - x == 3\ninp w\ninp x\nmul x -1\nadd w x\nadd w -3\neql w 0\neql w 0\nadd z w\n";

#[test]
fn test_solve_both_objectives() {
    let file = program_file("pair", PAIR);
    let output = run(&["solve"], &file);
    let _ = fs::remove_file(&file);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "96\n41\n");
}

#[test]
fn test_solve_single_objective_verbose() {
    let file = program_file("pair_verbose", PAIR);
    let output = run(&["solve", "--objective", "min", "--verbose", "--show-expr"], &file);
    let _ = fs::remove_file(&file);

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("min: 41"), "stdout: {}", stdout);
    assert!(stdout.contains("Expression graph:"));
    assert!(stdout.contains("Solver statistics:"));
}

#[test]
fn test_synthetic_monad() {
    let monad = common::generate(21, 7);
    let file = program_file("synthetic", &monad.text());
    let output = run(&["solve", "--objective", "max", "-j", "2"], &file);
    let _ = fs::remove_file(&file);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        monad.expected(monad_solver::Objective::Max)
    );
}

#[test]
fn test_exit_codes() {
    let cases = [
        ("parse", "inp w\nsub w 1\n", vec!["solve"], 1),
        ("divzero", "inp w\ndiv w 0\n", vec!["solve"], 1),
        ("unsat", "inp w\nadd z 5\n", vec!["solve"], 2),
        (
            "bound",
            "inp w\ninp x\ninp y\nmul w x\nmod w 7\nadd w y\nadd w -8\nadd z w\n",
            vec!["solve", "--max-nodes", "1", "-j", "1"],
            3,
        ),
    ];
    for (name, text, args, code) in cases {
        let file = program_file(name, text);
        let output = run(&args, &file);
        let _ = fs::remove_file(&file);
        assert_eq!(output.status.code(), Some(code), "case {}", name);
        assert!(!output.stderr.is_empty(), "case {} should report an error", name);
    }
}

#[test]
fn test_parse_error_reports_line() {
    let file = program_file("bad_line", "inp w\n\nadd q 1\n");
    let output = run(&["solve"], &file);
    let _ = fs::remove_file(&file);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 3"), "stderr: {}", stderr);
}

#[test]
fn test_analyze() {
    let file = program_file("analyze", "inp w\nadd w 0\nmul y 3\nadd z w\n");
    let output = run(&["analyze"], &file);
    let _ = fs::remove_file(&file);

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("No-ops removed: 2"), "stdout: {}", stdout);
    assert!(stdout.contains("Live nodes:"));
}

#[test]
fn test_registers() {
    let file = program_file("registers", "inp w\nadd w 0\nmul x w\nadd z w\n");
    let output = run(&["registers"], &file);
    let _ = fs::remove_file(&file);

    assert!(output.status.success());
    let stdout = stdout(&output);
    let no_ops: Vec<&str> = stdout.lines().filter(|l| l.ends_with("*NoOp")).collect();
    assert_eq!(no_ops.len(), 2, "stdout: {}", stdout);
    assert!(no_ops[0].starts_with("add w 0"));
    assert!(no_ops[1].starts_with("mul x w"));
    assert!(stdout.contains("Input(0)"));
    assert!(stdout.contains("Non-input instructions: 3"));
    assert!(stdout.contains("On unknown registers: 3"));
}

#[test]
fn test_check() {
    let monad = common::generate(2, 7);
    let file = program_file("check", &monad.text());
    let output = run(&["check", "--samples", "200", "--seed", "7"], &file);
    let _ = fs::remove_file(&file);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Disagreements: 0"));
}
